//! sharedrop - share files by link
//!
//! Registered users upload files and receive short capability share ids;
//! anyone holding a share id can fetch the file. Uploads are capped by the
//! uploader's tier.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod quota;
pub mod web;

pub use auth::{
    hash_password, verify_password, Identity, IdentityService, PasswordError, TokenService,
    ValidationError,
};
pub use config::Config;
pub use db::{Database, NewUser, Tier, User, UserRepository};
pub use error::{Result, SharedropError};
pub use file::{
    BlobStore, DownloadResolver, FileRecord, LocalBlobStore, OrphanSweeper, ShareIdGenerator,
    UploadCoordinator,
};
pub use quota::{QuotaPolicy, QuotaStatus};
pub use web::WebServer;
