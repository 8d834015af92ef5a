//! Web API module for sharedrop.
//!
//! REST endpoints under `/api` for accounts, uploads, share id lookups and
//! downloads.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
