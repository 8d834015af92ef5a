//! API handlers for the sharedrop HTTP interface.

pub mod auth;
pub mod file;
pub mod user;

pub use auth::*;
pub use file::*;
pub use user::*;

use std::sync::Arc;

use crate::auth::{IdentityService, TokenService};
use crate::db::Database;
use crate::file::{BlobStore, DownloadResolver, ShareIdGenerator, UploadCoordinator};
use crate::quota::QuotaPolicy;

/// Services shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database pool.
    pub db: Database,
    /// Registration, login and token verification.
    pub identity: IdentityService,
    /// Tier ceilings and upgrades.
    pub quota: QuotaPolicy,
    /// Upload pipeline.
    pub uploads: UploadCoordinator,
    /// Share id resolution and content access.
    pub downloads: DownloadResolver,
}

impl AppState {
    /// Wire the services together over one database and blob store.
    pub fn new(
        db: Database,
        store: Arc<dyn BlobStore>,
        tokens: Arc<TokenService>,
        quota: QuotaPolicy,
        share_ids: ShareIdGenerator,
    ) -> Self {
        Self {
            identity: IdentityService::new(db.clone(), tokens),
            uploads: UploadCoordinator::new(db.clone(), store.clone(), quota.clone(), share_ids),
            downloads: DownloadResolver::new(db.clone(), store),
            quota,
            db,
        }
    }

    /// The token service.
    pub fn tokens(&self) -> &Arc<TokenService> {
        self.identity.tokens()
    }
}
