//! Orphan reclamation.
//!
//! Blobs whose metadata commit failed, and partial writes from abandoned
//! uploads, are removed here once they are older than a grace period.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use super::metadata::{FileRecord, FileRepository};
use super::storage::BlobStore;
use crate::db::Database;
use crate::Result;

/// Summary of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Blobs and partial files examined.
    pub scanned: usize,
    /// Entries deleted.
    pub removed: usize,
    /// Bytes freed by the deletions.
    pub bytes_reclaimed: u64,
}

/// Removes stored blobs that no record references.
#[derive(Clone)]
pub struct OrphanSweeper {
    db: Database,
    store: Arc<dyn BlobStore>,
    grace: Duration,
}

impl OrphanSweeper {
    /// Create a sweeper that spares entries younger than `grace`.
    pub fn new(db: Database, store: Arc<dyn BlobStore>, grace: Duration) -> Self {
        Self { db, store, grace }
    }

    /// Delete unreferenced blobs and stale partial writes.
    ///
    /// The stored-name set is read after the listing, so a blob committed
    /// between the two is seen as referenced.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let blobs = self.store.list_blobs().await?;
        let referenced = FileRepository::new(self.db.pool()).stored_names().await?;
        let now = SystemTime::now();

        let mut report = SweepReport {
            scanned: blobs.len(),
            ..Default::default()
        };

        for blob in blobs {
            if !blob.partial && referenced.contains(&blob.key) {
                continue;
            }
            // Clock skew reads as age zero.
            let age = now.duration_since(blob.modified).unwrap_or_default();
            if age < self.grace {
                continue;
            }

            let deleted = if blob.partial {
                self.store.delete_partial(&blob.key).await
            } else {
                self.store.delete(&blob.key).await
            };

            match deleted {
                Ok(true) => {
                    report.removed += 1;
                    report.bytes_reclaimed += blob.size;
                }
                Ok(false) => {}
                Err(e) => warn!(stored_name = %blob.key, "Failed to remove orphan: {}", e),
            }
        }

        if report.removed > 0 {
            info!(
                scanned = report.scanned,
                removed = report.removed,
                bytes_reclaimed = report.bytes_reclaimed,
                "Orphan sweep reclaimed storage"
            );
        }

        Ok(report)
    }

    /// Records whose blob is missing from the store.
    ///
    /// Read-only; such records already answer downloads with not-found.
    pub async fn reverse_orphans(&self) -> Result<Vec<FileRecord>> {
        let present: std::collections::HashSet<String> = self
            .store
            .list_blobs()
            .await?
            .into_iter()
            .filter(|b| !b.partial)
            .map(|b| b.key)
            .collect();

        let records = FileRepository::new(self.db.pool()).list_all().await?;
        Ok(records
            .into_iter()
            .filter(|r| !present.contains(&r.stored_name))
            .collect())
    }
}
