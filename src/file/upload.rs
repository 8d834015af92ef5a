//! Upload coordination.
//!
//! An upload moves through
//! `Received -> Authorized -> QuotaChecked -> BlobWritten -> MetadataCommitted`.
//! Any gate can end it in `Rejected`; a commit failure after the blob is
//! written ends it in `Orphaned`, leaving the blob for the sweeper.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn, Instrument};

use super::metadata::NewFileRecord;
use super::sanitize_filename;
use super::share_id::ShareIdGenerator;
use super::storage::{BlobError, BlobStore, ByteStream};
use crate::auth::Identity;
use crate::db::Database;
use crate::quota::QuotaPolicy;
use crate::{Result, SharedropError};

/// States of a single upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// Request accepted for processing.
    Received,
    /// Uploader identity established.
    Authorized,
    /// Size known to be within the tier ceiling so far.
    QuotaChecked,
    /// Blob durably stored under its final key.
    BlobWritten,
    /// Record committed; the share id resolves.
    MetadataCommitted,
    /// Upload refused; nothing committed.
    Rejected,
    /// Blob written but no record committed.
    Orphaned,
}

impl UploadState {
    /// Whether no further transition can follow.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadState::MetadataCommitted | UploadState::Rejected | UploadState::Orphaned
        )
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadState::Received => "received",
            UploadState::Authorized => "authorized",
            UploadState::QuotaChecked => "quota_checked",
            UploadState::BlobWritten => "blob_written",
            UploadState::MetadataCommitted => "metadata_committed",
            UploadState::Rejected => "rejected",
            UploadState::Orphaned => "orphaned",
        };
        f.write_str(name)
    }
}

/// An upload handed to the coordinator.
pub struct UploadRequest<'a> {
    /// Verified uploader.
    pub identity: Identity,
    /// Filename as sent by the client.
    pub filename: String,
    /// Lower bound on the payload size, if the transport knows one.
    pub size_hint: Option<u64>,
    /// File content.
    pub stream: ByteStream<'a>,
}

impl fmt::Debug for UploadRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("identity", &self.identity)
            .field("filename", &self.filename)
            .field("size_hint", &self.size_hint)
            .finish()
    }
}

/// Result of a committed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    /// File record ID.
    pub record_id: i64,
    /// Public share id.
    pub share_id: String,
    /// Sanitized original filename.
    pub original_filename: String,
    /// Measured size in bytes.
    pub size: u64,
}

/// Runs uploads from authorization through metadata commit.
#[derive(Clone)]
pub struct UploadCoordinator {
    db: Database,
    store: Arc<dyn BlobStore>,
    quota: QuotaPolicy,
    share_ids: ShareIdGenerator,
}

impl UploadCoordinator {
    /// Create a new upload coordinator.
    pub fn new(
        db: Database,
        store: Arc<dyn BlobStore>,
        quota: QuotaPolicy,
        share_ids: ShareIdGenerator,
    ) -> Self {
        Self {
            db,
            store,
            quota,
            share_ids,
        }
    }

    /// Store an upload and commit its record.
    ///
    /// Errors: `InvalidInput` for a missing filename, an empty payload or a
    /// broken stream; `Forbidden` if the uploader's account is gone;
    /// `TooLarge` above the tier ceiling; `Storage` for write or commit
    /// failures.
    pub async fn upload(&self, request: UploadRequest<'_>) -> Result<UploadReceipt> {
        let span = tracing::info_span!(
            "upload",
            user_id = request.identity.user_id,
            filename = %request.filename
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: UploadRequest<'_>) -> Result<UploadReceipt> {
        let mut state = UploadState::Received;
        let UploadRequest {
            identity,
            filename,
            size_hint,
            stream,
        } = request;

        let Some(filename) = sanitize_filename(&filename) else {
            return Err(reject(
                &mut state,
                SharedropError::InvalidInput("filename is required".to_string()),
            ));
        };
        if size_hint == Some(0) {
            return Err(reject(
                &mut state,
                SharedropError::InvalidInput("file is empty".to_string()),
            ));
        }

        let quota = match self.quota.status(identity.user_id).await {
            Ok(status) => status,
            Err(SharedropError::NotFound(_)) => {
                return Err(reject(
                    &mut state,
                    SharedropError::Forbidden("account no longer exists".to_string()),
                ))
            }
            Err(e) => return Err(reject(&mut state, e)),
        };
        transition(&mut state, UploadState::Authorized);

        if let Some(hint) = size_hint {
            if hint > quota.ceiling {
                return Err(reject(
                    &mut state,
                    SharedropError::TooLarge {
                        ceiling: quota.ceiling,
                        tier: quota.tier,
                    },
                ));
            }
        }
        transition(&mut state, UploadState::QuotaChecked);

        let written = match self.store.write_blob(stream, quota.ceiling).await {
            Ok(written) => written,
            Err(BlobError::TooLarge { .. }) => {
                return Err(reject(
                    &mut state,
                    SharedropError::TooLarge {
                        ceiling: quota.ceiling,
                        tier: quota.tier,
                    },
                ))
            }
            Err(e @ BlobError::Source(_)) => return Err(reject(&mut state, e.into())),
            Err(e) => {
                tracing::error!("Blob write failed: {}", e);
                return Err(reject(
                    &mut state,
                    SharedropError::Storage("could not store file".to_string()),
                ));
            }
        };

        if written.size == 0 {
            if let Err(e) = self.store.delete(&written.key).await {
                warn!(stored_name = %written.key, "Failed to remove empty blob: {}", e);
            }
            return Err(reject(
                &mut state,
                SharedropError::InvalidInput("file is empty".to_string()),
            ));
        }
        transition(&mut state, UploadState::BlobWritten);

        let new_record = NewFileRecord::new(
            written.key.as_str(),
            filename,
            written.size as i64,
            identity.user_id,
        );

        let record = match self.share_ids.claim(&self.db, &new_record).await {
            Ok(record) => record,
            Err(e) => {
                transition(&mut state, UploadState::Orphaned);
                warn!(
                    stored_name = %written.key,
                    size = written.size,
                    "Metadata commit failed, blob orphaned: {}",
                    e
                );
                return Err(SharedropError::Storage(
                    "could not save file metadata".to_string(),
                ));
            }
        };
        transition(&mut state, UploadState::MetadataCommitted);

        info!(
            share_id = %record.share_id,
            stored_name = %record.stored_name,
            size = record.size,
            "Upload committed"
        );

        Ok(UploadReceipt {
            record_id: record.id,
            share_id: record.share_id,
            original_filename: record.original_name,
            size: written.size,
        })
    }
}

fn transition(state: &mut UploadState, next: UploadState) {
    debug!(from = %state, to = %next, "Upload state");
    *state = next;
}

fn reject(state: &mut UploadState, error: SharedropError) -> SharedropError {
    transition(state, UploadState::Rejected);
    debug!("Upload rejected: {}", error);
    error
}
