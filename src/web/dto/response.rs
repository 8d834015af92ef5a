//! Response DTOs for Web API.

use serde::Serialize;

use crate::db::Tier;
use crate::file::{FileRecord, UploadReceipt};
use crate::quota::QuotaStatus;

/// Token issued by register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Bearer token (JWT).
    pub token: String,
    /// Token type (always "Bearer").
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

impl TokenResponse {
    /// Create a bearer token response.
    pub fn bearer(token: String, expires_in: u64) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// Result of a committed upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// File record ID.
    pub id: i64,
    /// Share id.
    pub share_id: String,
    /// Original filename.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
}

impl From<UploadReceipt> for UploadResponse {
    fn from(receipt: UploadReceipt) -> Self {
        Self {
            id: receipt.record_id,
            share_id: receipt.share_id,
            filename: receipt.original_filename,
            size: receipt.size,
        }
    }
}

/// Public file metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfoResponse {
    /// File record ID.
    pub id: i64,
    /// Share id.
    pub share_id: String,
    /// Original filename.
    pub filename: String,
    /// Size in bytes.
    pub size: i64,
    /// Upload time (UTC).
    pub created_at: String,
}

impl From<FileRecord> for FileInfoResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            share_id: record.share_id,
            filename: record.original_name,
            size: record.size,
            created_at: record.created_at,
        }
    }
}

/// Account tier and upload ceiling.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusResponse {
    /// Whether the account is on the pro tier.
    pub is_pro: bool,
    /// Current tier.
    pub tier: Tier,
    /// Maximum upload size in bytes.
    pub ceiling: u64,
}

impl From<QuotaStatus> for UserStatusResponse {
    fn from(status: QuotaStatus) -> Self {
        Self {
            is_pro: status.is_pro(),
            tier: status.tier,
            ceiling: status.ceiling,
        }
    }
}
