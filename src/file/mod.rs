//! File management module for sharedrop.
//!
//! This module provides the upload and share path:
//! - Blob storage with server-generated UUID keys
//! - File records and share id issuance
//! - Upload coordination, download resolution and orphan sweeping

mod download;
mod metadata;
mod share_id;
mod storage;
mod sweep;
mod upload;

pub use download::{DownloadResolver, OpenedFile};
pub use metadata::{FileRecord, FileRepository, InsertOutcome, NewFileRecord};
pub use share_id::{ShareIdGenerator, MAX_SHARE_ID_LENGTH};
pub use storage::{
    collect_stream, stream_from_bytes, BlobEntry, BlobError, BlobReader, BlobResult, BlobStore,
    ByteStream, LocalBlobStore, WrittenBlob, PARTIAL_SUFFIX,
};
pub use sweep::{OrphanSweeper, SweepReport};
pub use upload::{UploadCoordinator, UploadReceipt, UploadRequest, UploadState};

/// Minimum random bytes in a share id (8 hex characters).
pub const MIN_SHARE_ID_BYTES: usize = 4;

/// Maximum length for a displayed filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Reduce an untrusted client filename to something safe to display.
///
/// Directory components (either separator) and control characters are
/// dropped, surrounding whitespace trimmed and the result truncated to
/// [`MAX_FILENAME_LENGTH`] characters. Returns `None` if nothing is left.
///
/// # Examples
///
/// ```
/// use sharedrop::file::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
/// assert_eq!(sanitize_filename("C:\\Users\\me\\cv.pdf").as_deref(), Some("cv.pdf"));
/// assert_eq!(sanitize_filename("  "), None);
/// ```
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => None,
        _ => Some(cleaned),
    }
}
