//! Blob storage for sharedrop.
//!
//! This module provides physical blob storage:
//! - UUID-based keys chosen by the server, never by the client
//! - Directory sharding by the first 2 characters of the key
//! - Streaming writes measured as they happen, published by rename

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::{Instant, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::SharedropError;

/// Suffix of blobs that are still being written.
pub const PARTIAL_SUFFIX: &str = ".part";

/// A boxed stream of byte chunks.
pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'a>>;

/// Blob storage errors.
#[derive(Error, Debug)]
pub enum BlobError {
    /// The stream produced more bytes than allowed.
    #[error("blob exceeds limit of {limit} bytes")]
    TooLarge {
        /// The limit that was exceeded.
        limit: u64,
    },

    /// No blob is stored under this key.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The key is not a server-generated key.
    #[error("invalid blob key: {0}")]
    InvalidKey(String),

    /// The incoming stream failed before it ended.
    #[error("upload stream failed: {0}")]
    Source(std::io::Error),

    /// Filesystem failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BlobError> for SharedropError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::NotFound(_) => SharedropError::NotFound("file".to_string()),
            BlobError::TooLarge { limit } => {
                SharedropError::Storage(format!("blob exceeds limit of {limit} bytes"))
            }
            BlobError::Source(e) => {
                SharedropError::InvalidInput(format!("upload stream failed: {e}"))
            }
            BlobError::InvalidKey(key) => SharedropError::Storage(format!("invalid blob key {key}")),
            BlobError::Io(e) => SharedropError::Storage(e.to_string()),
        }
    }
}

/// Result type for blob operations.
pub type BlobResult<T> = std::result::Result<T, BlobError>;

/// A blob that was written and published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenBlob {
    /// Server-generated key.
    pub key: String,
    /// Number of bytes actually written.
    pub size: u64,
}

/// An open blob ready to be streamed.
pub struct BlobReader {
    /// Size of the blob in bytes.
    pub size: u64,
    /// Blob content.
    pub stream: ByteStream<'static>,
}

impl std::fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobReader").field("size", &self.size).finish()
    }
}

/// One entry found while listing the store.
#[derive(Debug, Clone)]
pub struct BlobEntry {
    /// Blob key (without the partial suffix).
    pub key: String,
    /// Size on disk in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
    /// Whether this is an unfinished `.part` file.
    pub partial: bool,
}

/// Durable blob storage keyed by server-chosen names.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a stream to a new blob, failing if it grows beyond `limit` bytes.
    ///
    /// Nothing is left under the final key unless the whole stream was written.
    async fn write_blob(&self, stream: ByteStream<'_>, limit: u64) -> BlobResult<WrittenBlob>;

    /// Open a blob for reading.
    async fn open_for_read(&self, key: &str) -> BlobResult<BlobReader>;

    /// Delete a blob. Returns `false` if it did not exist.
    async fn delete(&self, key: &str) -> BlobResult<bool>;

    /// Delete an unfinished write. Returns `false` if it did not exist.
    async fn delete_partial(&self, key: &str) -> BlobResult<bool>;

    /// List every blob and partial write in the store.
    async fn list_blobs(&self) -> BlobResult<Vec<BlobEntry>>;
}

/// Blob store on the local filesystem.
///
/// Blobs are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   ├── ab12cd34-5678-40ab-8def-123456789012
/// │   └── ab98fe76-5432-4def-8abc-ba9876543210.part
/// ├── cd/
/// │   └── cd90ab12-3456-4890-abcd-ef1234567890
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Base directory for blob storage.
    base_path: PathBuf,
}

impl LocalBlobStore {
    /// Create a new LocalBlobStore with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub async fn new(base_path: impl Into<PathBuf>) -> BlobResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Check that a key looks like one this store generated.
    ///
    /// Keys are lowercase hex and dashes only, so they can never contain
    /// separators or `..`.
    pub fn validate_key(key: &str) -> BlobResult<()> {
        let valid = key.len() >= 2
            && key.len() <= 64
            && key
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b) || b == b'-');
        if valid {
            Ok(())
        } else {
            Err(BlobError::InvalidKey(key.to_string()))
        }
    }

    /// Get the full path for a key.
    ///
    /// The path is constructed as: {base_path}/{shard}/{key}
    /// where shard is the first 2 characters of the key.
    fn key_to_path(&self, key: &str) -> BlobResult<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.base_path.join(&key[..2]).join(key))
    }

    fn partial_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(PARTIAL_SUFFIX);
        PathBuf::from(name)
    }

    async fn remove_if_exists(path: &Path) -> BlobResult<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn copy_to_partial(
        file: &mut fs::File,
        mut stream: ByteStream<'_>,
        limit: u64,
    ) -> BlobResult<u64> {
        let mut size: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(BlobError::Source)?;
            size += chunk.len() as u64;
            if size > limit {
                return Err(BlobError::TooLarge { limit });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(size)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn write_blob(&self, stream: ByteStream<'_>, limit: u64) -> BlobResult<WrittenBlob> {
        let key = Uuid::new_v4().to_string();
        let path = self.key_to_path(&key)?;
        let part = Self::partial_path(&path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let start = Instant::now();
        let mut file = fs::File::create(&part).await?;

        let size = match Self::copy_to_partial(&mut file, stream, limit).await {
            Ok(size) => size,
            Err(e) => {
                drop(file);
                if let Err(remove_err) = fs::remove_file(&part).await {
                    tracing::warn!(key = %key, "Failed to remove partial blob: {}", remove_err);
                }
                return Err(e);
            }
        };
        drop(file);

        fs::rename(&part, &path).await?;

        tracing::debug!(
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Blob written"
        );

        Ok(WrittenBlob { key, size })
    }

    async fn open_for_read(&self, key: &str) -> BlobResult<BlobReader> {
        let path = self.key_to_path(key)?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let size = file.metadata().await?.len();

        Ok(BlobReader {
            size,
            stream: Box::pin(ReaderStream::new(file)),
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<bool> {
        let path = self.key_to_path(key)?;
        Self::remove_if_exists(&path).await
    }

    async fn delete_partial(&self, key: &str) -> BlobResult<bool> {
        let path = self.key_to_path(key)?;
        Self::remove_if_exists(&Self::partial_path(&path)).await
    }

    async fn list_blobs(&self) -> BlobResult<Vec<BlobEntry>> {
        let mut blobs = Vec::new();
        let mut shards = fs::read_dir(&self.base_path).await?;

        while let Some(shard) = shards.next_entry().await? {
            if !shard.file_type().await?.is_dir() {
                continue;
            }

            let mut entries = fs::read_dir(shard.path()).await?;
            while let Some(entry) = entries.next_entry().await? {
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                let (key, partial) = match name.strip_suffix(PARTIAL_SUFFIX) {
                    Some(key) => (key.to_string(), true),
                    None => (name, false),
                };
                if Self::validate_key(&key).is_err() {
                    continue;
                }

                let metadata = match entry.metadata().await {
                    Ok(m) if m.is_file() => m,
                    _ => continue,
                };

                blobs.push(BlobEntry {
                    key,
                    size: metadata.len(),
                    modified: metadata.modified()?,
                    partial,
                });
            }
        }

        Ok(blobs)
    }
}

/// Wrap an in-memory buffer as a [`ByteStream`].
pub fn stream_from_bytes(data: impl Into<Bytes>) -> ByteStream<'static> {
    let data = data.into();
    Box::pin(futures::stream::once(async move { Ok(data) }))
}

/// Collect a [`ByteStream`] into memory.
pub async fn collect_stream(mut stream: ByteStream<'_>) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}
