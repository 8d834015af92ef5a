//! Share id resolution and download.

use std::sync::Arc;

use tracing::{debug, warn};

use super::metadata::{FileRecord, FileRepository};
use super::share_id::ShareIdGenerator;
use super::storage::{BlobError, BlobStore, ByteStream};
use crate::db::Database;
use crate::{Result, SharedropError};

/// A file ready to be streamed to a client.
pub struct OpenedFile {
    /// Record the content belongs to.
    pub record: FileRecord,
    /// Filename to suggest to the client.
    pub filename: String,
    /// Content length in bytes.
    pub size: u64,
    /// File content.
    pub stream: ByteStream<'static>,
}

impl std::fmt::Debug for OpenedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedFile")
            .field("record", &self.record)
            .field("filename", &self.filename)
            .field("size", &self.size)
            .finish()
    }
}

/// Maps share ids to records and their content.
///
/// No authentication is involved: holding the share id is the permission.
#[derive(Clone)]
pub struct DownloadResolver {
    db: Database,
    store: Arc<dyn BlobStore>,
}

impl DownloadResolver {
    /// Create a new download resolver.
    pub fn new(db: Database, store: Arc<dyn BlobStore>) -> Self {
        Self { db, store }
    }

    /// Look up the record for a share id.
    pub async fn resolve_by_share_id(&self, share_id: &str) -> Result<FileRecord> {
        if !ShareIdGenerator::is_well_formed(share_id) {
            debug!(share_id = %share_id, "Malformed share id");
            return Err(SharedropError::NotFound("file".to_string()));
        }

        FileRepository::new(self.db.pool())
            .get_by_share_id(share_id)
            .await?
            .ok_or_else(|| SharedropError::NotFound("file".to_string()))
    }

    /// Open the content of a record.
    ///
    /// A record whose blob has disappeared is reported as `NotFound`.
    pub async fn open(&self, record: FileRecord) -> Result<OpenedFile> {
        match self.store.open_for_read(&record.stored_name).await {
            Ok(reader) => Ok(OpenedFile {
                filename: record.original_name.clone(),
                size: reader.size,
                stream: reader.stream,
                record,
            }),
            Err(BlobError::NotFound(_)) => {
                warn!(
                    share_id = %record.share_id,
                    stored_name = %record.stored_name,
                    "Blob missing for committed record"
                );
                Err(SharedropError::NotFound("file".to_string()))
            }
            Err(e) => {
                tracing::error!(stored_name = %record.stored_name, "Blob open failed: {}", e);
                Err(SharedropError::Storage("could not read file".to_string()))
            }
        }
    }

    /// Resolve a share id and open its content.
    pub async fn download(&self, share_id: &str) -> Result<OpenedFile> {
        let record = self.resolve_by_share_id(share_id).await?;
        self.open(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::file::metadata::NewFileRecord;
    use crate::file::storage::{collect_stream, stream_from_bytes, LocalBlobStore};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database, Arc<LocalBlobStore>, DownloadResolver, i64) {
        let temp = TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("owner", "hash"))
            .await
            .unwrap();
        let store = Arc::new(LocalBlobStore::new(temp.path()).await.unwrap());
        let resolver = DownloadResolver::new(db.clone(), store.clone());
        (temp, db, store, resolver, user.id)
    }

    async fn commit(
        db: &Database,
        store: &LocalBlobStore,
        owner: i64,
        name: &str,
        data: &'static [u8],
    ) -> FileRecord {
        let written = store
            .write_blob(stream_from_bytes(data), 1024)
            .await
            .unwrap();
        ShareIdGenerator::default()
            .claim(
                db,
                &NewFileRecord::new(written.key, name, written.size as i64, owner),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_download_round_trip() {
        let (_temp, db, store, resolver, owner) = setup().await;
        let record = commit(&db, &store, owner, "notes.md", b"# notes").await;

        let opened = resolver.download(&record.share_id).await.unwrap();
        assert_eq!(opened.filename, "notes.md");
        assert_eq!(opened.size, 7);
        assert_eq!(opened.record, record);
        assert_eq!(collect_stream(opened.stream).await.unwrap(), b"# notes");
    }

    #[tokio::test]
    async fn test_unknown_share_id() {
        let (_temp, _db, _store, resolver, _) = setup().await;

        assert!(matches!(
            resolver.resolve_by_share_id("deadbeef").await,
            Err(SharedropError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_share_id() {
        let (_temp, _db, _store, resolver, _) = setup().await;

        for id in ["", "../../x", "DEADBEEF", "' OR 1=1 --"] {
            assert!(matches!(
                resolver.resolve_by_share_id(id).await,
                Err(SharedropError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let (_temp, db, store, resolver, owner) = setup().await;
        let record = commit(&db, &store, owner, "gone.txt", b"bye").await;
        store.delete(&record.stored_name).await.unwrap();

        let metadata = resolver.resolve_by_share_id(&record.share_id).await;
        assert!(metadata.is_ok());

        assert!(matches!(
            resolver.download(&record.share_id).await,
            Err(SharedropError::NotFound(_))
        ));
    }
}
