//! File record types and repository for sharedrop.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::Result;

const RECORD_COLUMNS: &str = "id, stored_name, original_name, size, share_id, owner_id, created_at";

/// Metadata for a committed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Unique record ID.
    pub id: i64,
    /// Blob key in the store.
    #[serde(skip)]
    pub stored_name: String,
    /// Original filename (display only).
    pub original_name: String,
    /// Size in bytes as measured while writing.
    pub size: i64,
    /// Public share id.
    pub share_id: String,
    /// Uploading user.
    #[serde(skip)]
    pub owner_id: i64,
    /// Commit timestamp (UTC, millisecond precision).
    pub created_at: String,
}

/// Data for a record about to be committed.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Blob key in the store.
    pub stored_name: String,
    /// Original filename (display only).
    pub original_name: String,
    /// Measured size in bytes.
    pub size: i64,
    /// Uploading user.
    pub owner_id: i64,
}

impl NewFileRecord {
    /// Create a new NewFileRecord.
    pub fn new(
        stored_name: impl Into<String>,
        original_name: impl Into<String>,
        size: i64,
        owner_id: i64,
    ) -> Self {
        Self {
            stored_name: stored_name.into(),
            original_name: original_name.into(),
            size,
            owner_id,
        }
    }
}

/// Outcome of a conditional insert.
#[derive(Debug)]
pub enum InsertOutcome {
    /// The record was inserted.
    Inserted(FileRecord),
    /// Another record already holds the share id.
    ShareIdTaken,
    /// The owner does not exist.
    OwnerMissing,
}

/// Repository for file records.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a record unless the share id is taken or the owner is gone.
    ///
    /// The existence checks and the insert are one statement, so inside a
    /// transaction no other commit can slip between them.
    pub async fn insert_if_share_id_free(
        conn: &mut SqliteConnection,
        new_record: &NewFileRecord,
        share_id: &str,
    ) -> Result<InsertOutcome> {
        let inserted = sqlx::query_as::<_, FileRecord>(&format!(
            "INSERT INTO files (stored_name, original_name, size, share_id, owner_id)
             SELECT ?, ?, ?, ?, ?
             WHERE NOT EXISTS (SELECT 1 FROM files WHERE share_id = ?)
               AND EXISTS (SELECT 1 FROM users WHERE id = ?)
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(&new_record.stored_name)
        .bind(&new_record.original_name)
        .bind(new_record.size)
        .bind(share_id)
        .bind(new_record.owner_id)
        .bind(share_id)
        .bind(new_record.owner_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(record) = inserted {
            return Ok(InsertOutcome::Inserted(record));
        }

        let owner_exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
                .bind(new_record.owner_id)
                .fetch_one(&mut *conn)
                .await?;

        if owner_exists.0 {
            Ok(InsertOutcome::ShareIdTaken)
        } else {
            Ok(InsertOutcome::OwnerMissing)
        }
    }

    /// Get a record by share id.
    pub async fn get_by_share_id(&self, share_id: &str) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM files WHERE share_id = ?"
        ))
        .bind(share_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// List a user's records, newest first.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM files WHERE owner_id = ?
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// List every record.
    pub async fn list_all(&self) -> Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM files ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// All blob keys referenced by a record.
    pub async fn stored_names(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT stored_name FROM files")
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Count a user's records.
    pub async fn count_by_owner(&self, owner_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count.0)
    }
}
