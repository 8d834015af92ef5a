//! Share id generation and collision-checked commit.
//!
//! A share id is the only capability needed to read a file, so it is drawn
//! from the OS RNG and checked for uniqueness inside the commit transaction.

use rand_core::{OsRng, RngCore};
use tracing::debug;

use super::metadata::{FileRecord, FileRepository, InsertOutcome, NewFileRecord};
use super::MIN_SHARE_ID_BYTES;
use crate::config::FilesConfig;
use crate::db::Database;
use crate::{Result, SharedropError};

/// Upper bound on share id length in characters.
pub const MAX_SHARE_ID_LENGTH: usize = 64;

/// Generates share ids and commits file records under a fresh one.
#[derive(Debug, Clone)]
pub struct ShareIdGenerator {
    bytes: usize,
    attempts: u32,
}

impl Default for ShareIdGenerator {
    fn default() -> Self {
        Self::new(MIN_SHARE_ID_BYTES, 8)
    }
}

impl ShareIdGenerator {
    /// Create a generator drawing `bytes` random bytes per id.
    ///
    /// `bytes` is raised to the minimum if lower, `attempts` to 1.
    pub fn new(bytes: usize, attempts: u32) -> Self {
        Self {
            bytes: bytes.clamp(MIN_SHARE_ID_BYTES, MAX_SHARE_ID_LENGTH / 2),
            attempts: attempts.max(1),
        }
    }

    /// Create a generator from configuration.
    pub fn from_config(config: &FilesConfig) -> Self {
        Self::new(config.share_id_bytes, config.share_id_attempts)
    }

    /// Length in characters of the ids this generator produces.
    pub fn id_length(&self) -> usize {
        self.bytes * 2
    }

    /// Draw a new lowercase hex id.
    pub fn generate(&self) -> String {
        let mut buf = vec![0u8; self.bytes];
        OsRng.fill_bytes(&mut buf);
        buf.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Whether a string could be a share id.
    ///
    /// Anything else can be answered with not-found without a lookup.
    pub fn is_well_formed(candidate: &str) -> bool {
        candidate.len() >= MIN_SHARE_ID_BYTES * 2
            && candidate.len() <= MAX_SHARE_ID_LENGTH
            && candidate.len() % 2 == 0
            && candidate
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// Commit a record under a freshly generated, unused share id.
    pub async fn claim(&self, db: &Database, new_record: &NewFileRecord) -> Result<FileRecord> {
        self.claim_with(db, new_record, || self.generate()).await
    }

    /// Commit a record, drawing candidate ids from `next_id`.
    ///
    /// All attempts run in one transaction; it is committed only after an
    /// insert succeeds and rolled back otherwise. Running out of attempts is
    /// a `Conflict`.
    pub async fn claim_with<F>(
        &self,
        db: &Database,
        new_record: &NewFileRecord,
        mut next_id: F,
    ) -> Result<FileRecord>
    where
        F: FnMut() -> String + Send,
    {
        let mut tx = db.begin().await?;

        for attempt in 1..=self.attempts {
            let share_id = next_id();

            let outcome =
                FileRepository::insert_if_share_id_free(&mut tx, new_record, &share_id).await;

            match outcome {
                Ok(InsertOutcome::Inserted(record)) => {
                    tx.commit().await?;
                    debug!(share_id = %record.share_id, attempt, "Share id claimed");
                    return Ok(record);
                }
                Ok(InsertOutcome::ShareIdTaken) => {
                    debug!(share_id = %share_id, attempt, "Share id collision");
                }
                Err(e) if e.is_unique_violation_on("files.share_id") => {
                    debug!(share_id = %share_id, attempt, "Share id collision on insert");
                }
                Ok(InsertOutcome::OwnerMissing) => {
                    return Err(SharedropError::NotFound("owner".to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        Err(SharedropError::Conflict(format!(
            "no unused share id after {} attempts",
            self.attempts
        )))
    }
}
