//! Database schema and migrations for sharedrop.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password    TEXT NOT NULL,                       -- Argon2 hash
    tier        TEXT NOT NULL DEFAULT 'free' CHECK (tier IN ('free', 'pro')),
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: committed file records
    r#"
CREATE TABLE files (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    stored_name     TEXT NOT NULL UNIQUE,             -- server-generated blob key
    original_name   TEXT NOT NULL,                    -- display only
    size            INTEGER NOT NULL CHECK (size >= 0),
    share_id        TEXT NOT NULL UNIQUE,
    owner_id        INTEGER NOT NULL REFERENCES users(id),
    created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
);

CREATE INDEX idx_files_owner_created ON files(owner_id, created_at);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_users_migration() {
        let users = MIGRATIONS[0];
        assert!(users.contains("CREATE TABLE users"));
        assert!(users.contains("COLLATE NOCASE"));
        assert!(users.contains("tier"));
    }

    #[test]
    fn test_files_migration() {
        let files = MIGRATIONS[1];
        assert!(files.contains("CREATE TABLE files"));
        assert!(files.contains("share_id        TEXT NOT NULL UNIQUE"));
        assert!(files.contains("stored_name     TEXT NOT NULL UNIQUE"));
        assert!(files.contains("REFERENCES users(id)"));
    }
}
