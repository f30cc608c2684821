//! SQLite mirror of the last profile snapshot per user.
//!
//! The mirror is a convenience copy. It is overwritten after every successful
//! live read or save and is only read back when a caller explicitly asks for
//! offline data.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::profile::ProfileData;

const SCHEMA_VERSION: i32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum MirrorError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("date parse error: {0}")]
    Date(#[from] chrono::ParseError),
    #[error("no mirrored profile for {0}")]
    NotFound(String),
}

/// A stored profile with the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorSnapshot {
    pub profile: ProfileData,
    pub saved_at: DateTime<Utc>,
}

pub struct ProfileMirror {
    conn: Connection,
}

impl ProfileMirror {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MirrorError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        let mirror = Self { conn };
        mirror.init()?;
        Ok(mirror)
    }

    /// Open an in-memory mirror (for testing).
    pub fn open_in_memory() -> Result<Self, MirrorError> {
        let conn = Connection::open_in_memory()?;
        let mirror = Self { conn };
        mirror.init()?;
        Ok(mirror)
    }

    fn init(&self) -> Result<(), MirrorError> {
        let schema = include_str!("../../schema/mirror.sql");
        self.conn.execute_batch(schema)?;
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version < SCHEMA_VERSION {
            self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }

    /// Replaces the snapshot stored under `key`.
    pub fn save(&self, key: &str, profile: &ProfileData) -> Result<DateTime<Utc>, MirrorError> {
        let saved_at = Utc::now();
        let payload = serde_json::to_string(profile)?;
        self.conn.execute(
            "INSERT INTO profile_snapshots (profile_key, account_id, company_stage, payload, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(profile_key) DO UPDATE SET
                account_id = excluded.account_id,
                company_stage = excluded.company_stage,
                payload = excluded.payload,
                saved_at = excluded.saved_at",
            params![
                key,
                profile.account_id,
                profile.company_stage,
                payload,
                saved_at.to_rfc3339()
            ],
        )?;
        self.set_meta("last_write", &saved_at.to_rfc3339())?;
        Ok(saved_at)
    }

    pub fn load(&self, key: &str) -> Result<Option<MirrorSnapshot>, MirrorError> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT payload, saved_at FROM profile_snapshots WHERE profile_key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((payload, saved_at)) = row else {
            return Ok(None);
        };
        Ok(Some(MirrorSnapshot {
            profile: serde_json::from_str(&payload)?,
            saved_at: DateTime::parse_from_rfc3339(&saved_at)?.with_timezone(&Utc),
        }))
    }

    pub fn remove(&self, key: &str) -> Result<bool, MirrorError> {
        let n = self.conn.execute(
            "DELETE FROM profile_snapshots WHERE profile_key = ?1",
            params![key],
        )?;
        Ok(n > 0)
    }

    pub fn snapshot_count(&self) -> Result<i64, MirrorError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM profile_snapshots", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, MirrorError> {
        self.conn
            .query_row(
                "SELECT value FROM mirror_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(MirrorError::from)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), MirrorError> {
        self.conn.execute(
            "INSERT INTO mirror_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}
