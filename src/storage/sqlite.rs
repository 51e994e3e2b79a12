//! SQLite storage implementation
//!
//! One connection per file: the durable record store and the TTL cache are
//! opened separately so the cache can be wiped without touching records.

use crate::models::{Record, RecordKind};
use crate::storage::schema::{initialize_cache_schema, initialize_records_schema};
use crate::storage::traits::{EphemeralCache, RecordStorage, StorageError, StorageResult};
use crate::storage::UpsertOutcome;
use crate::SigaaError;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

fn open_connection(path: &Path) -> Result<Connection, SigaaError> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    Ok(conn)
}

fn payload_hash(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}

/// Durable record store
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Opens or creates the record database at `path`
    pub fn new(path: &Path) -> Result<Self, SigaaError> {
        let conn = open_connection(path)?;
        initialize_records_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SigaaError> {
        let conn = Connection::open_in_memory()?;
        initialize_records_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl RecordStorage for SqliteRecordStore {
    fn upsert<R: Record>(&mut self, record: &R) -> StorageResult<UpsertOutcome> {
        let key = record.natural_key();
        if key.trim().is_empty() {
            return Err(StorageError::ConstraintViolation(format!(
                "{} record without a natural key",
                R::KIND
            )));
        }

        let payload = serde_json::to_string(record)?;
        let hash = payload_hash(&payload);
        let table = R::KIND.table_name();

        let previous: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT payload_hash FROM {} WHERE natural_key = ?1", table),
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        if previous.as_deref() == Some(hash.as_str()) {
            return Ok(UpsertOutcome::Unchanged);
        }

        self.conn.execute(
            &format!(
                "INSERT INTO {} (natural_key, payload, payload_hash, captured_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(natural_key) DO UPDATE SET
                    payload = excluded.payload,
                    payload_hash = excluded.payload_hash,
                    captured_at = excluded.captured_at",
                table
            ),
            params![key, payload, hash, Utc::now().to_rfc3339()],
        )?;

        Ok(match previous {
            Some(_) => UpsertOutcome::Replaced,
            None => UpsertOutcome::Inserted,
        })
    }

    fn get<R: Record>(&self, key: &str) -> StorageResult<Option<R>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                &format!(
                    "SELECT payload FROM {} WHERE natural_key = ?1",
                    R::KIND.table_name()
                ),
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    fn all<R: Record>(&self) -> StorageResult<Vec<R>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT payload FROM {} ORDER BY rowid",
            R::KIND.table_name()
        ))?;

        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        payloads
            .iter()
            .map(|payload| serde_json::from_str(payload).map_err(StorageError::from))
            .collect()
    }

    fn count(&self, kind: RecordKind) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table_name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn contains(&self, kind: RecordKind, key: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                &format!(
                    "SELECT 1 FROM {} WHERE natural_key = ?1",
                    kind.table_name()
                ),
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn clear(&mut self, kind: RecordKind) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", kind.table_name()), [])?;
        tx.execute(
            "DELETE FROM crawl_runs WHERE kind = ?1",
            params![kind.table_name()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn mark_complete(&mut self, kind: RecordKind, record_count: u64) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO crawl_runs (kind, completed_at, record_count) VALUES (?1, ?2, ?3)
             ON CONFLICT(kind) DO UPDATE SET
                completed_at = excluded.completed_at,
                record_count = excluded.record_count",
            params![kind.table_name(), Utc::now().to_rfc3339(), record_count as i64],
        )?;
        Ok(())
    }

    fn completed_at(&self, kind: RecordKind) -> StorageResult<Option<DateTime<Utc>>> {
        let stamp: Option<String> = self
            .conn
            .query_row(
                "SELECT completed_at FROM crawl_runs WHERE kind = ?1",
                params![kind.table_name()],
                |row| row.get(0),
            )
            .optional()?;

        stamp
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| StorageError::Serialization(format!("bad completion time '{}': {}", s, e)))
            })
            .transpose()
    }
}

/// TTL-bounded key/value cache
pub struct SqliteTtlCache {
    conn: Connection,
}

impl SqliteTtlCache {
    /// Opens or creates the cache database at `path`
    pub fn new(path: &Path) -> Result<Self, SigaaError> {
        let conn = open_connection(path)?;
        initialize_cache_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SigaaError> {
        let conn = Connection::open_in_memory()?;
        initialize_cache_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> StorageResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ttl_cache", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl EphemeralCache for SqliteTtlCache {
    fn get_at<T: DeserializeOwned>(&mut self, key: &str, now: DateTime<Utc>) -> StorageResult<Option<T>> {
        let entry: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT value, expires_at FROM ttl_cache WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((value, expires_at)) = entry else {
            return Ok(None);
        };

        if now.timestamp_millis() >= expires_at {
            tracing::debug!("Cache entry {} expired", key);
            self.conn
                .execute("DELETE FROM ttl_cache WHERE key = ?1", params![key])?;
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&value)?))
    }

    fn set_at<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> StorageResult<()> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| StorageError::InvalidTtl(format!("{} from {} overflows", ttl, now)))?
            .timestamp_millis();
        let value = serde_json::to_string(value)?;

        self.conn.execute(
            "INSERT INTO ttl_cache (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at",
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM ttl_cache WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    fn purge_expired_at(&mut self, now: DateTime<Utc>) -> StorageResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM ttl_cache WHERE expires_at <= ?1",
            params![now.timestamp_millis()],
        )?;
        Ok(removed)
    }
}
