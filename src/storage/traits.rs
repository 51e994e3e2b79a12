//! Storage traits and error types

use crate::models::{Record, RecordKind};
use crate::storage::UpsertOutcome;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable, key-addressed record storage
///
/// Records are addressed by [`Record::natural_key`]; writing a record whose
/// key already exists replaces it.
pub trait RecordStorage {
    // ===== Records =====

    /// Inserts or replaces a record
    fn upsert<R: Record>(&mut self, record: &R) -> StorageResult<UpsertOutcome>;

    fn get<R: Record>(&self, key: &str) -> StorageResult<Option<R>>;

    /// Every record of a kind, in first-capture order
    fn all<R: Record>(&self) -> StorageResult<Vec<R>>;

    fn count(&self, kind: RecordKind) -> StorageResult<u64>;

    fn contains(&self, kind: RecordKind, key: &str) -> StorageResult<bool>;

    /// Removes every record of a kind and its completion marker
    fn clear(&mut self, kind: RecordKind) -> StorageResult<()>;

    // ===== Crawl completion =====

    /// Records that a full crawl of `kind` finished
    fn mark_complete(&mut self, kind: RecordKind, record_count: u64) -> StorageResult<()>;

    fn completed_at(&self, kind: RecordKind) -> StorageResult<Option<DateTime<Utc>>>;
}

/// Ephemeral key/value storage whose entries expire
///
/// An entry is valid strictly before its expiry instant. The `_at` variants
/// take the current time explicitly.
pub trait EphemeralCache {
    fn get_at<T: DeserializeOwned>(&mut self, key: &str, now: DateTime<Utc>) -> StorageResult<Option<T>>;

    fn set_at<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> StorageResult<()>;

    fn remove(&mut self, key: &str) -> StorageResult<bool>;

    /// Drops every entry expired at `now`; returns how many were removed
    fn purge_expired_at(&mut self, now: DateTime<Utc>) -> StorageResult<usize>;

    fn get<T: DeserializeOwned>(&mut self, key: &str) -> StorageResult<Option<T>> {
        self.get_at(key, Utc::now())
    }

    fn set<T: Serialize>(&mut self, key: &str, value: &T, ttl: Duration) -> StorageResult<()> {
        self.set_at(key, value, ttl, Utc::now())
    }

    fn purge_expired(&mut self) -> StorageResult<usize> {
        self.purge_expired_at(Utc::now())
    }
}
