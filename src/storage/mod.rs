//! Storage module for captured records
//!
//! Two stores per institution:
//! - the durable record store (`<data-dir>/data/<institution>.db`), where
//!   records are upserted by natural key and survive restarts
//! - the TTL cache (`<data-dir>/cache/<institution>.db`) for short-lived
//!   lookups such as component details

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{SqliteRecordStore, SqliteTtlCache};
pub use traits::{EphemeralCache, RecordStorage, StorageError, StorageResult};

use crate::SigaaError;
use std::fs;
use std::path::{Path, PathBuf};

/// What an upsert did to the stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
    /// Same payload as stored; nothing was written
    Unchanged,
}

impl UpsertOutcome {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Replaced => "replaced",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Upsert outcomes of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertTally {
    pub inserted: usize,
    pub replaced: usize,
    pub unchanged: usize,
}

impl UpsertTally {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Replaced => self.replaced += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn merge(&mut self, other: UpsertTally) {
        self.inserted += other.inserted;
        self.replaced += other.replaced;
        self.unchanged += other.unchanged;
    }

    pub fn total(&self) -> usize {
        self.inserted + self.replaced + self.unchanged
    }
}

/// Store handles for one institution, opened once per client
pub struct Stores {
    pub records: SqliteRecordStore,
    pub cache: SqliteTtlCache,
}

impl Stores {
    /// Opens (creating as needed) both databases under `data_dir`
    pub fn open(data_dir: &Path, institution: &str) -> Result<Self, SigaaError> {
        let records_path = database_path(data_dir, "data", institution);
        let cache_path = database_path(data_dir, "cache", institution);

        for path in [&records_path, &cache_path] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        tracing::debug!(
            "Opening stores {} and {}",
            records_path.display(),
            cache_path.display()
        );

        Ok(Self {
            records: SqliteRecordStore::new(&records_path)?,
            cache: SqliteTtlCache::new(&cache_path)?,
        })
    }

    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SigaaError> {
        Ok(Self {
            records: SqliteRecordStore::new_in_memory()?,
            cache: SqliteTtlCache::new_in_memory()?,
        })
    }
}

/// `<data_dir>/<area>/<institution>.db`, institution lowercased
pub fn database_path(data_dir: &Path, area: &str, institution: &str) -> PathBuf {
    data_dir
        .join(area)
        .join(format!("{}.db", institution.trim().to_lowercase()))
}
