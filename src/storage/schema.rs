//! Database schema definitions
//!
//! The durable store and the TTL cache live in separate files, each with its
//! own schema.

/// Schema of the durable record store
///
/// Every record table has the same shape: the natural key, the JSON payload
/// and a hash of the payload used to detect unchanged captures.
pub const RECORDS_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    natural_key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    payload_hash TEXT NOT NULL,
    captured_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS programs (
    natural_key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    payload_hash TEXT NOT NULL,
    captured_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sections (
    natural_key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    payload_hash TEXT NOT NULL,
    captured_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS courses (
    natural_key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    payload_hash TEXT NOT NULL,
    captured_at TEXT NOT NULL
);

-- One row per record kind whose full crawl has finished
CREATE TABLE IF NOT EXISTS crawl_runs (
    kind TEXT PRIMARY KEY,
    completed_at TEXT NOT NULL,
    record_count INTEGER NOT NULL DEFAULT 0
);

PRAGMA user_version = 1;
"#;

/// Schema of the TTL cache; `expires_at` is in Unix milliseconds
pub const CACHE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS ttl_cache (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ttl_cache_expires ON ttl_cache(expires_at);

PRAGMA user_version = 1;
"#;

pub fn initialize_records_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(RECORDS_SCHEMA_SQL)
}

pub fn initialize_cache_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(CACHE_SCHEMA_SQL)
}
