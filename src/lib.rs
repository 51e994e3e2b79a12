//! sigaa-crawler: a session-based navigator for the SIGAA academic portal
//!
//! This crate logs into a SIGAA instance, walks its list and detail pages with
//! explicit history tracking, and turns the semi-structured markup into typed
//! records (accounts, sections, rosters, curricula) backed by a local cache.

pub mod browser;
pub mod client;
pub mod config;
pub mod extract;
pub mod models;
pub mod navigator;
pub mod output;
pub mod portal;
pub mod query;
pub mod session;
pub mod storage;

use thiserror::Error;

/// Main error type for sigaa-crawler operations
#[derive(Debug, Error)]
pub enum SigaaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not authenticated: call login before requesting portal data")]
    NotAuthenticated,

    #[error("Expected container '{container}' never appeared on {url}")]
    StructuralExtraction { url: String, container: String },

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid session transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: session::LoginStatus,
        to: session::LoginStatus,
    },

    #[error("Institution not supported: {0}")]
    UnsupportedInstitution(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl SigaaError {
    /// Returns true for errors that only concern the page being visited
    ///
    /// The navigator uses this to isolate a failing row instead of aborting
    /// the traversal. Connection-level failures are never row-local.
    pub fn is_row_local(&self) -> bool {
        matches!(self, Self::HttpStatus { .. } | Self::StructuralExtraction { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing value: {0}")]
    Missing(String),
}

/// Result type alias for sigaa-crawler operations
pub type Result<T> = std::result::Result<T, SigaaError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use client::SigaaClient;
pub use config::Config;
pub use navigator::{Navigator, Traversal, TraversalReport};
pub use query::{Fragment, Matches, Page};
pub use session::{LoginStatus, Session};
