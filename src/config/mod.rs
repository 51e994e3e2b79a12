//! Configuration module for sigaa-crawler
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, with credentials and paths overridable from the environment.
//!
//! # Example
//!
//! ```no_run
//! use sigaa_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sigaa.toml")).unwrap();
//! println!("Caching under: {}", config.storage.data_dir);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, CredentialsConfig, PortalConfig, StorageConfig, TransportConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
    DATA_PATH_ENV, INSTITUTION_ENV, PASSWORD_ENV, USER_ENV,
};
