use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable holding the portal username
pub const USER_ENV: &str = "SIGAA_API_USER";

/// Environment variable holding the portal password
pub const PASSWORD_ENV: &str = "SIGAA_API_PASSWORD";

/// Environment variable overriding the institution key
pub const INSTITUTION_ENV: &str = "SIGAA_API_DEFAULT_PROVIDER";

/// Environment variable overriding the data directory
pub const DATA_PATH_ENV: &str = "SIGAA_DATA_PATH";

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are applied before validation, so a config file
/// without credentials is valid as long as the environment supplies them
/// when a login is attempted.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sigaa_crawler::config::load_config;
///
/// let config = load_config(Path::new("sigaa.toml")).unwrap();
/// println!("Institution: {}", config.portal.institution);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

/// Parses configuration text without touching the environment
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

/// Applies environment overrides using the given lookup
///
/// Values from the environment win over values in the file; empty values
/// are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(user) = get(USER_ENV) {
        config.credentials.username = Some(user);
    }
    if let Some(password) = get(PASSWORD_ENV) {
        config.credentials.password = Some(password);
    }
    if let Some(institution) = get(INSTITUTION_ENV) {
        config.portal.institution = institution;
    }
    if let Some(data_dir) = get(DATA_PATH_ENV) {
        config.storage.data_dir = data_dir;
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so cached data can be traced back to the config that
/// produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
