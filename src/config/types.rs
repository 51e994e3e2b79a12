use serde::Deserialize;

/// Main configuration structure for sigaa-crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
}

/// Which portal instance to talk to
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Institution key (e.g., "UFBA")
    pub institution: String,

    /// Overrides the profile's default host
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,
}

/// Login credentials; usually supplied through the environment
#[derive(Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Local cache locations and lifetimes
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory holding `data/` (durable) and `cache/` (TTL) databases
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: String,

    /// Lifetime of cached course lookups
    #[serde(rename = "course-ttl-hours", default = "default_course_ttl_hours")]
    pub course_ttl_hours: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            course_ttl_hours: default_course_ttl_hours(),
        }
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Number of documents kept for `back()`
    #[serde(rename = "history-limit", default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            history_limit: default_history_limit(),
        }
    }
}

/// Crawl scope and limits
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Department option values to crawl for sections; empty means all
    #[serde(default)]
    pub departments: Vec<String>,

    /// Caller-level timeout wrapped around each CLI command (seconds)
    #[serde(rename = "command-timeout-secs", default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            departments: Vec::new(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

fn default_data_dir() -> String {
    "/tmp/sigaa".to_string()
}

fn default_course_ttl_hours() -> u64 {
    24
}

fn default_user_agent() -> String {
    format!("sigaa-crawler/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_history_limit() -> usize {
    16
}

fn default_command_timeout_secs() -> u64 {
    600
}
