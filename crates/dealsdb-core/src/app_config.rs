use std::net::SocketAddr;
use std::path::PathBuf;

use crate::products::AffiliateLinkPolicy;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Daily ingestion schedule: the first feed fires at `base_secs` past
/// midnight UTC and each following feed `stagger_secs` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub base_secs: u32,
    pub stagger_secs: u32,
}

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

impl ScheduleConfig {
    /// Seconds past midnight UTC at which the node at `index` (registry
    /// order) fires, wrapped at midnight.
    #[must_use]
    pub fn slot_secs(&self, index: usize) -> u32 {
        let offset = u64::from(self.stagger_secs).saturating_mul(index as u64);
        let secs = (u64::from(self.base_secs) + offset % SECONDS_PER_DAY) % SECONDS_PER_DAY;
        u32::try_from(secs).unwrap_or(0)
    }
}

/// Per-client request budget for the API routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
    /// Identify clients by the first `x-forwarded-for` address instead of
    /// the socket peer. Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub categories_path: PathBuf,
    pub cors_origins: Vec<String>,
    /// `None` when `BB_API_KEY` is unset; only ingestion needs it.
    pub catalog_api_key: Option<String>,
    pub catalog_base_url: String,
    pub catalog_timeout_secs: u64,
    pub catalog_user_agent: String,
    pub affiliate_policy: AffiliateLinkPolicy,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub ingest_storage_timeout_secs: u64,
    pub rate_limit: RateLimitConfig,
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    /// The catalog API key, for commands that talk to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `BB_API_KEY` was not set.
    pub fn require_catalog_api_key(&self) -> Result<&str, ConfigError> {
        self.catalog_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("BB_API_KEY".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("categories_path", &self.categories_path)
            .field("database_url", &"[redacted]")
            .field("cors_origins", &self.cors_origins)
            .field("catalog_api_key", &"[redacted]")
            .field("catalog_base_url", &self.catalog_base_url)
            .field("catalog_timeout_secs", &self.catalog_timeout_secs)
            .field("catalog_user_agent", &self.catalog_user_agent)
            .field("affiliate_policy", &self.affiliate_policy)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "ingest_storage_timeout_secs",
                &self.ingest_storage_timeout_secs,
            )
            .field("rate_limit", &self.rate_limit)
            .field("schedule", &self.schedule)
            .finish()
    }
}
