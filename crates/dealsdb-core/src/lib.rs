pub mod app_config;
pub mod categories;
pub mod config;
pub mod products;

pub use app_config::{AppConfig, Environment, RateLimitConfig, ScheduleConfig};
pub use categories::{load_categories, CategoryNode, CategoryRegistry};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{AffiliateLinkPolicy, ProductRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read categories file {path}: {source}")]
    CategoriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse categories file: {0}")]
    CategoriesFileParse(#[from] serde_yaml::Error),

    #[error("invalid category registry: {0}")]
    Validation(String),
}
