use crate::app_config::{AppConfig, Environment, RateLimitConfig, ScheduleConfig};
use crate::products::AffiliateLinkPolicy;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    // A zero timeout fails every call, and Postgres reads a zero
    // statement_timeout as "no limit".
    let parse_nonzero_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        match parse_u64(var, default)? {
            0 => Err(invalid(var, "must be at least 1".to_string())),
            value => Ok(value),
        }
    };

    let parse_nonzero_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        match parse_u32(var, default)? {
            0 => Err(invalid(var, "must be at least 1".to_string())),
            value => Ok(value),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let catalog_api_key = require("BB_API_KEY").ok();

    let env = parse_environment(&or_default("DEALSDB_ENV", "development"));

    let bind_addr = or_default("DEALSDB_BIND_ADDR", "0.0.0.0:3001")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("DEALSDB_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("DEALSDB_LOG_LEVEL", "info");
    let categories_path = PathBuf::from(or_default(
        "DEALSDB_CATEGORIES_PATH",
        "./config/categories.yaml",
    ));
    let cors_origins = parse_list(&or_default("DEALSDB_CORS_ORIGINS", ""));

    let catalog_base_url = or_default("DEALSDB_CATALOG_BASE_URL", "https://api.bestbuy.com");
    let catalog_timeout_secs = parse_nonzero_u64("DEALSDB_CATALOG_TIMEOUT_SECS", "30")?;
    let catalog_user_agent = or_default(
        "DEALSDB_CATALOG_USER_AGENT",
        "dealsdb/0.1 (deal-ingestion)",
    );
    let affiliate_policy =
        AffiliateLinkPolicy::from_base_url(lookup("DEALSDB_AFFILIATE_BASE_URL").ok().as_deref());

    let db_max_connections = parse_nonzero_u32("DEALSDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("DEALSDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_nonzero_u64("DEALSDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let ingest_storage_timeout_secs =
        parse_nonzero_u64("DEALSDB_INGEST_STORAGE_TIMEOUT_SECS", "30")?;

    let trust_forwarded_for = parse_bool(&or_default(
        "DEALSDB_RATE_LIMIT_TRUST_FORWARDED_FOR",
        "false",
    ))
    .map_err(|reason| invalid("DEALSDB_RATE_LIMIT_TRUST_FORWARDED_FOR", reason))?;
    let rate_limit = RateLimitConfig {
        max_requests: parse_nonzero_u32("DEALSDB_RATE_LIMIT_MAX_REQUESTS", "120")?,
        window_secs: parse_nonzero_u64("DEALSDB_RATE_LIMIT_WINDOW_SECS", "60")?,
        trust_forwarded_for,
    };

    let base_secs = parse_time_of_day(&or_default("DEALSDB_SCHEDULE_BASE_TIME", "12:00:00"))
        .map_err(|reason| invalid("DEALSDB_SCHEDULE_BASE_TIME", reason))?;
    let stagger_secs = parse_u32("DEALSDB_SCHEDULE_STAGGER_SECS", "60")?;
    let enabled = parse_bool(&or_default("DEALSDB_SCHEDULER_ENABLED", "true"))
        .map_err(|reason| invalid("DEALSDB_SCHEDULER_ENABLED", reason))?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        categories_path,
        cors_origins,
        catalog_api_key,
        catalog_base_url,
        catalog_timeout_secs,
        catalog_user_agent,
        affiliate_policy,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        ingest_storage_timeout_secs,
        rate_limit,
        schedule: ScheduleConfig {
            enabled,
            base_secs,
            stagger_secs,
        },
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Parse `HH:MM` or `HH:MM:SS` into seconds past midnight.
fn parse_time_of_day(s: &str) -> Result<u32, String> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(format!("expected HH:MM or HH:MM:SS, got '{s}'"));
    }

    let field = |idx: usize, max: u32| -> Result<u32, String> {
        let raw = parts.get(idx).copied().unwrap_or("0");
        let value = raw
            .parse::<u32>()
            .map_err(|e| format!("'{raw}' in '{s}': {e}"))?;
        if value > max {
            return Err(format!("'{raw}' in '{s}' is out of range (max {max})"));
        }
        Ok(value)
    };

    let hours = field(0, 23)?;
    let minutes = field(1, 59)?;
    let seconds = field(2, 59)?;
    Ok(hours * 3600 + minutes * 60 + seconds)
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got '{other}'")),
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
