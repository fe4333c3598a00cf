use crate::app_config::{AppConfig, Environment};
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
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset so `.env` templates can leave keys blank.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("ICARE_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_as(
        "ICARE_BIND_ADDR",
        &or_default("ICARE_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("ICARE_LOG_LEVEL", "info");
    let timezone = parse_timezone(&or_default("ICARE_TIMEZONE", "Asia/Seoul"))?;

    let db_max_connections: u32 = parse_as(
        "ICARE_DB_MAX_CONNECTIONS",
        &or_default("ICARE_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "ICARE_DB_MIN_CONNECTIONS",
        &or_default("ICARE_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs: u64 = parse_as(
        "ICARE_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("ICARE_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let pharmacy_api_key = optional("PHARMACY_API_KEY");
    let hospital_api_key = optional("HOSPITAL_API_KEY");
    let drug_api_key = optional("DRUG_API_KEY");

    let publicdata_timeout_secs: u64 = parse_as(
        "ICARE_PUBLICDATA_TIMEOUT_SECS",
        &or_default("ICARE_PUBLICDATA_TIMEOUT_SECS", "30"),
    )?;
    let publicdata_max_retries: u32 = parse_as(
        "ICARE_PUBLICDATA_MAX_RETRIES",
        &or_default("ICARE_PUBLICDATA_MAX_RETRIES", "3"),
    )?;
    let publicdata_retry_backoff_base_ms: u64 = parse_as(
        "ICARE_PUBLICDATA_RETRY_BACKOFF_BASE_MS",
        &or_default("ICARE_PUBLICDATA_RETRY_BACKOFF_BASE_MS", "500"),
    )?;

    let chat_session_ttl_secs: u64 = parse_as(
        "ICARE_CHAT_SESSION_TTL_SECS",
        &or_default("ICARE_CHAT_SESSION_TTL_SECS", "1800"),
    )?;
    let chat_max_sessions: usize = parse_as(
        "ICARE_CHAT_MAX_SESSIONS",
        &or_default("ICARE_CHAT_MAX_SESSIONS", "1000"),
    )?;
    let chat_history_limit: usize = parse_as(
        "ICARE_CHAT_HISTORY_LIMIT",
        &or_default("ICARE_CHAT_HISTORY_LIMIT", "50"),
    )?;

    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "ICARE_DB_MIN_CONNECTIONS".to_string(),
            reason: format!("must not exceed ICARE_DB_MAX_CONNECTIONS ({db_max_connections})"),
        });
    }
    if chat_max_sessions == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "ICARE_CHAT_MAX_SESSIONS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        timezone,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        pharmacy_api_key,
        hospital_api_key,
        drug_api_key,
        publicdata_timeout_secs,
        publicdata_max_retries,
        publicdata_retry_backoff_base_ms,
        chat_session_ttl_secs,
        chat_max_sessions,
        chat_history_limit,
    })
}

fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ICARE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_timezone(s: &str) -> Result<chrono_tz::Tz, ConfigError> {
    s.parse::<chrono_tz::Tz>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "ICARE_TIMEZONE".to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
