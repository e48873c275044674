use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Browser-like `User-Agent` sent to news homepages and article pages. Several
/// of the sources serve stripped or blocked markup to obvious bots.
pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Upper bound for the job visibility timeout. Claims compute the lease
/// deadline as a Postgres interval, which cannot hold arbitrary `u64` seconds.
pub const MAX_VISIBILITY_TIMEOUT_SECS: u64 = 86_400;

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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
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

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("TITAN_ENV", "development"))?;

    let bind_addr = parse_addr("TITAN_BIND_ADDR", "0.0.0.0:8000")?;
    let log_level = or_default("TITAN_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("TITAN_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("TITAN_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("TITAN_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_request_timeout_secs = parse_u64("TITAN_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("TITAN_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let dispatch_source_delay_ms = parse_u64("TITAN_DISPATCH_SOURCE_DELAY_MS", "1000")?;

    let embed_url = trim_base_url(or_default("TITAN_EMBED_URL", "http://localhost:8080"));
    let classify_url = trim_base_url(or_default("TITAN_CLASSIFY_URL", "http://localhost:8081"));
    let inference_timeout_secs = parse_u64("TITAN_INFERENCE_TIMEOUT_SECS", "60")?;

    let worker_concurrency = parse_usize("TITAN_WORKER_CONCURRENCY", "4")?;
    if worker_concurrency == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TITAN_WORKER_CONCURRENCY".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let worker_poll_interval_ms = parse_u64("TITAN_WORKER_POLL_INTERVAL_MS", "1000")?;
    let worker_visibility_timeout_secs = parse_u64("TITAN_WORKER_VISIBILITY_TIMEOUT_SECS", "600")?;
    if !(1..=MAX_VISIBILITY_TIMEOUT_SECS).contains(&worker_visibility_timeout_secs) {
        return Err(ConfigError::InvalidEnvVar {
            var: "TITAN_WORKER_VISIBILITY_TIMEOUT_SECS".to_string(),
            reason: format!("must be between 1 and {MAX_VISIBILITY_TIMEOUT_SECS}"),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        dispatch_source_delay_ms,
        embed_url,
        classify_url,
        inference_timeout_secs,
        worker_concurrency,
        worker_poll_interval_ms,
        worker_visibility_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TITAN_ENV".to_string(),
            reason: format!("expected development, test, or production; got \"{other}\""),
        }),
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
