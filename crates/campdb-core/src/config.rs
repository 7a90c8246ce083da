use crate::app_config::{AppConfig, Environment};
use crate::geo::BoundingBox;
use crate::ConfigError;

const DEFAULT_SEARCH_API_URL: &str = "https://thedyrt.com/api/v6/locations/search-results";
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_CRAWL_BOUNDS: &str = "-124.77,24.52,-66.95,49.38";

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
/// Decoupled from the process environment so tests can drive it with a plain
/// `HashMap` lookup.
#[allow(clippy::too_many_lines)]
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

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("\"{other}\" is not a boolean"))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("CAMPDB_ENV", "development"))?;

    let bind_addr = parse_addr("CAMPDB_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("CAMPDB_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("CAMPDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("CAMPDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CAMPDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let search_api_url = or_default("CAMPDB_SEARCH_API_URL", DEFAULT_SEARCH_API_URL);
    let scraper_request_timeout_secs = parse_u64("CAMPDB_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default(
        "CAMPDB_SCRAPER_USER_AGENT",
        "campdb/0.1 (campground-catalog)",
    );
    let scraper_max_concurrent_regions =
        parse_usize("CAMPDB_SCRAPER_MAX_CONCURRENT_REGIONS", "4")?;
    if scraper_max_concurrent_regions == 0 {
        return Err(invalid(
            "CAMPDB_SCRAPER_MAX_CONCURRENT_REGIONS",
            "must be at least 1".to_string(),
        ));
    }
    let scraper_page_size = parse_u32("CAMPDB_SCRAPER_PAGE_SIZE", "100")?;
    if scraper_page_size == 0 {
        return Err(invalid(
            "CAMPDB_SCRAPER_PAGE_SIZE",
            "must be at least 1".to_string(),
        ));
    }
    let scraper_grid_divisions = parse_u32("CAMPDB_SCRAPER_GRID_DIVISIONS", "4")?;
    if scraper_grid_divisions == 0 {
        return Err(invalid(
            "CAMPDB_SCRAPER_GRID_DIVISIONS",
            "must be at least 1".to_string(),
        ));
    }
    let scraper_inter_request_delay_ms =
        parse_u64("CAMPDB_SCRAPER_INTER_REQUEST_DELAY_MS", "1000")?;
    let scraper_max_retries = parse_u32("CAMPDB_SCRAPER_MAX_RETRIES", "2")?;
    let scraper_retry_backoff_base_ms = parse_u64("CAMPDB_SCRAPER_RETRY_BACKOFF_BASE_MS", "2000")?;
    let scraper_retry_max_delay_ms = parse_u64("CAMPDB_SCRAPER_RETRY_MAX_DELAY_MS", "10000")?;

    let crawl_bounds = or_default("CAMPDB_CRAWL_BOUNDS", DEFAULT_CRAWL_BOUNDS)
        .parse::<BoundingBox>()
        .map_err(|e| invalid("CAMPDB_CRAWL_BOUNDS", e.to_string()))?;
    let crawl_cron = or_default("CAMPDB_CRAWL_CRON", "0 0 2 * * *");

    let geocoder_enabled = parse_bool("CAMPDB_GEOCODER_ENABLED", "true")?;
    let geocoder_url = or_default("CAMPDB_GEOCODER_URL", DEFAULT_GEOCODER_URL);

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        search_api_url,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_concurrent_regions,
        scraper_page_size,
        scraper_grid_divisions,
        scraper_inter_request_delay_ms,
        scraper_max_retries,
        scraper_retry_backoff_base_ms,
        scraper_retry_max_delay_ms,
        crawl_bounds,
        crawl_cron,
        geocoder_enabled,
        geocoder_url,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CAMPDB_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
