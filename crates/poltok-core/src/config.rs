//! Environment-driven construction of [`AppConfig`].

use std::env::VarError;
use std::path::PathBuf;

use crate::{AppConfig, ConfigError};

/// Loads configuration, reading a `.env` file first if one exists.
///
/// # Errors
///
/// Returns [`ConfigError`] when a variable is set to an unparseable or
/// out-of-range value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Loads configuration from the process environment only.
///
/// # Errors
///
/// Returns [`ConfigError`] when a variable is set to an unparseable or
/// out-of-range value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|var| std::env::var(var))
}

/// Builds an [`AppConfig`] from an injectable variable lookup.
///
/// Tests pass a map-backed lookup instead of mutating the process
/// environment.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] when a variable is set but does
/// not parse, or parses to a value outside its allowed range.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };
    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be an unsigned integer".to_string(),
            }),
            Err(_) => Ok(default),
        }
    };
    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be an unsigned integer".to_string(),
            }),
            Err(_) => Ok(default),
        }
    };
    let parse_usize = |var: &str, default: usize| -> Result<usize, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be an unsigned integer".to_string(),
            }),
            Err(_) => Ok(default),
        }
    };

    let max_pages = parse_usize("POLTOK_MAX_PAGES", 100)?;
    if max_pages == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "POLTOK_MAX_PAGES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let page_size = parse_u32("POLTOK_PAGE_SIZE", 100)?;
    if page_size == 0 || page_size > 100 {
        return Err(ConfigError::InvalidEnvVar {
            var: "POLTOK_PAGE_SIZE".to_string(),
            reason: "must be between 1 and 100".to_string(),
        });
    }

    Ok(AppConfig {
        tiktok_access_token: lookup("TIKTOK_ACCESS_TOKEN").ok(),
        log_level: or_default("POLTOK_LOG_LEVEL", "info"),
        accounts_path: PathBuf::from(or_default(
            "POLTOK_ACCOUNTS_PATH",
            "./config/accounts.yaml",
        )),
        output_dir: PathBuf::from(or_default("POLTOK_OUTPUT_DIR", "./data")),
        api_base_url: or_default("POLTOK_API_BASE_URL", "https://open.tiktokapis.com"),
        request_timeout_secs: parse_u64("POLTOK_REQUEST_TIMEOUT_SECS", 30)?,
        max_retries: parse_u32("POLTOK_MAX_RETRIES", 3)?,
        retry_backoff_base_ms: parse_u64("POLTOK_RETRY_BACKOFF_BASE_MS", 1000)?,
        min_request_interval_ms: parse_u64("POLTOK_MIN_REQUEST_INTERVAL_MS", 1000)?,
        max_pages,
        page_size,
        max_concurrent_accounts: parse_usize("POLTOK_MAX_CONCURRENT_ACCOUNTS", 1)?,
    })
}
