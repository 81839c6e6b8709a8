//! Application configuration resolved from the environment.

use std::fmt;
use std::path::PathBuf;

use crate::ConfigError;

/// Runtime configuration for the collector, resolved once at startup.
///
/// The access token is optional at load time so that commands which never
/// touch the API (`accounts validate`, dry runs) work without credentials.
/// Commands that do call the API obtain the token through
/// [`AppConfig::require_access_token`].
#[derive(Clone)]
pub struct AppConfig {
    /// Research API bearer token, if present in the environment.
    pub tiktok_access_token: Option<String>,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Path to the account registry YAML file.
    pub accounts_path: PathBuf,
    /// Root directory for raw and processed output.
    pub output_dir: PathBuf,
    /// Base URL of the Research API.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum retry attempts for a failed request.
    pub max_retries: u32,
    /// Base delay for exponential backoff, in milliseconds.
    pub retry_backoff_base_ms: u64,
    /// Minimum spacing between successive API requests, in milliseconds.
    pub min_request_interval_ms: u64,
    /// Upper bound on pages fetched per account and retrieval.
    pub max_pages: usize,
    /// Records requested per page, capped at the API maximum of 100.
    pub page_size: u32,
    /// Number of accounts collected concurrently.
    pub max_concurrent_accounts: usize,
}

impl AppConfig {
    /// Returns the access token or an error naming the missing variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `TIKTOK_ACCESS_TOKEN`
    /// was not set.
    pub fn require_access_token(&self) -> Result<&str, ConfigError> {
        self.tiktok_access_token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("TIKTOK_ACCESS_TOKEN".to_string()))
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "tiktok_access_token",
                &self.tiktok_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("log_level", &self.log_level)
            .field("accounts_path", &self.accounts_path)
            .field("output_dir", &self.output_dir)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("min_request_interval_ms", &self.min_request_interval_ms)
            .field("max_pages", &self.max_pages)
            .field("page_size", &self.page_size)
            .field("max_concurrent_accounts", &self.max_concurrent_accounts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_token(token: Option<&str>) -> AppConfig {
        AppConfig {
            tiktok_access_token: token.map(str::to_string),
            log_level: "info".to_string(),
            accounts_path: PathBuf::from("./config/accounts.yaml"),
            output_dir: PathBuf::from("./data"),
            api_base_url: "https://open.tiktokapis.com".to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            retry_backoff_base_ms: 1000,
            min_request_interval_ms: 1000,
            max_pages: 100,
            page_size: 100,
            max_concurrent_accounts: 1,
        }
    }

    #[test]
    fn debug_redacts_access_token() {
        let config = config_with_token(Some("super-secret-token"));
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[redacted]"));
        assert!(!rendered.contains("super-secret-token"));
    }

    #[test]
    fn debug_shows_absent_token_as_none() {
        let config = config_with_token(None);
        let rendered = format!("{config:?}");
        assert!(rendered.contains("tiktok_access_token: None"));
    }

    #[test]
    fn require_access_token_returns_token_when_present() {
        let config = config_with_token(Some("tok"));
        assert_eq!(config.require_access_token().unwrap(), "tok");
    }

    #[test]
    fn require_access_token_errors_when_absent() {
        let config = config_with_token(None);
        let err = config.require_access_token().unwrap_err();
        assert!(matches!(err, crate::ConfigError::MissingEnvVar(ref var) if var == "TIKTOK_ACCESS_TOKEN"));
    }
}
