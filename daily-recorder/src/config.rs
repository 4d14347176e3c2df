//! Configuration module for environment variable parsing.
//!
//! Configuration is read once at process start and never mutated afterwards.
//! Both binaries share it through an `Arc<Config>`.

use std::env;
use std::path::PathBuf;

use tracing::warn;
use url::Url;

use crate::error::ConfigError;
use crate::webhook::signature::is_signature_verification_enabled;

/// Default provider REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.daily.co/v1";

/// Default receiver port.
pub const DEFAULT_PORT: u16 = 3001;

/// Default event log location.
pub const DEFAULT_LOG_FILE: &str = "./recording_events.log";

/// Default CLI session file location.
pub const DEFAULT_SESSION_FILE: &str = "./.daily_session.json";

/// Default validity window for recording access links.
pub const DEFAULT_ACCESS_LINK_VALID_SECS: u64 = 3600;

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Provider API key, sent as a bearer token
    pub api_key: String,

    /// Provider REST base URL
    pub api_url: Url,

    /// Webhook signing secret; `None` means unauthenticated mode
    pub webhook_secret: Option<String>,

    /// Port for the webhook receiver to listen on
    pub port: u16,

    /// Append-only event log path
    pub log_file: PathBuf,

    /// Outbound HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Validity window requested for access links
    pub access_link_valid_secs: u64,

    /// Provider domain id, only needed for self-signed meeting tokens
    pub domain_id: Option<String>,

    /// CLI session file path
    pub session_file: PathBuf,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url.as_str())
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("port", &self.port)
            .field("log_file", &self.log_file)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("access_link_valid_secs", &self.access_link_valid_secs)
            .field("domain_id", &self.domain_id)
            .field("session_file", &self.session_file)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured if present. Fails
    /// when `DAILY_API_KEY` is missing or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let api_key = non_empty("DAILY_API_KEY").ok_or(ConfigError::Missing("DAILY_API_KEY"))?;

        let raw_url = env::var("DAILY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(raw_url.trim_end_matches('/')).map_err(|e| {
            ConfigError::Invalid {
                name: "DAILY_API_URL",
                reason: e.to_string(),
            }
        })?;

        Ok(Config {
            api_key,
            api_url,
            webhook_secret: non_empty("DAILY_WEBHOOK_SECRET"),
            port: parse_or("WEBHOOK_PORT", None)
                .or_else(|| parse_or("PORT", None))
                .unwrap_or(DEFAULT_PORT),
            log_file: non_empty("WEBHOOK_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", Some(10_000)).unwrap_or(10_000),
            access_link_valid_secs: parse_or(
                "ACCESS_LINK_VALID_SECS",
                Some(DEFAULT_ACCESS_LINK_VALID_SECS),
            )
            .unwrap_or(DEFAULT_ACCESS_LINK_VALID_SECS),
            domain_id: non_empty("DAILY_DOMAIN_ID"),
            session_file: non_empty("DAILY_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
        })
    }

    /// Build a configuration for the given key with every other field defaulted.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Config {
            api_key: api_key.into(),
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            webhook_secret: None,
            port: DEFAULT_PORT,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            request_timeout_ms: 10_000,
            access_link_valid_secs: DEFAULT_ACCESS_LINK_VALID_SECS,
            domain_id: None,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }

    /// Whether inbound webhooks are checked against a signing secret.
    pub fn verification_enabled(&self) -> bool {
        is_signature_verification_enabled(&self.webhook_secret)
    }
}

/// Read a variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a numeric variable, warning and falling back on garbage.
fn parse_or<T: std::str::FromStr>(name: &str, default: Option<T>) -> Option<T> {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(env_var = name, value = %raw, "invalid_numeric_value_using_default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_valid() {
        env::set_var("TEST_DAILY_PORT", "4000");
        let result: Option<u16> = parse_or("TEST_DAILY_PORT", Some(1));
        assert_eq!(result, Some(4000));
        env::remove_var("TEST_DAILY_PORT");
    }

    #[test]
    fn test_parse_or_garbage_uses_default() {
        env::set_var("TEST_DAILY_GARBAGE", "not-a-port");
        let result: Option<u16> = parse_or("TEST_DAILY_GARBAGE", Some(7));
        assert_eq!(result, Some(7));
        env::remove_var("TEST_DAILY_GARBAGE");
    }

    #[test]
    fn test_parse_or_missing() {
        let result: Option<u64> = parse_or("TEST_DAILY_NONEXISTENT", None);
        assert_eq!(result, None);
    }

    #[test]
    fn test_non_empty_treats_blank_as_unset() {
        env::set_var("TEST_DAILY_BLANK", "   ");
        assert_eq!(non_empty("TEST_DAILY_BLANK"), None);
        env::set_var("TEST_DAILY_BLANK", " value ");
        assert_eq!(non_empty("TEST_DAILY_BLANK"), Some("value".to_string()));
        env::remove_var("TEST_DAILY_BLANK");
    }

    #[test]
    fn test_with_api_key_defaults() {
        let config = Config::with_api_key("key");
        assert_eq!(config.port, 3001);
        assert_eq!(config.log_file, PathBuf::from("./recording_events.log"));
        assert_eq!(config.access_link_valid_secs, 3600);
        assert!(!config.verification_enabled());
    }

    #[test]
    fn test_verification_enabled_ignores_blank_secret() {
        let mut config = Config::with_api_key("key");

        config.webhook_secret = Some("   ".to_string());
        assert!(!config.verification_enabled());

        config.webhook_secret = Some("s3cret".to_string());
        assert!(config.verification_enabled());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = Config::with_api_key("super-secret-key");
        config.webhook_secret = Some("hmac-secret".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-key"));
        assert!(!rendered.contains("hmac-secret"));
    }
}
