//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPSYNC_API_BASE_URL` - Base URL of the shop backend (e.g.,
//!   `https://api.example.com`)
//!
//! ## Optional
//! - `SHOPSYNC_API_TOKEN` - Bearer token sent with every request
//! - `SHOPSYNC_API_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `SHOPSYNC_IDENTITY_PATH` - File the session persists the signed-in
//!   identity to (default: `.shopsync/identity.json`)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_IDENTITY_PATH: &str = ".shopsync/identity.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shop backend client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API.
    pub base_url: Url,
    /// Optional bearer token for authenticated deployments.
    pub api_token: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Where the session stores the signed-in identity.
    pub identity_path: PathBuf,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .field("identity_path", &self.identity_path)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL is missing or unparseable, or
    /// if the timeout is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url(&get_required_env("SHOPSYNC_API_BASE_URL")?)?;
        let api_token = get_optional_env("SHOPSYNC_API_TOKEN").map(SecretString::from);
        let timeout_secs = get_env_or_default(
            "SHOPSYNC_API_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("SHOPSYNC_API_TIMEOUT_SECS".to_owned(), e.to_string())
        })?;
        let identity_path =
            PathBuf::from(get_env_or_default("SHOPSYNC_IDENTITY_PATH", DEFAULT_IDENTITY_PATH));

        Ok(Self {
            base_url,
            api_token,
            timeout: Duration::from_secs(timeout_secs),
            identity_path,
        })
    }

    /// Build a config directly, for tests and embedding.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            identity_path: PathBuf::from(DEFAULT_IDENTITY_PATH),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and sanity-check the backend base URL.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("SHOPSYNC_API_BASE_URL".to_owned(), e.to_string())
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPSYNC_API_BASE_URL".to_owned(),
            format!("not a base URL: {raw}"),
        ));
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_accepts_https() {
        let url = parse_base_url("https://api.example.com").expect("valid url");
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_config_new_defaults() {
        let config = ClientConfig::new("http://localhost:5000").expect("valid config");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.api_token.is_none());
        assert_eq!(
            config.identity_path,
            PathBuf::from(DEFAULT_IDENTITY_PATH)
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = ClientConfig::new("http://localhost:5000").expect("valid config");
        config.api_token = Some(SecretString::from("super-secret-token"));
        let output = format!("{config:?}");
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("super-secret-token"));
    }
}
