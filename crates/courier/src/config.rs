//! Courier configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional:
//! - `RESTO_GATEWAY_URL` - API Gateway base URL (default: `http://localhost:8000`)
//! - `RESTO_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 5)
//! - `RESTO_STATE_FILE` - Local key-value store path (default: `.resto/state.json`)
//! - `RESTO_CREATE_ATTEMPTS` - Agent creation attempts on transient errors (default: 3)
//! - `RESTO_CREATE_BACKOFF_MS` - Fixed delay between creation attempts (default: 1000)
//! - `RESTO_CONFLICT_STRATEGY` - `adopt` or `replace` (default: `adopt`)
//! - `RESTO_VEHICLE` - Vehicle recorded for new agents (default: `Scooter`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::provisioning::{Backoff, ConflictStrategy, RetryPolicy};

const DEFAULT_GATEWAY_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_STATE_FILE: &str = ".resto/state.json";
const DEFAULT_CREATE_ATTEMPTS: u32 = 3;
const DEFAULT_CREATE_BACKOFF_MS: u64 = 1000;
const DEFAULT_VEHICLE: &str = "Scooter";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Courier configuration.
#[derive(Debug, Clone)]
pub struct CourierConfig {
    /// API Gateway connection settings
    pub gateway: GatewayConfig,
    /// Agent provisioning behaviour
    pub provisioning: ProvisioningConfig,
    /// Path of the durable key-value store
    pub state_file: PathBuf,
}

/// API Gateway connection settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL every service path is appended to
    pub base_url: Url,
    /// Timeout applied to each request
    pub timeout: Duration,
}

/// Agent provisioning settings.
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    /// Retry policy for agent creation
    pub retry: RetryPolicy,
    /// How a 409 on creation is resolved
    pub conflict_strategy: ConflictStrategy,
    /// Vehicle recorded on new agents
    pub vehicle: String,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::new(
                DEFAULT_CREATE_ATTEMPTS,
                Backoff::Fixed(Duration::from_millis(DEFAULT_CREATE_BACKOFF_MS)),
            ),
            conflict_strategy: ConflictStrategy::default(),
            vehicle: DEFAULT_VEHICLE.to_string(),
        }
    }
}

impl CourierConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a malformed value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            gateway: GatewayConfig::from_env()?,
            provisioning: ProvisioningConfig::from_env()?,
            state_file: PathBuf::from(get_env_or_default("RESTO_STATE_FILE", DEFAULT_STATE_FILE)),
        })
    }
}

impl GatewayConfig {
    /// Settings for `base_url` with the default request timeout.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_gateway_url(&get_env_or_default(
            "RESTO_GATEWAY_URL",
            DEFAULT_GATEWAY_URL,
        ))?;
        let timeout_secs = parse_env::<u64>("RESTO_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "RESTO_HTTP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl ProvisioningConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let attempts = parse_env::<u32>("RESTO_CREATE_ATTEMPTS", DEFAULT_CREATE_ATTEMPTS)?;
        if attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "RESTO_CREATE_ATTEMPTS".to_string(),
                "at least one attempt is required".to_string(),
            ));
        }
        let backoff_ms = parse_env::<u64>("RESTO_CREATE_BACKOFF_MS", DEFAULT_CREATE_BACKOFF_MS)?;
        let conflict_strategy = get_optional_env("RESTO_CONFLICT_STRATEGY")
            .map(|raw| {
                raw.parse::<ConflictStrategy>().map_err(|e| {
                    ConfigError::InvalidEnvVar("RESTO_CONFLICT_STRATEGY".to_string(), e)
                })
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            retry: RetryPolicy::new(attempts, Backoff::Fixed(Duration::from_millis(backoff_ms))),
            conflict_strategy,
            vehicle: get_env_or_default("RESTO_VEHICLE", DEFAULT_VEHICLE),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate the gateway URL: absolute, http(s), no query or fragment.
fn parse_gateway_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("RESTO_GATEWAY_URL".to_string(), reason);

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment".to_string()));
    }
    Ok(url)
}

/// Parse an optional environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gateway_url_accepts_http() {
        let url = parse_gateway_url("http://gateway:8000").unwrap();
        assert_eq!(url.host_str(), Some("gateway"));
        assert_eq!(url.port(), Some(8000));
    }

    #[test]
    fn test_parse_gateway_url_rejects_garbage() {
        assert!(parse_gateway_url("not a url").is_err());
        assert!(parse_gateway_url("ftp://gateway").is_err());
        assert!(parse_gateway_url("http://gateway/?debug=1").is_err());
    }

    #[test]
    fn test_defaults() {
        let gateway = GatewayConfig::new(parse_gateway_url(DEFAULT_GATEWAY_URL).unwrap());
        assert_eq!(gateway.base_url.as_str(), "http://localhost:8000/");
        assert_eq!(gateway.timeout, Duration::from_secs(5));

        let provisioning = ProvisioningConfig::default();
        assert_eq!(provisioning.retry.max_attempts(), 3);
        assert_eq!(provisioning.conflict_strategy, ConflictStrategy::Adopt);
        assert_eq!(provisioning.vehicle, "Scooter");
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value = parse_env::<u32>("RESTO_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
