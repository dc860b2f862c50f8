//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HOUSE_GATEWAY_URL` - Base URL of the hosted backend query API
//! - `HOUSE_GATEWAY_API_KEY` - API key for the backend (anon/service key)
//!
//! ## Optional
//! - `HOUSE_RATES_URL` - Exchange rate provider endpoint
//!   (default: the central bank JSON table)
//! - `HOUSE_RATES_REFRESH_SECS` - Rate freshness window in seconds
//!   (default: 1800, i.e. 30 minutes)
//! - `HOUSE_STORAGE_NAMESPACE` - Directory name for local persistence
//!   (default: `house`)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default exchange rate table: Central Bank of Uzbekistan, JSON.
pub const DEFAULT_RATES_URL: &str = "https://cbu.uz/uz/arkhiv-kursov-valyut/json/";

/// Default rate freshness window.
pub const DEFAULT_RATES_REFRESH: Duration = Duration::from_secs(30 * 60);

const MIN_API_KEY_LENGTH: usize = 20;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Client application configuration.
///
/// `SecretString` redacts the API key in `Debug` output.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the hosted backend query API
    pub gateway_url: Url,
    /// API key sent with every gateway request
    pub gateway_api_key: SecretString,
    /// Exchange rate provider endpoint
    pub rates_url: String,
    /// How long a fetched rate table is considered fresh
    pub rates_refresh: Duration,
    /// Directory name for file-backed local persistence
    pub storage_namespace: String,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails validation (placeholder detection, length).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let gateway_url = get_required_env("HOUSE_GATEWAY_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("HOUSE_GATEWAY_URL".to_string(), e.to_string())
            })?;
        let gateway_api_key = get_validated_secret("HOUSE_GATEWAY_API_KEY")?;

        let rates_url = get_env_or_default("HOUSE_RATES_URL", DEFAULT_RATES_URL);
        let rates_refresh = match get_optional_env("HOUSE_RATES_REFRESH_SECS") {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("HOUSE_RATES_REFRESH_SECS".to_string(), e.to_string())
            })?),
            None => DEFAULT_RATES_REFRESH,
        };
        let storage_namespace = get_env_or_default("HOUSE_STORAGE_NAMESPACE", "house");

        Ok(Self {
            gateway_url,
            gateway_api_key,
            rates_url,
            rates_refresh,
            storage_namespace,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a secret is not an obvious placeholder and has a plausible
/// length for an API key.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    if secret.len() < MIN_API_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_API_KEY_LENGTH} characters (got {})",
                secret.len()
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-goes-right-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_too_short() {
        let result = validate_secret_strength("abc123", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_debug_redacts_api_key() {
        let config = ClientConfig {
            gateway_url: "https://backend.house.dev".parse().unwrap(),
            gateway_api_key: SecretString::from("super_secret_api_key_value"),
            rates_url: DEFAULT_RATES_URL.to_string(),
            rates_refresh: DEFAULT_RATES_REFRESH,
            storage_namespace: "house".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("backend.house.dev"));
        assert!(!debug_output.contains("super_secret_api_key_value"));
    }
}
