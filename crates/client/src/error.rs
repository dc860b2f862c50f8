//! Unified error handling for the client state layer.
//!
//! Each subsystem has its own error enum (`GatewayError`, `RateError`,
//! `StorageError`, `ConfigError`); they converge into [`ClientError`] via
//! `#[from]`. Store methods return `Result<T, ClientError>` so callers have
//! one type to surface in the UI.

use thiserror::Error;

use crate::config::ConfigError;
use crate::currency::RateError;
use crate::gateway::GatewayError;
use crate::sync::StorageError;

/// Application-level error type for the client state layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Remote gateway operation failed. Local state has been rolled back.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Currency rate provider failed.
    #[error("Rate provider error: {0}")]
    Rates(#[from] RateError),

    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Quantity constraint violated (must be at least 1).
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::InvalidQuantity(0);
        assert_eq!(err.to_string(), "Invalid quantity: 0");
    }

    #[test]
    fn test_gateway_error_converts() {
        let err: ClientError = GatewayError::Unauthenticated.into();
        assert!(matches!(err, ClientError::Gateway(_)));
    }
}
