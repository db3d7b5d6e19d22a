//! Error types for the alias engine
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for alias engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the alias engine
#[derive(Error, Debug)]
pub enum Error {
    /// Seed address does not follow the provider's addressing convention
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// No alias is left in the pool for the given service
    #[error("No unused alias left for service '{service}'")]
    PoolExhausted {
        /// Normalized service name
        service: String,
    },

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operator is not allowed to use the engine
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Assignment document could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid address error
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create a pool exhaustion error for a service
    pub fn pool_exhausted(service: impl Into<String>) -> Self {
        Self::PoolExhausted {
            service: service.into(),
        }
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &serde_json::Value) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(raw: &str) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(raw)?)
    }

    #[test]
    fn test_serde_json_errors_convert_with_question_mark() {
        assert_eq!(encode(&serde_json::json!({ "a": 1 })).unwrap(), r#"{"a":1}"#);

        let err = decode("{ torn").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.to_string().starts_with("JSON error: "));
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(
            Error::pool_exhausted("groq"),
            Error::PoolExhausted { service } if service == "groq"
        ));
        assert_eq!(
            Error::state_store("disk full").to_string(),
            "State store error: disk full"
        );
        assert!(matches!(Error::unauthorized("nope"), Error::Unauthorized(_)));
    }
}
