//! Error types for the LitLayer SDK

use std::time::Duration;
use thiserror::Error;

/// Main error type for LitLayer SDK operations
#[derive(Error, Debug, Clone)]
pub enum LitlayerError {
    // === Connection Errors ===
    /// Socket or network failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Connection attempt timed out
    #[error("Connection timeout after {timeout:?} to {url}")]
    ConnectionTimeout { url: String, timeout: Duration },

    // === Protocol Errors ===
    /// Inbound frame could not be decoded
    #[error("Protocol decode error: {message}")]
    ProtocolDecode { message: String, raw: Option<String> },

    // === Authentication Errors ===
    /// Agent delegation or session login failed
    #[error("Authorization failed: {reason}")]
    Authorization { reason: String },

    /// Producing a signature failed (missing or invalid key material)
    #[error("Signing failed: {0}")]
    Signing(String),

    // === API Errors ===
    /// Remote call answered with `success: false`
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    // === Caller Errors ===
    /// Invalid request parameter
    #[error("Invalid parameter {field}: {message}")]
    InvalidParameter { field: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LitlayerError {
    /// Returns true if this error is potentially recoverable via retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ConnectionTimeout { .. })
    }

    /// Returns true if this error requires reconnection
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ConnectionTimeout { .. })
    }

    /// Returns true if the agent or session must be re-authorized
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::Authorization { .. })
    }

    /// Create a decode error, keeping the raw frame for diagnostics
    pub fn decode(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::ProtocolDecode {
            message: message.into(),
            raw: Some(raw.into()),
        }
    }

    /// Create an authorization error
    pub fn authorization(reason: impl Into<String>) -> Self {
        Self::Authorization {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an API error from a remote failure envelope
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for LitlayerError {
    fn from(err: serde_json::Error) -> Self {
        Self::ProtocolDecode {
            message: err.to_string(),
            raw: None,
        }
    }
}

/// Result type alias for LitLayer operations
pub type LitlayerResult<T> = Result<T, LitlayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(LitlayerError::Transport("reset".into()).is_retryable());
        assert!(LitlayerError::Transport("reset".into()).requires_reconnect());
        assert!(!LitlayerError::api(1001, "bad").is_retryable());
        assert!(LitlayerError::authorization("rejected").requires_reauth());
    }

    #[test]
    fn test_api_error_keeps_code_and_message() {
        let err = LitlayerError::api(4001, "insufficient margin");
        assert_eq!(err.to_string(), "API error 4001: insufficient margin");
        match err {
            LitlayerError::Api { code, message } => {
                assert_eq!(code, 4001);
                assert_eq!(message, "insufficient margin");
            }
            _ => panic!("expected Api variant"),
        }
    }

    #[test]
    fn test_decode_error_from_serde() {
        let err: LitlayerError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, LitlayerError::ProtocolDecode { raw: None, .. }));
    }
}
