//! Error types for REST API operations

use litlayer_auth::AuthError;
use litlayer_types::LitlayerError;

/// Errors that can occur during REST API operations
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("HTTP status {status}: {message}")]
    Status {
        /// Status code
        status: u16,
        /// Canonical reason for the status
        message: String,
    },

    /// API answered `success: false`
    #[error("API error {code}: {message}")]
    Api {
        /// Exchange error code
        code: i64,
        /// Error message from the API
        message: String,
    },

    /// Delegating or signing failed; the request was not sent
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl RestError {
    /// Error for a non-2xx status
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// True when the agent delegation should be re-checked before the next call
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 401 || *status == 403,
            Self::Auth(AuthError::Authorization(_)) => true,
            _ => false,
        }
    }
}

impl From<RestError> for LitlayerError {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Http(e) => LitlayerError::Transport(e.to_string()),
            RestError::Status { status, message } if status == 401 || status == 403 => {
                LitlayerError::authorization(format!("HTTP {}: {}", status, message))
            }
            RestError::Status { status, message } => {
                LitlayerError::Transport(format!("HTTP {}: {}", status, message))
            }
            RestError::Api { code, message } => LitlayerError::api(code, message),
            RestError::Auth(e) => e.into(),
            RestError::Parse(message) => LitlayerError::ProtocolDecode { message, raw: None },
            RestError::InvalidParameter(message) => {
                LitlayerError::invalid_parameter("request", message)
            }
        }
    }
}

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let err = RestError::from_status(reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.is_retryable());
        assert!(!err.is_unauthorized());
        assert!(err.to_string().contains("503"));

        let err = RestError::from_status(reqwest::StatusCode::UNAUTHORIZED);
        assert!(!err.is_retryable());
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_api_error_is_final() {
        let err = RestError::Api {
            code: 1001,
            message: "insufficient margin".into(),
        };
        assert!(!err.is_retryable());

        let sdk: LitlayerError = err.into();
        assert!(matches!(sdk, LitlayerError::Api { code: 1001, .. }));
    }

    #[test]
    fn test_rejected_delegation_requires_reauth() {
        let err: RestError = AuthError::Authorization("rejected".into()).into();
        assert!(err.is_unauthorized());

        let sdk: LitlayerError = err.into();
        assert!(sdk.requires_reauth());
    }
}
