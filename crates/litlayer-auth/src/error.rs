//! Error types for delegation and signing

use litlayer_types::LitlayerError;

/// Errors that can occur while authorizing an agent or signing a request
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// HTTP request to the delegation registry failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Private key material is malformed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Producing a signature failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The registry refused to delegate to the agent
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Payload or registry response could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),
}

impl From<alloy_signer::Error> for AuthError {
    fn from(err: alloy_signer::Error) -> Self {
        Self::Signing(err.to_string())
    }
}

impl From<AuthError> for LitlayerError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Http(e) => LitlayerError::Transport(e.to_string()),
            AuthError::InvalidKey(msg) | AuthError::Signing(msg) => LitlayerError::Signing(msg),
            AuthError::Authorization(reason) => LitlayerError::Authorization { reason },
            AuthError::Serialization(e) => LitlayerError::from(e),
            AuthError::EnvVarNotSet(var) => {
                LitlayerError::Configuration(format!("environment variable {} not set", var))
            }
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
