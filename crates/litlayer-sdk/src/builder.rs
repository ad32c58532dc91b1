//! Client Builder Pattern
//!
//! Collects everything a [`LitlayerClient`] needs (deployment, keys, URLs,
//! reconnect policy, hooks) and wires the REST client and both streams
//! from it.
//!
//! # Example
//!
//! ```
//! use litlayer_sdk::builder::LitlayerClientBuilder;
//! use litlayer_types::Environment;
//! use std::time::Duration;
//!
//! let builder = LitlayerClientBuilder::new()
//!     .with_environment(Environment::Mainnet)
//!     .with_timeout(Duration::from_secs(5));
//! assert!(builder.validate().is_ok());
//! ```

use crate::client::LitlayerClient;
use litlayer_auth::{
    AgentCredential, AgentDelegation, AuthError, HttpDelegationRegistry, OwnerKey, RequestSigner,
};
use litlayer_rest::{ClientConfig, LitlayerRestClient, RestError};
use litlayer_types::{Chain, Endpoint, Environment, Platform};
use litlayer_ws::{
    ConnectionConfig, Hooks, MakerSession, ReconnectConfig, SessionLogin, StreamConnection,
    UserStream,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// URL has the wrong scheme
    #[error("invalid {kind} URL: {url}")]
    InvalidUrl { kind: &'static str, url: String },

    /// Timeout too short
    #[error("connection timeout must be at least 1 second")]
    TimeoutTooShort,

    /// Key material missing or malformed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// HTTP client could not be created
    #[error(transparent)]
    Rest(#[from] RestError),
}

/// Builder for configuring a LitLayer client
#[derive(Debug, Clone)]
pub struct LitlayerClientBuilder {
    /// Deployment; also picks the default chain and URLs
    pub environment: Environment,

    /// Chain override
    pub chain: Option<Chain>,

    /// Trading platform
    pub platform: Platform,

    /// Owner private key; read from `LITLAYER_PRIVATE_KEY` when unset
    pub owner_key: Option<SecretString>,

    /// Agent private key; read from `LITLAYER_AGENT_KEY` or generated when unset
    pub agent_key: Option<SecretString>,

    /// WebSocket URL override
    pub ws_url: Option<String>,

    /// REST base URL override
    pub rest_url: Option<String>,

    /// Enable automatic reconnection
    pub reconnect: bool,

    /// Reconnection configuration
    pub reconnect_config: ReconnectConfig,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// REST request timeout in seconds
    pub request_timeout_secs: u64,

    /// Lifecycle hooks shared by both streams
    pub hooks: Hooks,
}

impl Default for LitlayerClientBuilder {
    fn default() -> Self {
        Self {
            environment: Environment::Testnet,
            chain: None,
            platform: Platform::Stella,
            owner_key: None,
            agent_key: None,
            ws_url: None,
            rest_url: None,
            reconnect: true,
            reconnect_config: ReconnectConfig::default(),
            connect_timeout: Duration::from_secs(10),
            request_timeout_secs: 30,
            hooks: Hooks::default(),
        }
    }
}

impl LitlayerClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deployment environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Override the chain
    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Set the platform
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Owner private key (hex, with or without `0x`)
    pub fn with_owner_key(mut self, key: SecretString) -> Self {
        self.owner_key = Some(key);
        self
    }

    /// Reuse an existing agent key instead of generating one
    pub fn with_agent_key(mut self, key: SecretString) -> Self {
        self.agent_key = Some(key);
        self
    }

    /// Override the WebSocket URL
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    /// Override the REST base URL
    pub fn with_rest_url(mut self, url: impl Into<String>) -> Self {
        self.rest_url = Some(url.into());
        self
    }

    /// Set the reconnection configuration
    pub fn with_reconnect_config(mut self, config: ReconnectConfig) -> Self {
        self.reconnect = true;
        self.reconnect_config = config;
        self
    }

    /// Disable automatic reconnection
    pub fn without_reconnect(mut self) -> Self {
        self.reconnect = false;
        self
    }

    /// Set the connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the REST request timeout
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Install lifecycle hooks
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Chain in effect: the override, else the environment's chain
    pub fn effective_chain(&self) -> Chain {
        self.chain.unwrap_or(match self.environment {
            Environment::Testnet => Chain::BeraBepolia,
            Environment::Mainnet => Chain::BeraMainnet,
        })
    }

    /// WebSocket URL in effect
    pub fn effective_ws_url(&self) -> String {
        self.ws_url
            .clone()
            .unwrap_or_else(|| Endpoint::from(self.environment).ws_url().to_string())
    }

    /// REST base URL in effect
    pub fn effective_rest_url(&self) -> String {
        self.rest_url
            .clone()
            .unwrap_or_else(|| Endpoint::from(self.environment).rest_url().to_string())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ws_url = self.effective_ws_url();
        if !(ws_url.starts_with("ws://") || ws_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl { kind: "WebSocket", url: ws_url });
        }

        let rest_url = self.effective_rest_url();
        if !(rest_url.starts_with("http://") || rest_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl { kind: "REST", url: rest_url });
        }

        if self.connect_timeout < Duration::from_secs(1) {
            return Err(ConfigError::TimeoutTooShort);
        }

        Ok(())
    }

    /// Convert to connection config
    pub fn to_connection_config(&self) -> ConnectionConfig {
        let config = ConnectionConfig::new(self.effective_ws_url()).with_timeout(self.connect_timeout);

        if self.reconnect {
            config.with_reconnect(self.reconnect_config.clone())
        } else {
            config.without_reconnect()
        }
    }

    /// Validate, load keys and wire the client
    ///
    /// Nothing connects yet; call [`LitlayerClient::connect`] or the
    /// per-stream `connect` when ready.
    pub fn build(self) -> Result<LitlayerClient, ConfigError> {
        self.validate()?;

        let owner = match &self.owner_key {
            Some(key) => OwnerKey::from_private_key(key)?,
            None => OwnerKey::from_env()?,
        };
        let agent = match &self.agent_key {
            Some(key) => AgentCredential::from_private_key(key.expose_secret())?,
            None => AgentCredential::from_env()?.unwrap_or_else(AgentCredential::generate),
        };

        let chain = self.effective_chain();
        let rest_url = self.effective_rest_url();

        let registry = HttpDelegationRegistry::new(rest_url.clone())?;
        let signer = Arc::new(RequestSigner::new(
            chain,
            self.platform,
            self.environment,
            owner.clone(),
            agent,
            AgentDelegation::new(Arc::new(registry)),
        ));

        let rest = LitlayerRestClient::with_config(
            ClientConfig::new()
                .with_base_url(rest_url)
                .with_timeout(self.request_timeout_secs),
            signer.clone(),
        )?;

        let ws_config = self.to_connection_config();
        let user = UserStream::from_connection(
            StreamConnection::builder(ws_config.clone())
                .hooks(self.hooks.clone())
                .build(),
        );
        user.set_account_address(owner.address().to_string());

        let login = SessionLogin::new(owner, chain, self.platform, self.environment);
        let maker = MakerSession::with_hooks(ws_config, login, self.hooks);

        info!(
            %chain,
            platform = %self.platform,
            environment = %self.environment,
            agent = %signer.agent_address(),
            "Built LitLayer client"
        );

        Ok(LitlayerClient::from_parts(signer, rest, user, maker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    #[test]
    fn test_builder_fluent_api() {
        let builder = LitlayerClientBuilder::new()
            .with_environment(Environment::Mainnet)
            .with_timeout(Duration::from_secs(5))
            .without_reconnect();

        assert_eq!(builder.effective_chain(), Chain::BeraMainnet);
        assert_eq!(builder.effective_ws_url(), "wss://v2.stellaxyz.io/v1/ws");
        assert_eq!(builder.effective_rest_url(), "https://v2.stellaxyz.io");
        assert!(!builder.to_connection_config().reconnect.is_enabled());
        assert!(builder.validate().is_ok());
    }

    #[test]
    fn test_overrides_win() {
        let builder = LitlayerClientBuilder::new()
            .with_chain(Chain::BeraMainnet)
            .with_ws_url("ws://localhost:9000/v1/ws")
            .with_rest_url("http://localhost:9000");

        assert_eq!(builder.effective_chain(), Chain::BeraMainnet);
        assert_eq!(builder.to_connection_config().url, "ws://localhost:9000/v1/ws");
    }

    #[test]
    fn test_builder_validation() {
        assert!(matches!(
            LitlayerClientBuilder::new().with_ws_url("https://nope").validate(),
            Err(ConfigError::InvalidUrl { kind: "WebSocket", .. })
        ));
        assert!(matches!(
            LitlayerClientBuilder::new().with_rest_url("ftp://nope").validate(),
            Err(ConfigError::InvalidUrl { kind: "REST", .. })
        ));
        assert!(matches!(
            LitlayerClientBuilder::new()
                .with_timeout(Duration::from_millis(100))
                .validate(),
            Err(ConfigError::TimeoutTooShort)
        ));
    }

    #[test]
    fn test_bad_owner_key() {
        let err = LitlayerClientBuilder::new()
            .with_owner_key(SecretString::from("0x1234".to_string()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Auth(AuthError::InvalidKey(_))));
    }

    #[test]
    fn test_build_wires_everything() {
        let client = LitlayerClientBuilder::new()
            .with_owner_key(SecretString::from(OWNER_KEY.to_string()))
            .build()
            .unwrap();

        assert_eq!(
            client.user_stream().account_address(),
            Some(client.owner_address().to_string())
        );
        assert_ne!(client.agent_address(), client.owner_address());
        assert_eq!(client.rest().base_url(), "https://testnet.v2.stellaxyz.io");
        assert_eq!(client.signer().chain(), Chain::BeraBepolia);
    }
}
