//! Agent delegation protocol
//!
//! An agent key may only sign for the owner once the delegation registry has
//! accepted an owner-signed `Agent` typed-data assertion. The registry is an
//! external collaborator reached through [`DelegationRegistry`];
//! [`HttpDelegationRegistry`] talks to the exchange's `/v1/check-agent` and
//! `/v1/exchange` endpoints.

use alloy_primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use litlayer_types::{Chain, Environment, Platform};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::credentials::OwnerKey;
use crate::error::AuthResult;
use crate::typed_data;

/// Body of a check-agent call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentCheck {
    pub chain_id: Chain,
    pub platform: Platform,
    pub proxy_address: String,
}

/// Body of an exchange (authorize) call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentExchange {
    pub chain_id: Chain,
    pub platform: Platform,
    pub proxy_address: String,
    pub signature: String,
    /// Unix seconds
    pub expiry_time: u64,
    pub account_address: String,
}

/// Delegation registry collaborator
#[async_trait]
pub trait DelegationRegistry: Send + Sync {
    /// Is `check.proxy_address` currently authorized?
    async fn check_agent(&self, check: &AgentCheck) -> AuthResult<bool>;

    /// Submit a delegation assertion; `Ok(false)` means the registry rejected it
    async fn exchange_agent(&self, exchange: &AgentExchange) -> AuthResult<bool>;
}

#[derive(Debug, Deserialize)]
struct RegistryResponse {
    success: bool,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
}

/// Registry reached over the exchange's REST API
#[derive(Debug, Clone)]
pub struct HttpDelegationRegistry {
    client: Client,
    base_url: String,
}

impl HttpDelegationRegistry {
    /// Create a registry client for `base_url`
    pub fn new(base_url: impl Into<String>) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("litlayer-auth/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AuthResult<RegistryResponse> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await?;

        // A `{success: false}` body answers the call whatever the status
        let status_error = response.error_for_status_ref().err();
        let text = response.text().await?;
        match serde_json::from_str::<RegistryResponse>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(e) => match status_error {
                Some(status_error) => Err(status_error.into()),
                None => Err(e.into()),
            },
        }
    }
}

#[async_trait]
impl DelegationRegistry for HttpDelegationRegistry {
    #[instrument(skip(self), fields(agent = %check.proxy_address))]
    async fn check_agent(&self, check: &AgentCheck) -> AuthResult<bool> {
        let response = self.post("/v1/check-agent", check).await?;
        debug!(success = response.success, "check-agent answered");
        Ok(response.success)
    }

    #[instrument(skip(self, exchange), fields(agent = %exchange.proxy_address))]
    async fn exchange_agent(&self, exchange: &AgentExchange) -> AuthResult<bool> {
        let response = self.post("/v1/exchange", exchange).await?;
        if !response.success {
            warn!(
                code = ?response.code,
                msg = response.msg.as_deref().unwrap_or(""),
                "Registry rejected agent exchange"
            );
        }
        Ok(response.success)
    }
}

/// Cached answer to "is this agent authorized?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationStatus {
    pub agent_address: Address,
    pub authorized: bool,
    pub last_checked_at: DateTime<Utc>,
}

/// The delegation protocol itself; holds no cache
#[derive(Clone)]
pub struct AgentDelegation {
    registry: Arc<dyn DelegationRegistry>,
}

impl AgentDelegation {
    /// Create the protocol over a registry
    pub fn new(registry: Arc<dyn DelegationRegistry>) -> Self {
        Self { registry }
    }

    /// Read-only registry check
    pub async fn is_authorized(
        &self,
        chain: Chain,
        platform: Platform,
        agent: Address,
    ) -> AuthResult<bool> {
        let check = AgentCheck {
            chain_id: chain,
            platform,
            proxy_address: agent.to_string(),
        };
        self.registry.check_agent(&check).await
    }

    /// Submit an owner-signed delegation. Never retried.
    pub async fn authorize(
        &self,
        chain: Chain,
        platform: Platform,
        agent: Address,
        signature: &str,
        expiry_time: u64,
        owner: Address,
    ) -> AuthResult<bool> {
        let exchange = AgentExchange {
            chain_id: chain,
            platform,
            proxy_address: agent.to_string(),
            signature: signature.to_string(),
            expiry_time,
            account_address: owner.to_string(),
        };
        self.registry.exchange_agent(&exchange).await
    }

    /// Owner EIP-712 signature over the `Agent` delegation message
    pub fn build_authorization_signature(
        &self,
        owner: &OwnerKey,
        chain: Chain,
        platform: Platform,
        environment: Environment,
        agent: Address,
        expiry_time: u64,
    ) -> AuthResult<String> {
        let message = typed_data::agent_message(environment, agent, platform, expiry_time);
        owner.sign_typed(&message, &typed_data::domain(chain))
    }
}

impl std::fmt::Debug for AgentDelegation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDelegation").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_body_wire_form() {
        let exchange = AgentExchange {
            chain_id: Chain::BeraBepolia,
            platform: Platform::Stella,
            proxy_address: "0xagent".into(),
            signature: "0xsig".into(),
            expiry_time: 1_700_086_400,
            account_address: "0xowner".into(),
        };
        let value = serde_json::to_value(&exchange).unwrap();
        assert_eq!(value["chain_id"], 80069);
        assert_eq!(value["platform"], "stella");
        assert_eq!(value["proxy_address"], "0xagent");
        assert_eq!(value["expiry_time"], 1_700_086_400u64);
        assert_eq!(value["account_address"], "0xowner");
    }

    #[test]
    fn test_registry_base_url_trimmed() {
        let registry = HttpDelegationRegistry::with_client(Client::new(), "https://api.test/");
        assert_eq!(registry.base_url, "https://api.test");
    }
}
