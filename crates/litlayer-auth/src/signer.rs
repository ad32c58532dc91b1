//! Per-request signing
//!
//! [`RequestSigner`] makes sure the agent is delegated (at most one registry
//! round-trip per process until [`RequestSigner::invalidate`] is called), then
//! produces a fresh nonce and an agent signature over `body ++ nonce`.

use alloy_primitives::Address;
use chrono::Utc;
use litlayer_types::{Chain, Environment, Platform};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::credentials::{AgentCredential, OwnerKey};
use crate::delegation::{AgentDelegation, DelegationStatus};
use crate::error::{AuthError, AuthResult};
use crate::typed_data;

/// Platform header
pub const HEADER_PLATFORM: &str = "X-Platform";
/// Chain id header
pub const HEADER_CHAIN_ID: &str = "X-Chain-EVM-Id";
/// Nonce header (millisecond timestamp)
pub const HEADER_NONCE: &str = "X-Nonce";
/// Agent signature header
pub const HEADER_SIGNATURE: &str = "X-Signature";

/// Headers for read-only calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadonlyHeaders {
    pub platform: Platform,
    pub chain: Chain,
}

impl ReadonlyHeaders {
    /// Header name/value pairs
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (HEADER_PLATFORM, self.platform.to_string()),
            (HEADER_CHAIN_ID, self.chain.to_string()),
        ]
    }
}

/// Headers for mutating calls. Built once per request, never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedHeaders {
    pub platform: Platform,
    pub chain: Chain,
    pub nonce: u64,
    pub signature: String,
}

impl AuthenticatedHeaders {
    /// Header name/value pairs
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (HEADER_PLATFORM, self.platform.to_string()),
            (HEADER_CHAIN_ID, self.chain.to_string()),
            (HEADER_NONCE, self.nonce.to_string()),
            (HEADER_SIGNATURE, self.signature.clone()),
        ]
    }
}

/// A serialized body and the headers that authenticate it
///
/// The body must be sent byte-for-byte as signed.
#[derive(Debug, Clone)]
pub struct SignedPayload {
    pub body: String,
    pub headers: AuthenticatedHeaders,
}

/// Signs outbound requests with the delegated agent key
pub struct RequestSigner {
    chain: Chain,
    platform: Platform,
    environment: Environment,
    owner: OwnerKey,
    agent: AgentCredential,
    delegation: AgentDelegation,
    /// Held across the registry round-trip so concurrent signs share one exchange
    status: Mutex<Option<DelegationStatus>>,
    last_nonce: AtomicU64,
}

impl RequestSigner {
    /// Create a signer for one (chain, platform, agent)
    pub fn new(
        chain: Chain,
        platform: Platform,
        environment: Environment,
        owner: OwnerKey,
        agent: AgentCredential,
        delegation: AgentDelegation,
    ) -> Self {
        Self {
            chain,
            platform,
            environment,
            owner,
            agent,
            delegation,
            status: Mutex::new(None),
            last_nonce: AtomicU64::new(0),
        }
    }

    /// Chain requests are signed for
    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Platform requests are signed for
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Environment bound into typed-data signatures
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Agent address
    pub fn agent_address(&self) -> Address {
        self.agent.address()
    }

    /// Owner address
    pub fn owner_address(&self) -> Address {
        self.owner.address()
    }

    /// Owner key, for session logins
    pub fn owner(&self) -> &OwnerKey {
        &self.owner
    }

    /// Headers for read-only calls
    pub fn readonly_headers(&self) -> ReadonlyHeaders {
        ReadonlyHeaders {
            platform: self.platform,
            chain: self.chain,
        }
    }

    /// Cached delegation status, if any
    pub async fn delegation_status(&self) -> Option<DelegationStatus> {
        self.status.lock().await.clone()
    }

    /// Forget the cached delegation; the next sign re-checks the registry
    pub async fn invalidate(&self) {
        let mut status = self.status.lock().await;
        if status.take().is_some() {
            debug!("Delegation cache invalidated");
        }
    }

    /// Make sure the agent is delegated, exchanging a fresh delegation if not
    #[instrument(skip(self), fields(agent = %self.agent.address()))]
    pub async fn ensure_authorized(&self) -> AuthResult<DelegationStatus> {
        let mut cached = self.status.lock().await;
        if let Some(status) = cached.as_ref() {
            if status.authorized && status.agent_address == self.agent.address() {
                return Ok(status.clone());
            }
        }

        let agent = self.agent.address();
        let authorized = self
            .delegation
            .is_authorized(self.chain, self.platform, agent)
            .await?;

        if !authorized {
            let expiry_time = typed_data::expiry_time();
            let signature = self.delegation.build_authorization_signature(
                &self.owner,
                self.chain,
                self.platform,
                self.environment,
                agent,
                expiry_time,
            )?;

            let accepted = self
                .delegation
                .authorize(
                    self.chain,
                    self.platform,
                    agent,
                    &signature,
                    expiry_time,
                    self.owner.address(),
                )
                .await?;

            if !accepted {
                warn!("Agent delegation rejected");
                return Err(AuthError::Authorization(format!(
                    "registry rejected delegation of agent {} for owner {}",
                    agent,
                    self.owner.address()
                )));
            }
            info!(expiry_time, "Agent delegated");
        }

        let status = DelegationStatus {
            agent_address: agent,
            authorized: true,
            last_checked_at: Utc::now(),
        };
        *cached = Some(status.clone());
        Ok(status)
    }

    /// Next nonce: the wall-clock millisecond, forced strictly increasing
    pub fn next_nonce(&self) -> u64 {
        let now = typed_data::unix_millis();
        let mut last = self.last_nonce.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self
                .last_nonce
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    /// Agent signature over `body` immediately followed by `nonce`
    pub fn sign_body(&self, body: &str, nonce: u64) -> AuthResult<String> {
        let message = format!("{}{}", body, nonce);
        self.agent.sign_message(message.as_bytes())
    }

    /// Authorize if needed, then sign `payload`
    pub async fn sign<T: Serialize + ?Sized>(&self, payload: &T) -> AuthResult<SignedPayload> {
        self.ensure_authorized().await?;

        let body = serde_json::to_string(payload)?;
        let nonce = self.next_nonce();
        let signature = self.sign_body(&body, nonce)?;

        Ok(SignedPayload {
            body,
            headers: AuthenticatedHeaders {
                platform: self.platform,
                chain: self.chain,
                nonce,
                signature,
            },
        })
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("chain", &self.chain)
            .field("platform", &self.platform)
            .field("environment", &self.environment)
            .field("agent", &self.agent.address())
            .field("owner", &self.owner.address())
            .finish()
    }
}
