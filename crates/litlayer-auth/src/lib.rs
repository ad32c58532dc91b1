//! Agent delegation and request signing for the LitLayer API
//!
//! The owner key never signs routine traffic. Instead it signs, once, an
//! EIP-712 `Agent` assertion that delegates to an ephemeral agent key; the
//! agent then signs every mutating request.
//!
//! # Example
//!
//! ```no_run
//! use litlayer_auth::{
//!     AgentCredential, AgentDelegation, HttpDelegationRegistry, OwnerKey, RequestSigner,
//! };
//! use litlayer_types::{Chain, Environment, Platform};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load the owner key from LITLAYER_PRIVATE_KEY
//!     let owner = OwnerKey::from_env()?;
//!     let registry = HttpDelegationRegistry::new("https://testnet.v2.stellaxyz.io")?;
//!
//!     let signer = RequestSigner::new(
//!         Chain::BeraBepolia,
//!         Platform::Stella,
//!         Environment::Testnet,
//!         owner,
//!         AgentCredential::generate(),
//!         AgentDelegation::new(Arc::new(registry)),
//!     );
//!
//!     // First call delegates the agent, later calls only sign
//!     let signed = signer.sign(&serde_json::json!({"symbol": "ETH"})).await?;
//!     println!("nonce {} signature {}", signed.headers.nonce, signed.headers.signature);
//!
//!     Ok(())
//! }
//! ```

mod credentials;
mod delegation;
mod error;
mod signer;
pub mod typed_data;

pub use credentials::{AgentCredential, OwnerKey, AGENT_KEY_ENV, OWNER_KEY_ENV};
pub use delegation::{
    AgentCheck, AgentDelegation, AgentExchange, DelegationRegistry, DelegationStatus,
    HttpDelegationRegistry,
};
pub use error::{AuthError, AuthResult};
pub use signer::{
    AuthenticatedHeaders, ReadonlyHeaders, RequestSigner, SignedPayload, HEADER_CHAIN_ID,
    HEADER_NONCE, HEADER_PLATFORM, HEADER_SIGNATURE,
};

// Re-exported so callers can name addresses and secrets without extra dependencies
pub use alloy_primitives::Address;
pub use secrecy::SecretString;
