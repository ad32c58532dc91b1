//! Owner and agent keys
//!
//! The owner key is the long-lived account key. It only ever signs EIP-712
//! typed data: the agent delegation and the maker session login. Routine
//! requests are signed by an ephemeral agent key (EIP-191 personal message)
//! that the owner has delegated to.
//!
//! # Security
//!
//! Keys read from the environment pass through `secrecy::SecretString`, which
//! zeroizes the hex string on drop. `Debug` output never contains key bytes.

use alloy_primitives::{keccak256, Address, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{Eip712Domain, SolStruct};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::error::{AuthError, AuthResult};

/// Environment variable holding the owner private key
pub const OWNER_KEY_ENV: &str = "LITLAYER_PRIVATE_KEY";

/// Environment variable holding an optional pre-delegated agent key
pub const AGENT_KEY_ENV: &str = "LITLAYER_AGENT_KEY";

fn signer_from_hex(key: &str) -> AuthResult<PrivateKeySigner> {
    let stripped = key.trim().trim_start_matches("0x");
    let bytes = hex::decode(stripped)
        .map_err(|e| AuthError::InvalidKey(format!("Invalid hex private key: {}", e)))?;
    PrivateKeySigner::from_slice(&bytes).map_err(|e| AuthError::InvalidKey(e.to_string()))
}

fn read_env_key(var: &str) -> AuthResult<SecretString> {
    std::env::var(var)
        .map(SecretString::from)
        .map_err(|_| AuthError::EnvVarNotSet(var.to_string()))
}

pub(crate) fn encode_signature(bytes: [u8; 65]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Ephemeral delegate key signing routine requests
#[derive(Clone)]
pub struct AgentCredential {
    signer: PrivateKeySigner,
}

impl AgentCredential {
    /// Generate a fresh agent key
    ///
    /// 32 random bytes are hashed with keccak-256 and the digest is used as
    /// the secp256k1 secret.
    pub fn generate() -> Self {
        loop {
            let seed: [u8; 32] = rand::random();
            // A digest outside the curve order is astronomically unlikely; draw again.
            if let Ok(signer) = PrivateKeySigner::from_bytes(&keccak256(seed)) {
                return Self { signer };
            }
        }
    }

    /// Use an existing agent key (hex, with or without `0x`)
    pub fn from_private_key(key: &str) -> AuthResult<Self> {
        Ok(Self {
            signer: signer_from_hex(key)?,
        })
    }

    /// Load the agent key from `LITLAYER_AGENT_KEY` if it is set
    pub fn from_env() -> AuthResult<Option<Self>> {
        match read_env_key(AGENT_KEY_ENV) {
            Ok(secret) => Self::from_private_key(secret.expose_secret()).map(Some),
            Err(AuthError::EnvVarNotSet(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Public address of the agent
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-191 personal signature over `message`, `0x`-prefixed hex
    pub fn sign_message(&self, message: &[u8]) -> AuthResult<String> {
        let signature = self.signer.sign_message_sync(message)?;
        Ok(encode_signature(signature.as_bytes()))
    }
}

impl fmt::Debug for AgentCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentCredential")
            .field("address", &self.address())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Long-lived account key whose authority is delegated
#[derive(Clone)]
pub struct OwnerKey {
    signer: PrivateKeySigner,
}

impl OwnerKey {
    /// Create an owner key from a hex private key
    pub fn from_private_key(key: &SecretString) -> AuthResult<Self> {
        Ok(Self {
            signer: signer_from_hex(key.expose_secret())?,
        })
    }

    /// Load the owner key from `LITLAYER_PRIVATE_KEY`
    pub fn from_env() -> AuthResult<Self> {
        let secret = read_env_key(OWNER_KEY_ENV)?;
        Self::from_private_key(&secret)
    }

    /// Account address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-712 signature over a typed struct, `0x`-prefixed hex
    pub fn sign_typed<T: SolStruct>(&self, message: &T, domain: &Eip712Domain) -> AuthResult<String> {
        let hash: B256 = message.eip712_signing_hash(domain);
        let signature = self.signer.sign_hash_sync(&hash)?;
        Ok(encode_signature(signature.as_bytes()))
    }
}

impl fmt::Debug for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerKey")
            .field("address", &self.address())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed_data;
    use litlayer_types::{Chain, Environment, Platform};

    // Well-known development key (anvil account #0)
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn owner() -> OwnerKey {
        OwnerKey::from_private_key(&SecretString::from(DEV_KEY.to_string())).unwrap()
    }

    #[test]
    fn test_generated_agents_are_distinct() {
        let a = AgentCredential::generate();
        let b = AgentCredential::generate();
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_key_parsing_accepts_optional_prefix() {
        let with = AgentCredential::from_private_key(DEV_KEY).unwrap();
        let without = AgentCredential::from_private_key(&DEV_KEY[2..]).unwrap();
        assert_eq!(with.address(), without.address());
        assert_eq!(with.address().to_string(), DEV_ADDRESS);
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(matches!(
            AgentCredential::from_private_key("0xnothex"),
            Err(AuthError::InvalidKey(_))
        ));
        assert!(matches!(
            AgentCredential::from_private_key("0x1234"),
            Err(AuthError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_agent_message_signature_recovers_agent() {
        let agent = AgentCredential::generate();
        let message = br#"{"symbol":"ETH"}1700000000000"#;

        let encoded = agent.sign_message(message).unwrap();
        assert!(encoded.starts_with("0x"));
        assert_eq!(encoded.len(), 2 + 130);

        let raw = agent.signer.sign_message_sync(message).unwrap();
        assert_eq!(encoded, encode_signature(raw.as_bytes()));
        assert_eq!(raw.recover_address_from_msg(message).unwrap(), agent.address());
    }

    #[test]
    fn test_owner_typed_signature_recovers_owner() {
        let owner = owner();
        let agent = AgentCredential::generate();
        let domain = typed_data::domain(Chain::BeraBepolia);
        let message = typed_data::agent_message(
            Environment::Testnet,
            agent.address(),
            Platform::Stella,
            1_700_086_400,
        );

        let encoded = owner.sign_typed(&message, &domain).unwrap();
        let hash = message.eip712_signing_hash(&domain);
        let raw = owner.signer.sign_hash_sync(&hash).unwrap();
        assert_eq!(encoded, encode_signature(raw.as_bytes()));
        assert_eq!(raw.recover_address_from_prehash(&hash).unwrap(), owner.address());
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", owner());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&DEV_KEY[2..]));
    }
}
