//! EIP-712 typed data for agent delegation and session login

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, Eip712Domain};
use chrono::Utc;
use litlayer_types::{Chain, Environment, Platform};
use std::borrow::Cow;

/// Typed-data domain name
pub const DOMAIN_NAME: &str = "LitLayer";

/// Typed-data domain version
pub const DOMAIN_VERSION: &str = "v1";

/// How long a delegation signature stays valid, in seconds (one day)
pub const DELEGATION_WINDOW_SECS: u64 = 86_400;

sol! {
    /// Owner assertion delegating trading authority to an agent
    #[derive(Debug, PartialEq, Eq)]
    struct Agent {
        string litLayer;
        address agentAddress;
        string platform;
        uint256 expiryTime;
    }

    /// Owner assertion opening a maker session
    #[derive(Debug, PartialEq, Eq)]
    struct Authentication {
        string litLayer;
        string platform;
        uint256 timestamp;
    }
}

/// Domain `{name: "LitLayer", version: "v1", chainId}`
pub fn domain(chain: Chain) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(DOMAIN_NAME)),
        Some(Cow::Borrowed(DOMAIN_VERSION)),
        Some(U256::from(chain.evm_id())),
        None,
        None,
    )
}

/// Delegation message for `agent`, valid until `expiry_time` (unix seconds)
pub fn agent_message(
    environment: Environment,
    agent: Address,
    platform: Platform,
    expiry_time: u64,
) -> Agent {
    Agent {
        litLayer: environment.as_str().to_string(),
        agentAddress: agent,
        platform: platform.as_str().to_string(),
        expiryTime: U256::from(expiry_time),
    }
}

/// Session login message stamped with `timestamp` (unix seconds)
pub fn authentication_message(
    environment: Environment,
    platform: Platform,
    timestamp: u64,
) -> Authentication {
    Authentication {
        litLayer: environment.as_str().to_string(),
        platform: platform.as_str().to_string(),
        timestamp: U256::from(timestamp),
    }
}

/// Current unix time in seconds
pub fn unix_seconds() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Current unix time in milliseconds
pub fn unix_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Expiry for a delegation signed now
pub fn expiry_time() -> u64 {
    unix_seconds() + DELEGATION_WINDOW_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolStruct;

    #[test]
    fn test_encoded_type_strings() {
        assert_eq!(
            Agent::eip712_encode_type(),
            "Agent(string litLayer,address agentAddress,string platform,uint256 expiryTime)"
        );
        assert_eq!(
            Authentication::eip712_encode_type(),
            "Authentication(string litLayer,string platform,uint256 timestamp)"
        );
    }

    #[test]
    fn test_domain_binds_chain() {
        let mainnet = domain(Chain::BeraMainnet);
        let testnet = domain(Chain::BeraBepolia);
        assert_eq!(mainnet.chain_id, Some(U256::from(80094u64)));
        assert_ne!(mainnet.separator(), testnet.separator());
    }

    #[test]
    fn test_environment_changes_signing_hash() {
        let d = domain(Chain::BeraBepolia);
        let a = authentication_message(Environment::Testnet, Platform::Stella, 1_700_000_000);
        let b = authentication_message(Environment::Mainnet, Platform::Stella, 1_700_000_000);
        assert_ne!(a.eip712_signing_hash(&d), b.eip712_signing_hash(&d));
    }

    #[test]
    fn test_expiry_is_one_window_ahead() {
        let before = unix_seconds();
        let expiry = expiry_time();
        let after = unix_seconds();
        assert!(expiry >= before + DELEGATION_WINDOW_SECS);
        assert!(expiry <= after + DELEGATION_WINDOW_SECS);
    }
}
