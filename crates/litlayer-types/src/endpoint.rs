//! LitLayer API endpoints

use crate::Environment;
use std::fmt;

/// Hosted LitLayer deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endpoint {
    /// Public testnet (default)
    #[default]
    Testnet,
    /// Production
    Mainnet,
}

impl Endpoint {
    /// Streaming API URL
    pub fn ws_url(&self) -> &'static str {
        match self {
            Self::Testnet => "wss://testnet.v2.stellaxyz.io/v1/ws",
            Self::Mainnet => "wss://v2.stellaxyz.io/v1/ws",
        }
    }

    /// REST API base URL
    pub fn rest_url(&self) -> &'static str {
        match self {
            Self::Testnet => "https://testnet.v2.stellaxyz.io",
            Self::Mainnet => "https://v2.stellaxyz.io",
        }
    }
}

impl From<Environment> for Endpoint {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Testnet => Self::Testnet,
            Environment::Mainnet => Self::Mainnet,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ws_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(Endpoint::Testnet.ws_url(), "wss://testnet.v2.stellaxyz.io/v1/ws");
        assert_eq!(Endpoint::Testnet.rest_url(), "https://testnet.v2.stellaxyz.io");
        assert_eq!(Endpoint::from(Environment::Mainnet), Endpoint::Mainnet);
    }
}
