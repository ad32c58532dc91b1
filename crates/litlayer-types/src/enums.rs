//! Chain, platform, channel, and order enums

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// EVM chains the exchange is deployed on
///
/// Serialized as the numeric EVM chain id, both in JSON bodies and in the
/// `X-Chain-EVM-Id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    /// Berachain mainnet
    BeraMainnet,
    /// Berachain Bepolia testnet
    BeraBepolia,
}

impl Chain {
    /// Numeric EVM chain id
    pub fn evm_id(&self) -> u64 {
        match self {
            Self::BeraMainnet => 80094,
            Self::BeraBepolia => 80069,
        }
    }

    /// Look up a chain by its EVM id
    pub fn from_evm_id(id: u64) -> Option<Self> {
        match id {
            80094 => Some(Self::BeraMainnet),
            80069 => Some(Self::BeraBepolia),
            _ => None,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.evm_id())
    }
}

impl Serialize for Chain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.evm_id())
    }
}

impl<'de> Deserialize<'de> for Chain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = u64::deserialize(deserializer)?;
        Self::from_evm_id(id)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown chain id {}", id)))
    }
}

/// Trading platform identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Stella perpetuals
    #[default]
    Stella,
}

impl Platform {
    /// Returns the platform name as used in API messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stella => "stella",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment environment, bound into every typed-data signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Environment {
    /// Test network
    #[default]
    Testnet,
    /// Production network
    Mainnet,
}

impl Environment {
    /// Returns the tag signed as the `litLayer` typed-data field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Testnet => "Testnet",
            Self::Mainnet => "Mainnet",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Long
    #[serde(rename = "L")]
    Long,
    /// Short
    #[serde(rename = "S")]
    Short,
}

impl OrderDirection {
    /// Returns the opposite direction
    pub fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

/// Order types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Market order
    #[serde(rename = "M")]
    Market,
    /// Limit order
    #[serde(rename = "L")]
    Limit,
    /// Take-profit order
    #[serde(rename = "T")]
    TakeProfit,
    /// Stop-loss order
    #[serde(rename = "S")]
    StopLoss,
}

/// Channels keyed by market symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolChannel {
    /// Level 2 orderbook
    Orderbook,
    /// Executed trades
    Trade,
    /// Mark price, funding, and 24h statistics
    Market,
}

impl SymbolChannel {
    /// Returns the channel name as used in API messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orderbook => "orderbook",
            Self::Trade => "trade",
            Self::Market => "market",
        }
    }

    /// Parse a channel name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "orderbook" => Some(Self::Orderbook),
            "trade" => Some(Self::Trade),
            "market" => Some(Self::Market),
            _ => None,
        }
    }
}

/// Channels keyed by account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressChannel {
    /// Balance changes
    Balance,
    /// Position changes
    Position,
    /// Order lifecycle
    Order,
    /// Matching engine fills
    Matching,
}

impl AddressChannel {
    /// Returns the channel name as used in API messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Position => "position",
            Self::Order => "order",
            Self::Matching => "matching",
        }
    }

    /// Parse a channel name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "balance" => Some(Self::Balance),
            "position" => Some(Self::Position),
            "order" => Some(Self::Order),
            "matching" => Some(Self::Matching),
            _ => None,
        }
    }
}

/// Market-maker session channels
///
/// `JitAuction` is push-only; the rest are `post` request channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MakerChannel {
    /// Place a limit order
    LimitOrder,
    /// Cancel one order
    CancelOrder,
    /// Answer a JIT auction
    AnswerJit,
    /// JIT auction announcements
    JitAuction,
    /// Place a batch of orders
    CreateOrders,
    /// Cancel a batch of orders
    CancelOrders,
}

impl MakerChannel {
    /// Returns the channel name as used in API messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LimitOrder => "limitorder",
            Self::CancelOrder => "cancelorder",
            Self::AnswerJit => "answerjit",
            Self::JitAuction => "jitauction",
            Self::CreateOrders => "createorders",
            Self::CancelOrders => "cancelorders",
        }
    }

    /// Parse a channel name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "limitorder" => Some(Self::LimitOrder),
            "cancelorder" => Some(Self::CancelOrder),
            "answerjit" => Some(Self::AnswerJit),
            "jitauction" => Some(Self::JitAuction),
            "createorders" => Some(Self::CreateOrders),
            "cancelorders" => Some(Self::CancelOrders),
            _ => None,
        }
    }
}

/// Result tags carried by operation responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultTag {
    /// Reply to subscribe/unsubscribe
    SubscriptionResponse,
    /// Reply to a session login
    LoginResponse,
    /// Reply to a `post` command
    PostResponse,
}

impl ResultTag {
    /// Returns the tag as used in API messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionResponse => "subscriptionResponse",
            Self::LoginResponse => "loginResponse",
            Self::PostResponse => "postResponse",
        }
    }

    /// Parse a result tag
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "subscriptionResponse" => Some(Self::SubscriptionResponse),
            "loginResponse" => Some(Self::LoginResponse),
            "postResponse" => Some(Self::PostResponse),
            _ => None,
        }
    }
}

impl fmt::Display for ResultTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound request methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Subscribe,
    Unsubscribe,
    Login,
    Post,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_serializes_as_evm_id() {
        assert_eq!(serde_json::to_string(&Chain::BeraBepolia).unwrap(), "80069");
        let chain: Chain = serde_json::from_str("80094").unwrap();
        assert_eq!(chain, Chain::BeraMainnet);
        assert!(serde_json::from_str::<Chain>("1").is_err());
    }

    #[test]
    fn test_environment_tag() {
        assert_eq!(Environment::Testnet.as_str(), "Testnet");
        assert_eq!(
            serde_json::to_string(&Environment::Mainnet).unwrap(),
            "\"Mainnet\""
        );
    }

    #[test]
    fn test_order_enums_wire_form() {
        assert_eq!(serde_json::to_string(&OrderDirection::Long).unwrap(), "\"L\"");
        assert_eq!(serde_json::to_string(&OrderType::TakeProfit).unwrap(), "\"T\"");
        assert_eq!(OrderDirection::Short.opposite(), OrderDirection::Long);
    }

    #[test]
    fn test_channel_names_round_trip_through_from_name() {
        for ch in [SymbolChannel::Orderbook, SymbolChannel::Trade, SymbolChannel::Market] {
            assert_eq!(SymbolChannel::from_name(ch.as_str()), Some(ch));
        }
        assert_eq!(MakerChannel::from_name("jitauction"), Some(MakerChannel::JitAuction));
        assert_eq!(AddressChannel::from_name("ticker"), None);
    }

    #[test]
    fn test_result_tag_wire_form() {
        assert_eq!(
            serde_json::to_string(&ResultTag::SubscriptionResponse).unwrap(),
            "\"subscriptionResponse\""
        );
        assert_eq!(ResultTag::from_name("postResponse"), Some(ResultTag::PostResponse));
    }
}
