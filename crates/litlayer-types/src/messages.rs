//! Request and response frames for the LitLayer streaming API

use crate::{
    AddressChannel, Chain, MakerChannel, Method, OrderDirection, OrderType, Platform, ResultTag,
    SymbolChannel,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Subscription Requests
// ============================================================================

/// Any channel a user stream can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamChannel {
    /// Channel keyed by symbol
    Symbol(SymbolChannel),
    /// Channel keyed by account address
    Address(AddressChannel),
}

impl StreamChannel {
    /// Returns the channel name as used in API messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Symbol(ch) => ch.as_str(),
            Self::Address(ch) => ch.as_str(),
        }
    }
}

/// Subscription target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionTarget {
    /// Channel to (un)subscribe
    pub channel: StreamChannel,
    /// Market symbol, `*` selects every symbol on the market channel
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symbol: Option<String>,
    /// Account address
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
}

/// Subscribe or unsubscribe request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Optional request ID (echoed in the operation response)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    /// `subscribe` or `unsubscribe`
    pub method: Method,
    /// Channel and key
    pub subscription: SubscriptionTarget,
}

impl SubscribeRequest {
    fn new(method: Method, channel: StreamChannel, symbol: Option<String>, address: Option<String>) -> Self {
        Self {
            id: None,
            method,
            subscription: SubscriptionTarget {
                channel,
                symbol,
                address,
            },
        }
    }

    /// Subscribe to a symbol channel
    pub fn subscribe_symbol(channel: SymbolChannel, symbol: impl Into<String>) -> Self {
        Self::new(Method::Subscribe, StreamChannel::Symbol(channel), Some(symbol.into()), None)
    }

    /// Subscribe to an address channel
    pub fn subscribe_address(channel: AddressChannel, address: impl Into<String>) -> Self {
        Self::new(Method::Subscribe, StreamChannel::Address(channel), None, Some(address.into()))
    }

    /// Unsubscribe from a symbol channel
    pub fn unsubscribe_symbol(channel: SymbolChannel, symbol: impl Into<String>) -> Self {
        Self::new(Method::Unsubscribe, StreamChannel::Symbol(channel), Some(symbol.into()), None)
    }

    /// Unsubscribe from an address channel
    pub fn unsubscribe_address(channel: AddressChannel, address: impl Into<String>) -> Self {
        Self::new(Method::Unsubscribe, StreamChannel::Address(channel), None, Some(address.into()))
    }

    /// Add a request ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

// ============================================================================
// Maker Session Requests
// ============================================================================

/// Login credentials for an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAuthentication {
    pub platform: Platform,
    pub chain_id: Chain,
    /// Unix seconds the signature was produced at
    pub timestamp: u64,
    /// Owner EIP-712 signature, `0x`-prefixed hex
    pub signature: String,
}

/// Session login frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub id: String,
    pub method: Method,
    pub authentication: LoginAuthentication,
}

impl LoginRequest {
    /// Create a login frame
    pub fn new(id: impl Into<String>, authentication: LoginAuthentication) -> Self {
        Self {
            id: id.into(),
            method: Method::Login,
            authentication,
        }
    }
}

/// Body of a `post` frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostBody<T> {
    pub channel: MakerChannel,
    pub data: T,
}

/// Trading command sent on an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRequest<T> {
    pub id: String,
    pub method: Method,
    pub request: PostBody<T>,
}

impl<T: Serialize> PostRequest<T> {
    /// Create a post frame for a maker channel
    pub fn new(id: impl Into<String>, channel: MakerChannel, data: T) -> Self {
        Self {
            id: id.into(),
            method: Method::Post,
            request: PostBody { channel, data },
        }
    }
}

/// Limit order placed through the maker session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderData {
    pub symbol: String,
    pub direction: OrderDirection,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub price: Decimal,
    pub quantity: Decimal,
    pub slippage: Decimal,
    pub leverage: u32,
    /// Unix seconds
    pub expiry_time: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub client_order_id: Option<String>,
}

impl LimitOrderData {
    /// Create a zero-slippage limit order
    pub fn new(
        symbol: impl Into<String>,
        direction: OrderDirection,
        price: Decimal,
        quantity: Decimal,
        leverage: u32,
        expiry_time: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            order_type: OrderType::Limit,
            price,
            quantity,
            slippage: Decimal::ZERO,
            leverage,
            expiry_time,
            client_order_id: None,
        }
    }

    /// Attach a client order ID
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }
}

/// Quote answering a JIT auction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitAnswerData {
    pub symbol: String,
    pub direction: OrderDirection,
    pub expiry_time_ms: u64,
    pub price: Decimal,
    pub quantity: Decimal,
    /// Hash of the user order being auctioned
    pub user_order_hash: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub client_order_id: Option<String>,
}

/// Cancel a single order by exchange or client ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CancelOrderData {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub order_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub client_order_id: Option<String>,
}

/// Cancel several orders by exchange or client IDs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CancelOrdersData {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub order_no: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub client_order_id: Option<Vec<String>>,
}

/// One entry of a `createorders` batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub direction: OrderDirection,
    pub expiry_time: u64,
    pub leverage: u32,
    pub price: Decimal,
    pub quantity: Decimal,
    pub slippage: Decimal,
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub client_order_id: Option<String>,
}

// ============================================================================
// Inbound Frames
// ============================================================================

/// Direct reply to a caller-issued command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResponse {
    /// Request ID of the command this answers
    #[serde(default)]
    pub id: Option<String>,
    pub result: ResultTag,
    pub success: bool,
    /// Zero on success
    #[serde(default)]
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,
}

/// Unsolicited update for an active subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPush {
    pub channel: String,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,
}

// ============================================================================
// Push Payloads
// ============================================================================

/// Orderbook price level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub px: Decimal,
    pub sz: Decimal,
}

/// `orderbook` channel payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookData {
    pub symbol: String,
    pub time: u64,
    pub asks: Vec<BookLevel>,
    pub bids: Vec<BookLevel>,
}

/// `trade` channel entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeData {
    pub px: Decimal,
    pub side: String,
    pub symbol: String,
    pub sz: Decimal,
    pub time: u64,
}

/// Current and 24h-ago price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPrice {
    pub cur: Decimal,
    pub past24h: Decimal,
}

/// `market` channel payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub symbol: String,
    pub funding_rate: Decimal,
    pub mark_px: Decimal,
    pub next_funding_time: u64,
    pub oi: Decimal,
    pub px: MarketPrice,
    pub vol24h: Decimal,
}

/// `jitauction` announcement pushed to makers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitAuctionData {
    pub user_order_hash: String,
    pub order_side: OrderDirection,
    pub order_quantity: Decimal,
    pub pair_symbol: String,
}
