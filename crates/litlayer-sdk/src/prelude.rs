//! Re-exports for convenience
//!
//! Import everything you need with:
//! ```
//! use litlayer_sdk::prelude::*;
//! ```

// Client
pub use crate::builder::{ConfigError, LitlayerClientBuilder};
pub use crate::client::LitlayerClient;

// Types from litlayer-types
pub use litlayer_types::{
    AddressChannel, Chain, ChannelPush, Endpoint, Environment, LitlayerError, LitlayerResult,
    MakerChannel, OperationResponse, OrderDirection, OrderType, Platform, ResultTag,
    SymbolChannel,
    // Maker payloads
    CancelOrderData, CreateOrder, JitAnswerData, LimitOrderData,
    // Typed push payloads
    JitAuctionData, MarketData, OrderbookData, TradeData,
};

// Auth types
pub use litlayer_auth::{Address, AgentCredential, OwnerKey, RequestSigner, SecretString};

// REST types
pub use litlayer_rest::{LitlayerRestClient, Query, RestError, RestResult};

// WebSocket types
pub use litlayer_ws::{
    CloseInfo, CloseReason, ConnectionConfig, ConnectionState, Delivery, HandlerId, HandlerKey,
    Hooks, MakerSession, OpenInfo, ReconnectConfig, SendOutcome, StreamConnection, UserStream,
};

// Decimal for prices/quantities
pub use rust_decimal::Decimal;
