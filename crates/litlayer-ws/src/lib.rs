//! Native WebSocket client for the LitLayer streaming API
//!
//! This crate provides the streaming half of the LitLayer SDK: a stateful
//! connection that buffers frames while the socket is down and reconnects on
//! its own, a subscription client for market and account channels, and an
//! authenticated market-maker session.
//!
//! # Features
//!
//! - Automatic reconnection after a fixed delay
//! - Pending-frame buffer with in-order flush on open
//! - Observer registry keyed by channel or result tag
//! - Owner-signed login gating maker commands
//!
//! # Example
//!
//! ```no_run
//! use litlayer_ws::{ConnectionConfig, UserStream};
//! use litlayer_types::{ResultTag, SymbolChannel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = UserStream::new(ConnectionConfig::default());
//!
//!     stream.on(ResultTag::SubscriptionResponse, |ack| {
//!         println!("ack: {:?}", ack.response());
//!     });
//!     stream.on(SymbolChannel::Orderbook, |update| {
//!         println!("book: {:?}", update.data());
//!     });
//!
//!     stream.subscribe_symbol(SymbolChannel::Orderbook, "ETH", Some("req-1"))?;
//!     stream.connect()?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     stream.disconnect();
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod connection;
pub mod dispatch;
pub mod hooks;
pub mod reconnect;
pub mod session;
pub mod subscription;
pub mod transport;
pub mod user;

// Re-export main types
pub use connection::{
    ConnectionBuilder, ConnectionConfig, ConnectionState, Handshake, SendOutcome, StreamConnection,
};
pub use dispatch::{Delivery, Frame, FrameClassifier, HandlerId, HandlerKey, HandlerRegistry, TaggedClassifier};
pub use hooks::{CloseInfo, CloseReason, Hooks, OpenInfo};
pub use reconnect::ReconnectConfig;
pub use session::{MakerSession, PendingCommand, SessionLogin};
pub use subscription::{Subscription, SubscriptionManager};
pub use transport::{Transport, TransportError, WsTransport};
pub use user::UserStream;
