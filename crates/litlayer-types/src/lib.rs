//! Shared types for the LitLayer REST and WebSocket APIs
//!
//! This crate provides the core type definitions used across the LitLayer SDK.
//! It has minimal dependencies and can be used independently.
//!
//! # Key Types
//!
//! - [`Chain`], [`Platform`], [`Environment`], [`Endpoint`] - Deployment selectors
//! - [`SymbolChannel`], [`AddressChannel`], [`MakerChannel`] - Streaming channels
//! - [`ResultTag`] - Operation response tags
//! - [`SubscribeRequest`], [`LoginRequest`], [`PostRequest`] - Outbound frames
//! - [`OperationResponse`], [`ChannelPush`] - Inbound frames
//! - [`LitlayerError`] - Error types

pub mod endpoint;
pub mod enums;
pub mod error;
pub mod messages;

// Re-export commonly used types
pub use endpoint::Endpoint;
pub use enums::*;
pub use error::*;
pub use messages::*;

// Re-export rust_decimal for users
pub use rust_decimal::Decimal;
