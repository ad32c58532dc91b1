//! High-level SDK for the LitLayer exchange
//!
//! One builder wires the three clients an integration usually needs: the
//! signed REST client, the user data stream and the market-maker session.
//! All three act for the same owner account through the same delegated agent.
//!
//! # Quick Start
//!
//! ```no_run
//! use litlayer_sdk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LitlayerClient::builder()
//!         .with_environment(Environment::Testnet)
//!         .with_owner_key(SecretString::from(std::env::var("OWNER_KEY")?))
//!         .build()?;
//!
//!     client.user_stream().on(AddressChannel::Position, |push| {
//!         println!("position: {:?}", push.data());
//!     });
//!     client.user_stream().subscribe_address(AddressChannel::Position, None, None)?;
//!     client.connect()?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     client.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **Agent delegation**: the owner key signs once, the agent signs requests
//! - **Fixed-delay reconnection** with frames buffered while offline
//! - **Login-gated maker commands**: nothing is sent before the session is accepted

pub mod builder;
pub mod client;
pub mod prelude;

// Re-export main types
pub use builder::{ConfigError, LitlayerClientBuilder};
pub use client::LitlayerClient;

// Re-export commonly used types from dependencies
pub use litlayer_rest::LitlayerRestClient;
pub use litlayer_types::{Chain, Endpoint, Environment, LitlayerError, Platform};
pub use litlayer_ws::{ConnectionState, MakerSession, ReconnectConfig, UserStream};
