//! REST API client for the LitLayer exchange
//!
//! A thin, generic client: callers name the path and the payload, the client
//! attaches the right headers and unwraps the `{success, data}` envelope.
//!
//! # Authentication
//!
//! Read-only calls send `X-Platform` and `X-Chain-EVM-Id`. Mutating calls
//! (POST, PUT, DELETE) also send `X-Nonce` and `X-Signature`, produced by a
//! [`litlayer_auth::RequestSigner`] that delegates its agent key on first use.
//! A 401/403 or a rejected delegation clears the cached delegation so the
//! next call re-checks the registry.
//!
//! # Example
//!
//! ```no_run
//! use litlayer_rest::{LitlayerRestClient, RestResult};
//! use serde_json::{json, Value};
//!
//! async fn place(client: &LitlayerRestClient) -> RestResult<Value> {
//!     client
//!         .post("v1/order", &json!({"symbol": "ETH", "size": "0.1"}), &[("X-Sub-Account", "1")])
//!         .await
//! }
//! ```

pub mod client;
pub mod error;
pub mod types;

// Re-export main types
pub use client::{ClientConfig, LitlayerRestClient};
pub use error::{RestError, RestResult};
pub use types::{ApiResponse, Query};
