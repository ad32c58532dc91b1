//! WebSocket transport abstraction
//!
//! This module provides a trait-based abstraction over WebSocket connections,
//! enabling unit testing of connection logic without real network calls.
//!
//! # Example
//!
//! ```no_run
//! use litlayer_ws::transport::{Transport, WsTransport, TransportError};
//!
//! async fn example() -> Result<(), TransportError> {
//!     let mut transport = WsTransport::new();
//!     transport.connect("wss://testnet.v2.stellaxyz.io/v1/ws").await?;
//!     transport.send(r#"{"method":"subscribe","subscription":{"channel":"market","symbol":"*"}}"#).await?;
//!     if let Some(response) = transport.recv().await? {
//!         println!("Received: {}", response);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use litlayer_types::LitlayerError;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, instrument};

/// Transport layer errors
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Connection timeout
    #[error("connection timeout after {timeout:?} to {url}")]
    Timeout { url: String, timeout: Duration },

    /// Not connected
    #[error("not connected")]
    NotConnected,

    /// Protocol error
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<TransportError> for LitlayerError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { url, timeout } => {
                LitlayerError::ConnectionTimeout { url, timeout }
            }
            other => LitlayerError::Transport(other.to_string()),
        }
    }
}

/// Trait for WebSocket transport abstraction
///
/// One transport instance is reused across reconnects; `connect` is called
/// again with the current URL each time.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the WebSocket endpoint
    async fn connect(&mut self, url: &str) -> Result<(), TransportError>;

    /// Send a text message
    async fn send(&mut self, message: &str) -> Result<(), TransportError>;

    /// Receive a text message
    ///
    /// Returns `None` if the connection was closed gracefully. Must be
    /// cancel-safe: the connection driver races it against outbound traffic.
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;

    /// Close the connection gracefully
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Check if currently connected
    fn is_connected(&self) -> bool;

    /// URL of the last connect attempt
    fn endpoint(&self) -> &str;
}

/// Real WebSocket transport using tokio-tungstenite
pub struct WsTransport {
    url: String,
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    connect_timeout: Duration,
}

impl WsTransport {
    /// Create a new WebSocket transport
    pub fn new() -> Self {
        Self {
            url: String::new(),
            stream: None,
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for WsTransport {
    #[instrument(skip(self))]
    async fn connect(&mut self, url: &str) -> Result<(), TransportError> {
        debug!("Connecting to WebSocket");
        self.url = url.to_string();
        self.stream = None;

        let (ws_stream, _response) = timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| TransportError::Timeout {
                url: url.to_string(),
                timeout: self.connect_timeout,
            })?
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        self.stream = Some(ws_stream);
        debug!("WebSocket connected");
        Ok(())
    }

    #[instrument(skip(self, message), fields(len = message.len()))]
    async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        stream
            .send(Message::Text(message.to_string()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Binary(data))) => {
                    return String::from_utf8(data)
                        .map(Some)
                        .map_err(|e| TransportError::Protocol(e.to_string()));
                }
                Some(Ok(Message::Close(_))) => {
                    self.stream = None;
                    return Ok(None);
                }
                // tungstenite answers pings itself; skip control and raw frames
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => {
                    self.stream = None;
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
                None => {
                    self.stream = None;
                    return Err(TransportError::ConnectionClosed);
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            stream
                .close(None)
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockHandle, MockTransport};

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::{Transport, TransportError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    enum Inbound {
        Frame(String),
        Close,
        Error(String),
    }

    #[derive(Default)]
    struct MockState {
        connected: bool,
        sent: Vec<String>,
        connect_urls: Vec<String>,
        failing_connects: u32,
        hanging_connects: u32,
        fail_send: bool,
    }

    /// Mock transport for testing
    ///
    /// Inbound frames are injected and sent frames inspected through the
    /// paired [`MockHandle`], which stays usable after the transport has
    /// been moved into a connection.
    pub struct MockTransport {
        url: String,
        state: Arc<Mutex<MockState>>,
        inbound: mpsc::UnboundedReceiver<Inbound>,
    }

    /// Test-side control of a [`MockTransport`]
    #[derive(Clone)]
    pub struct MockHandle {
        state: Arc<Mutex<MockState>>,
        inbound: mpsc::UnboundedSender<Inbound>,
    }

    impl MockTransport {
        /// Create a mock transport and its handle
        pub fn new() -> (Self, MockHandle) {
            let state = Arc::new(Mutex::new(MockState::default()));
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Self {
                    url: String::new(),
                    state: state.clone(),
                    inbound: rx,
                },
                MockHandle { state, inbound: tx },
            )
        }
    }

    impl MockHandle {
        /// Deliver a text frame to the next `recv`
        pub fn push_frame(&self, msg: impl Into<String>) {
            let _ = self.inbound.send(Inbound::Frame(msg.into()));
        }

        /// Deliver a JSON value as a text frame
        pub fn push_json(&self, value: &serde_json::Value) {
            self.push_frame(value.to_string());
        }

        /// Simulate a graceful close from the server
        pub fn push_close(&self) {
            let _ = self.inbound.send(Inbound::Close);
        }

        /// Simulate a receive error
        pub fn push_error(&self, msg: impl Into<String>) {
            let _ = self.inbound.send(Inbound::Error(msg.into()));
        }

        /// Make the next `n` connect attempts fail
        pub fn fail_next_connects(&self, n: u32) {
            self.state.lock().failing_connects = n;
        }

        /// Make the next connect attempt never complete
        pub fn hang_next_connect(&self) {
            self.state.lock().hanging_connects += 1;
        }

        /// Make sends fail (or succeed again)
        pub fn set_fail_send(&self, fail: bool) {
            self.state.lock().fail_send = fail;
        }

        /// Frames sent so far
        pub fn sent(&self) -> Vec<String> {
            self.state.lock().sent.clone()
        }

        /// Drain the frames sent so far
        pub fn take_sent(&self) -> Vec<String> {
            std::mem::take(&mut self.state.lock().sent)
        }

        /// Sent frames parsed as JSON
        pub fn sent_json(&self) -> Vec<serde_json::Value> {
            self.sent()
                .iter()
                .filter_map(|s| serde_json::from_str(s).ok())
                .collect()
        }

        /// Number of connect attempts, failed ones included
        pub fn connect_attempts(&self) -> usize {
            self.state.lock().connect_urls.len()
        }

        /// URLs passed to `connect`
        pub fn connect_urls(&self) -> Vec<String> {
            self.state.lock().connect_urls.clone()
        }

        /// Whether the mock is currently connected
        pub fn is_connected(&self) -> bool {
            self.state.lock().connected
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn connect(&mut self, url: &str) -> Result<(), TransportError> {
            self.url = url.to_string();
            let hang = {
                let mut state = self.state.lock();
                state.connect_urls.push(url.to_string());
                if state.hanging_connects > 0 {
                    state.hanging_connects -= 1;
                    true
                } else {
                    false
                }
            };
            if hang {
                std::future::pending::<()>().await;
            }
            let mut state = self.state.lock();
            if state.failing_connects > 0 {
                state.failing_connects -= 1;
                return Err(TransportError::ConnectionFailed("mock connection failure".into()));
            }
            state.connected = true;
            Ok(())
        }

        async fn send(&mut self, message: &str) -> Result<(), TransportError> {
            let mut state = self.state.lock();
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            if state.fail_send {
                return Err(TransportError::SendFailed("mock send failure".into()));
            }
            state.sent.push(message.to_string());
            Ok(())
        }

        async fn recv(&mut self) -> Result<Option<String>, TransportError> {
            if !self.state.lock().connected {
                return Err(TransportError::NotConnected);
            }
            match self.inbound.recv().await {
                Some(Inbound::Frame(text)) => Ok(Some(text)),
                Some(Inbound::Close) => {
                    self.state.lock().connected = false;
                    Ok(None)
                }
                Some(Inbound::Error(msg)) => {
                    self.state.lock().connected = false;
                    Err(TransportError::ReceiveFailed(msg))
                }
                None => Err(TransportError::ConnectionClosed),
            }
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            self.state.lock().connected = false;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.state.lock().connected
        }

        fn endpoint(&self) -> &str {
            &self.url
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_send_recv() {
        let (mut transport, handle) = MockTransport::new();
        handle.push_frame(r#"{"channel":"market","data":{}}"#);

        transport.connect("wss://mock.test").await.unwrap();
        assert!(transport.is_connected());
        assert_eq!(transport.endpoint(), "wss://mock.test");

        transport.send(r#"{"method":"subscribe"}"#).await.unwrap();
        assert_eq!(handle.sent().len(), 1);
        assert!(handle.sent()[0].contains("subscribe"));

        let response = transport.recv().await.unwrap();
        assert!(response.unwrap().contains("market"));
    }

    #[tokio::test]
    async fn test_mock_transport_connection_failure() {
        let (mut transport, handle) = MockTransport::new();
        handle.fail_next_connects(1);

        assert!(transport.connect("wss://mock.test").await.is_err());
        assert!(!transport.is_connected());
        assert!(transport.connect("wss://mock.test").await.is_ok());
        assert_eq!(handle.connect_attempts(), 2);
    }

    #[tokio::test]
    async fn test_mock_transport_close() {
        let (mut transport, handle) = MockTransport::new();
        handle.push_close();

        transport.connect("wss://mock.test").await.unwrap();
        let response = transport.recv().await.unwrap();
        assert!(response.is_none());
        assert!(!handle.is_connected());
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let (mut transport, _handle) = MockTransport::new();
        assert!(matches!(
            transport.send("x").await,
            Err(TransportError::NotConnected)
        ));
    }

    #[test]
    fn test_transport_error_maps_to_sdk_error() {
        let err: LitlayerError = TransportError::ConnectionClosed.into();
        assert!(err.requires_reconnect());
    }

    #[test]
    fn test_connect_timeout_keeps_url_and_duration() {
        let err: LitlayerError = TransportError::Timeout {
            url: "wss://mock.test".into(),
            timeout: Duration::from_secs(10),
        }
        .into();
        assert!(err.is_retryable());
        assert!(err.requires_reconnect());
        match err {
            LitlayerError::ConnectionTimeout { url, timeout } => {
                assert_eq!(url, "wss://mock.test");
                assert_eq!(timeout, Duration::from_secs(10));
            }
            other => panic!("expected ConnectionTimeout, got {other:?}"),
        }
    }
}
