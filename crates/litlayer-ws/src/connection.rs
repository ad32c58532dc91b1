//! WebSocket connection management
//!
//! A [`StreamConnection`] owns one background driver task per `connect()`.
//! The driver holds the transport, races inbound frames against outbound
//! traffic, and reconnects after a fixed delay when the socket goes away
//! unexpectedly. Frames written while the socket is not ready wait in a
//! [`PendingFrameBuffer`] and are flushed in order once it is.

use crate::buffer::PendingFrameBuffer;
use crate::dispatch::{Delivery, Frame, FrameClassifier, HandlerId, HandlerKey, HandlerRegistry, TaggedClassifier};
use crate::hooks::{CloseInfo, CloseReason, Hooks, OpenInfo};
use crate::reconnect::ReconnectConfig;
use crate::transport::{Transport, TransportError, WsTransport};

use litlayer_types::{Endpoint, LitlayerError, LitlayerResult};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// WebSocket connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Connect attempt (or reconnect wait) in progress
    Connecting,
    /// Socket open
    Open,
    /// `disconnect()` called, driver winding down
    Closing,
}

/// Configuration for the WebSocket connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL
    pub url: String,
    /// Reconnection settings
    pub reconnect: ReconnectConfig,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::for_endpoint(Endpoint::default())
    }
}

impl ConnectionConfig {
    /// Config for an explicit URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectConfig::default(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Config for a hosted deployment
    pub fn for_endpoint(endpoint: Endpoint) -> Self {
        Self::new(endpoint.ws_url())
    }

    /// Set reconnection config
    pub fn with_reconnect(mut self, config: ReconnectConfig) -> Self {
        self.reconnect = config;
        self
    }

    /// Disable automatic reconnection
    pub fn without_reconnect(mut self) -> Self {
        self.reconnect = ReconnectConfig::disabled();
        self
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// What happened to a frame handed to [`StreamConnection::send`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the open socket
    Sent,
    /// Waiting in the pending buffer
    Buffered,
}

/// Frames a connection sends first on every open
pub trait Handshake: Send + Sync {
    /// Frames to send, in order, right after the socket opens
    ///
    /// An error ends the connection for good: it is reported through the
    /// error hook and the connection disconnects.
    fn opening_frames(&self) -> LitlayerResult<Vec<String>>;

    /// When true, buffered frames stay put after open until
    /// [`StreamConnection::release_pending`] is called
    fn gates_buffer(&self) -> bool {
        false
    }
}

enum Outbound {
    Frame(String),
    Flush,
}

enum SessionEnd {
    Cancelled,
    Lost(CloseReason),
}

struct Shared {
    state: ConnectionState,
    url: Option<String>,
    /// Direct sends and flushing allowed
    ready: bool,
    buffer: PendingFrameBuffer,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    cancel: Option<CancellationToken>,
    generation: u64,
}

impl Shared {
    /// Whether the driver of `generation` is still the live one
    fn owned_by(&self, generation: u64) -> bool {
        self.generation == generation && self.cancel.is_some()
    }
}

struct Inner {
    reconnect: ReconnectConfig,
    shared: Mutex<Shared>,
    registry: HandlerRegistry,
    classifier: Box<dyn FrameClassifier>,
    handshake: Option<Arc<dyn Handshake>>,
    hooks: Hooks,
    transport: tokio::sync::Mutex<Box<dyn Transport>>,
}

/// Builder for [`StreamConnection`]
pub struct ConnectionBuilder {
    config: ConnectionConfig,
    classifier: Option<Box<dyn FrameClassifier>>,
    handshake: Option<Arc<dyn Handshake>>,
    hooks: Hooks,
    transport: Option<Box<dyn Transport>>,
}

impl ConnectionBuilder {
    /// Replace the frame classifier (default: [`TaggedClassifier::user`])
    pub fn classifier(mut self, classifier: impl FrameClassifier + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    /// Run a handshake on every open
    pub fn handshake(mut self, handshake: Arc<dyn Handshake>) -> Self {
        self.handshake = Some(handshake);
        self
    }

    /// Set lifecycle hooks
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Use a custom transport (default: [`WsTransport`])
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Build the connection; nothing connects until `connect()`
    pub fn build(self) -> StreamConnection {
        let transport = self.transport.unwrap_or_else(|| {
            Box::new(WsTransport::new().with_timeout(self.config.connect_timeout))
        });
        let url = Some(self.config.url).filter(|u| !u.is_empty());

        StreamConnection {
            inner: Arc::new(Inner {
                reconnect: self.config.reconnect,
                shared: Mutex::new(Shared {
                    state: ConnectionState::Disconnected,
                    url,
                    ready: false,
                    buffer: PendingFrameBuffer::new(),
                    outbound: None,
                    cancel: None,
                    generation: 0,
                }),
                registry: HandlerRegistry::new(),
                classifier: self
                    .classifier
                    .unwrap_or_else(|| Box::new(TaggedClassifier::user())),
                handshake: self.handshake,
                hooks: self.hooks,
                transport: tokio::sync::Mutex::new(transport),
            }),
        }
    }
}

/// Stateful WebSocket connection with buffering and reconnect
///
/// Cheap to clone; clones share the same socket, buffer and observers.
#[derive(Clone)]
pub struct StreamConnection {
    inner: Arc<Inner>,
}

impl fmt::Debug for StreamConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.inner.shared.lock();
        f.debug_struct("StreamConnection")
            .field("state", &shared.state)
            .field("url", &shared.url)
            .field("pending", &shared.buffer.len())
            .finish_non_exhaustive()
    }
}

impl StreamConnection {
    /// Plain connection with default classifier and transport
    pub fn new(config: ConnectionConfig) -> Self {
        Self::builder(config).build()
    }

    /// Start building a connection
    pub fn builder(config: ConnectionConfig) -> ConnectionBuilder {
        ConnectionBuilder {
            config,
            classifier: None,
            handshake: None,
            hooks: Hooks::new(),
            transport: None,
        }
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        self.inner.shared.lock().state
    }

    /// Check if the socket is open
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Current URL; `None` after `disconnect()`
    pub fn url(&self) -> Option<String> {
        self.inner.shared.lock().url.clone()
    }

    /// Point the connection at a URL (used by the next connect attempt)
    pub fn set_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.inner.shared.lock().url = Some(url).filter(|u| !u.is_empty());
    }

    /// Start the driver task
    ///
    /// Returns immediately; the connect itself happens in the background.
    /// Calling it while a driver is already running is a no-op.
    pub fn connect(&self) -> LitlayerResult<()> {
        let runtime = Handle::try_current().map_err(|_| {
            LitlayerError::Configuration("connect() must be called inside a Tokio runtime".into())
        })?;

        let (token, generation, url) = {
            let mut shared = self.inner.shared.lock();
            if shared.cancel.is_some() {
                debug!("Driver already running");
                return Ok(());
            }
            let url = shared
                .url
                .clone()
                .ok_or_else(|| LitlayerError::Configuration("WebSocket URL is not set".into()))?;
            let token = CancellationToken::new();
            shared.generation += 1;
            shared.cancel = Some(token.clone());
            shared.state = ConnectionState::Connecting;
            (token, shared.generation, url)
        };

        debug!(%url, generation, "Starting connection driver");
        runtime.spawn(drive(self.inner.clone(), token, generation));
        Ok(())
    }

    /// Close the socket and stop reconnecting
    ///
    /// Clears the URL, aborts any in-flight connect or reconnect wait, and
    /// closes without running the close hook. Buffered frames are kept; see
    /// [`clear_pending`](Self::clear_pending).
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Serialize and send a message, buffering it if the socket is not ready
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> LitlayerResult<SendOutcome> {
        let frame = serde_json::to_string(message)?;
        Ok(self.send_raw(frame))
    }

    /// Send an already serialized frame
    pub fn send_raw(&self, frame: impl Into<String>) -> SendOutcome {
        let frame = frame.into();
        let mut shared = self.inner.shared.lock();

        if shared.state == ConnectionState::Open && shared.ready {
            if let Some(tx) = &shared.outbound {
                if tx.send(Outbound::Frame(frame.clone())).is_ok() {
                    return SendOutcome::Sent;
                }
            }
        }

        if shared.buffer.push(frame) {
            trace!(pending = shared.buffer.len(), "Frame buffered");
        } else {
            debug!("Identical frame already pending");
        }
        SendOutcome::Buffered
    }

    /// Allow buffered frames out on a gated connection
    pub fn release_pending(&self) {
        let mut shared = self.inner.shared.lock();
        if shared.state != ConnectionState::Open {
            return;
        }
        shared.ready = true;
        if let Some(tx) = &shared.outbound {
            let _ = tx.send(Outbound::Flush);
        }
    }

    /// Number of frames waiting in the buffer
    pub fn pending_len(&self) -> usize {
        self.inner.shared.lock().buffer.len()
    }

    /// Copy of the buffered frames, oldest first
    pub fn pending_frames(&self) -> Vec<String> {
        self.inner.shared.lock().buffer.snapshot()
    }

    /// Drop every buffered frame
    pub fn clear_pending(&self) {
        self.inner.shared.lock().buffer.clear();
    }

    /// Observer registry
    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    /// Register an observer
    pub fn on<F>(&self, key: impl Into<HandlerKey>, handler: F) -> HandlerId
    where
        F: Fn(&Delivery<'_>) + Send + Sync + 'static,
    {
        self.inner.registry.add(key, handler)
    }

    /// Remove an observer
    pub fn remove_handler(&self, key: impl Into<HandlerKey>, id: HandlerId) -> bool {
        self.inner.registry.remove(key, id)
    }

    pub(crate) fn report_error(&self, err: &LitlayerError) {
        self.inner.hooks.invoke_error(err);
    }

    pub(crate) fn downgrade(&self) -> WeakConnection {
        WeakConnection {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Non-owning handle, for observers that act on their own connection
#[derive(Clone)]
pub(crate) struct WeakConnection {
    inner: Weak<Inner>,
}

impl WeakConnection {
    pub(crate) fn upgrade(&self) -> Option<StreamConnection> {
        self.inner.upgrade().map(|inner| StreamConnection { inner })
    }
}

async fn drive(inner: Arc<Inner>, cancel: CancellationToken, generation: u64) {
    // A previous driver may still be closing the socket
    let mut transport = inner.transport.lock().await;
    let mut attempt: u32 = 0;
    let mut opened_before = false;

    loop {
        let Some(url) = inner.current_url(&cancel) else {
            break;
        };
        inner.set_state(generation, ConnectionState::Connecting);
        info!(%url, "Connecting");

        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = transport.connect(&url) => result,
        };

        let reason = match connected {
            Ok(()) => {
                attempt = 0;
                let info = OpenInfo {
                    url,
                    is_reconnection: opened_before,
                };
                opened_before = true;
                match inner.run_open(&mut **transport, &cancel, generation, info).await {
                    SessionEnd::Cancelled => {
                        if let Err(e) = transport.close().await {
                            debug!(error = %e, "Close after disconnect failed");
                        }
                        break;
                    }
                    SessionEnd::Lost(reason) => reason,
                }
            }
            Err(e) => {
                warn!(error = %e, "Connect failed");
                inner.hooks.invoke_error(&LitlayerError::from(e.clone()));
                CloseReason::ConnectFailed(e.to_string())
            }
        };

        let will_reconnect =
            inner.current_url(&cancel).is_some() && inner.reconnect.should_reconnect(attempt);
        inner.set_state(generation, ConnectionState::Disconnected);
        inner.hooks.invoke_close(&CloseInfo {
            reason,
            will_reconnect,
        });
        if !will_reconnect {
            info!("Not reconnecting");
            break;
        }

        attempt += 1;
        let delay = inner.reconnect.delay_for_attempt(attempt);
        info!(attempt, ?delay, "Reconnecting");
        inner.hooks.invoke_reconnect_attempt(attempt, delay);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    inner.finish(generation);
}

impl Inner {
    fn current_url(&self, cancel: &CancellationToken) -> Option<String> {
        if cancel.is_cancelled() {
            return None;
        }
        self.shared.lock().url.clone()
    }

    fn set_state(&self, generation: u64, state: ConnectionState) {
        let mut shared = self.shared.lock();
        if shared.owned_by(generation) {
            shared.state = state;
        }
    }

    fn disconnect(&self) {
        let token = {
            let mut shared = self.shared.lock();
            shared.url = None;
            shared.ready = false;
            shared.outbound = None;
            let token = shared.cancel.take();
            shared.state = if token.is_some() {
                ConnectionState::Closing
            } else {
                ConnectionState::Disconnected
            };
            token
        };
        if let Some(token) = token {
            info!("Disconnecting");
            token.cancel();
        }
    }

    fn finish(&self, generation: u64) {
        let mut shared = self.shared.lock();
        if shared.generation == generation {
            shared.state = ConnectionState::Disconnected;
            shared.cancel = None;
            shared.outbound = None;
            shared.ready = false;
        }
        debug!(generation, pending = shared.buffer.len(), "Connection driver stopped");
    }

    async fn run_open(
        &self,
        transport: &mut dyn Transport,
        cancel: &CancellationToken,
        generation: u64,
        info: OpenInfo,
    ) -> SessionEnd {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let gated = self.handshake.as_ref().is_some_and(|h| h.gates_buffer());
        {
            let mut shared = self.shared.lock();
            if !shared.owned_by(generation) {
                return SessionEnd::Cancelled;
            }
            shared.state = ConnectionState::Open;
            shared.ready = !gated;
            shared.outbound = Some(tx);
        }

        info!(url = %info.url, reconnection = info.is_reconnection, "Connection open");
        self.hooks.invoke_open(&info);

        let end = self.pump(transport, cancel, &mut rx).await;
        self.detach(generation, &mut rx);
        end
    }

    async fn pump(
        &self,
        transport: &mut dyn Transport,
        cancel: &CancellationToken,
        rx: &mut mpsc::UnboundedReceiver<Outbound>,
    ) -> SessionEnd {
        if let Some(handshake) = &self.handshake {
            match handshake.opening_frames() {
                Ok(frames) => {
                    for frame in frames {
                        if let Err(e) = transport.send(&frame).await {
                            return self.lost(e);
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Handshake failed, disconnecting");
                    self.hooks.invoke_error(&err);
                    self.disconnect();
                    return SessionEnd::Cancelled;
                }
            }
        }

        if let Err(e) = self.flush(transport).await {
            return self.lost(e);
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return SessionEnd::Cancelled,
                command = rx.recv() => match command {
                    Some(Outbound::Frame(frame)) => {
                        if let Err(e) = transport.send(&frame).await {
                            self.shared.lock().buffer.push(frame);
                            return self.lost(e);
                        }
                    }
                    Some(Outbound::Flush) => {
                        if let Err(e) = self.flush(transport).await {
                            return self.lost(e);
                        }
                    }
                    None => return SessionEnd::Cancelled,
                },
                inbound = transport.recv() => match inbound {
                    Ok(Some(text)) => self.handle_text(&text),
                    Ok(None) => {
                        info!("Server closed connection");
                        return SessionEnd::Lost(CloseReason::ServerClosed);
                    }
                    Err(e) => return self.lost(e),
                },
            }
        }
    }

    fn lost(&self, err: TransportError) -> SessionEnd {
        warn!(error = %err, "WebSocket error");
        self.hooks.invoke_error(&LitlayerError::from(err.clone()));
        SessionEnd::Lost(CloseReason::NetworkError(err.to_string()))
    }

    /// Write buffered frames in order; a frame leaves the buffer only once written
    async fn flush(&self, transport: &mut dyn Transport) -> Result<(), TransportError> {
        let mut sent = 0usize;
        loop {
            let frame = {
                let shared = self.shared.lock();
                if !shared.ready || shared.state != ConnectionState::Open {
                    break;
                }
                match shared.buffer.front() {
                    Some(frame) => frame.clone(),
                    None => break,
                }
            };
            transport.send(&frame).await?;
            self.shared.lock().buffer.complete_front(&frame);
            sent += 1;
        }
        if sent > 0 {
            debug!(count = sent, "Flushed pending frames");
        }
        Ok(())
    }

    /// Socket gone: stop direct sends and move undelivered frames into the buffer
    fn detach(&self, generation: u64, rx: &mut mpsc::UnboundedReceiver<Outbound>) {
        let mut shared = self.shared.lock();
        shared.outbound = None;
        shared.ready = false;
        if shared.owned_by(generation) {
            shared.state = ConnectionState::Disconnected;
        }

        let mut requeued = 0usize;
        while let Ok(command) = rx.try_recv() {
            if let Outbound::Frame(frame) = command {
                if shared.buffer.push(frame) {
                    requeued += 1;
                }
            }
        }
        if requeued > 0 {
            debug!(count = requeued, "Requeued undelivered frames");
        }
    }

    fn handle_text(&self, text: &str) {
        self.hooks.invoke_message(text.len());

        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to decode frame");
                self.hooks.invoke_error(&LitlayerError::decode(e.to_string(), text));
                return;
            }
        };

        match self.classifier.classify(value) {
            Frame::Operation(response) => {
                debug!(
                    result = %response.result,
                    id = ?response.id,
                    success = response.success,
                    "Operation response"
                );
                self.registry.dispatch_operation(&response);
            }
            Frame::Push(push) => {
                trace!(channel = %push.channel, "Channel push");
                self.registry.dispatch_push(&push);
            }
            Frame::Unrecognized(_) => {
                debug!("Unrecognized frame dropped: {}", text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use litlayer_types::{SubscribeRequest, SymbolChannel};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    const URL: &str = "wss://mock.test/v1/ws";

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn mock_connection(hooks: Hooks) -> (StreamConnection, crate::transport::MockHandle) {
        let (transport, handle) = MockTransport::new();
        let conn = StreamConnection::builder(ConnectionConfig::new(URL))
            .hooks(hooks)
            .transport(transport)
            .build();
        (conn, handle)
    }

    #[test]
    fn test_connection_config() {
        let config = ConnectionConfig::new(URL)
            .with_timeout(Duration::from_secs(5))
            .without_reconnect();

        assert_eq!(config.url, URL);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(!config.reconnect.is_enabled());
        assert_eq!(
            ConnectionConfig::default().url,
            "wss://testnet.v2.stellaxyz.io/v1/ws"
        );
    }

    #[tokio::test]
    async fn test_connect_without_url_fails() {
        let (conn, _handle) = mock_connection(Hooks::new());
        conn.disconnect();
        assert!(matches!(
            conn.connect(),
            Err(LitlayerError::Configuration(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffered_frames_flush_in_order() {
        let (conn, handle) = mock_connection(Hooks::new());

        let a = SubscribeRequest::subscribe_symbol(SymbolChannel::Market, "ETH");
        let b = SubscribeRequest::subscribe_symbol(SymbolChannel::Trade, "BTC");
        assert_eq!(conn.send(&a).unwrap(), SendOutcome::Buffered);
        assert_eq!(conn.send(&b).unwrap(), SendOutcome::Buffered);
        assert_eq!(conn.send(&a).unwrap(), SendOutcome::Buffered);
        assert_eq!(conn.pending_len(), 2);

        conn.connect().unwrap();
        settle().await;

        assert_eq!(conn.state(), ConnectionState::Open);
        assert_eq!(
            handle.sent(),
            vec![
                serde_json::to_string(&a).unwrap(),
                serde_json::to_string(&b).unwrap()
            ]
        );
        assert_eq!(conn.pending_len(), 0);
        conn.disconnect();
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_open_goes_straight_out() {
        let (conn, handle) = mock_connection(Hooks::new());
        conn.connect().unwrap();
        settle().await;

        assert_eq!(conn.send_raw(r#"{"x":1}"#), SendOutcome::Sent);
        settle().await;
        assert_eq!(handle.sent(), vec![r#"{"x":1}"#.to_string()]);
        conn.disconnect();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_fixed_delay() {
        let closes = Arc::new(AtomicU32::new(0));
        let c = closes.clone();
        let hooks = Hooks::new().on_close(move |info| {
            if info.will_reconnect {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        let (conn, handle) = mock_connection(hooks);

        conn.connect().unwrap();
        settle().await;
        assert_eq!(handle.connect_attempts(), 1);

        handle.push_close();
        settle().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(conn.state(), ConnectionState::Disconnected);

        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert_eq!(handle.connect_attempts(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(handle.connect_attempts(), 2);
        assert_eq!(conn.state(), ConnectionState::Open);
        conn.disconnect();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_prevents_reconnect() {
        let closes = Arc::new(AtomicU32::new(0));
        let c = closes.clone();
        let (conn, handle) = mock_connection(Hooks::new().on_close(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        conn.connect().unwrap();
        settle().await;
        conn.disconnect();
        settle().await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.connect_attempts(), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 0);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(conn.url().is_none());
        assert!(!handle.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_during_backoff_cancels_retry() {
        let (conn, handle) = mock_connection(Hooks::new());
        handle.fail_next_connects(1);

        conn.connect().unwrap();
        settle().await;
        assert_eq!(handle.connect_attempts(), 1);

        conn.disconnect();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.connect_attempts(), 1);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_aborts_pending_connect() {
        let closes = Arc::new(AtomicU32::new(0));
        let c = closes.clone();
        let (conn, handle) = mock_connection(Hooks::new().on_close(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        handle.hang_next_connect();

        conn.connect().unwrap();
        settle().await;
        assert_eq!(handle.connect_attempts(), 1);
        assert_eq!(conn.state(), ConnectionState::Connecting);

        conn.disconnect();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.connect_attempts(), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 0);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!handle.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_disabled() {
        let (transport, handle) = MockTransport::new();
        let conn = StreamConnection::builder(ConnectionConfig::new(URL).without_reconnect())
            .transport(transport)
            .build();

        conn.connect().unwrap();
        settle().await;
        handle.push_close();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(handle.connect_attempts(), 1);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        // the URL survives, so a manual connect works
        conn.connect().unwrap();
        settle().await;
        assert_eq!(handle.connect_attempts(), 2);
        conn.disconnect();
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_error_reaches_error_hook() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let e = errors.clone();
        let (conn, handle) = mock_connection(Hooks::new().on_error(move |err| {
            e.lock().push(err.clone());
        }));

        conn.connect().unwrap();
        settle().await;
        handle.push_frame("{not json");
        settle().await;

        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            LitlayerError::ProtocolDecode { raw: Some(raw), .. } if raw == "{not json"
        ));
        assert_eq!(conn.state(), ConnectionState::Open);
        drop(errors);
        conn.disconnect();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_send_requeues_frame() {
        let (conn, handle) = mock_connection(Hooks::new().on_close(|_| {}));
        conn.connect().unwrap();
        settle().await;

        handle.set_fail_send(true);
        conn.send_raw("lost-frame");
        settle().await;
        assert_eq!(conn.pending_frames(), vec!["lost-frame".to_string()]);

        handle.set_fail_send(false);
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert!(handle.sent().contains(&"lost-frame".to_string()));
        assert_eq!(conn.pending_len(), 0);
        conn.disconnect();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pushes_dispatched_in_arrival_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (conn, handle) = mock_connection(Hooks::new());
        let s = seen.clone();
        conn.on(SymbolChannel::Trade, move |d| {
            if let Some(n) = d.data().and_then(|v| v["n"].as_u64()) {
                s.lock().push(n);
            }
        });

        conn.connect().unwrap();
        settle().await;
        for n in 0..5 {
            handle.push_json(&json!({"channel": "trade", "data": {"n": n}}));
        }
        settle().await;

        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
        conn.disconnect();
    }

    struct Greeting;

    impl Handshake for Greeting {
        fn opening_frames(&self) -> LitlayerResult<Vec<String>> {
            Ok(vec!["hello".into()])
        }

        fn gates_buffer(&self) -> bool {
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gated_buffer_waits_for_release() {
        let (transport, handle) = MockTransport::new();
        let conn = StreamConnection::builder(ConnectionConfig::new(URL))
            .handshake(Arc::new(Greeting))
            .transport(transport)
            .build();

        conn.send_raw("queued");
        conn.connect().unwrap();
        settle().await;

        assert_eq!(handle.sent(), vec!["hello".to_string()]);
        assert_eq!(conn.send_raw("later"), SendOutcome::Buffered);

        conn.release_pending();
        settle().await;
        assert_eq!(handle.sent(), vec!["hello", "queued", "later"]);
        assert_eq!(conn.send_raw("direct"), SendOutcome::Sent);
        conn.disconnect();
    }
}
