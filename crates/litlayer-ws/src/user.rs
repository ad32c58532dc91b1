//! User data stream
//!
//! Market and account subscriptions over a [`StreamConnection`]. Calls made
//! before the socket opens are buffered and go out on open.
//!
//! # Example
//!
//! ```no_run
//! use litlayer_ws::{ConnectionConfig, UserStream};
//! use litlayer_types::SymbolChannel;
//!
//! # async fn example() -> Result<(), litlayer_types::LitlayerError> {
//! let stream = UserStream::new(ConnectionConfig::default());
//! stream.on(SymbolChannel::Market, |delivery| {
//!     println!("market: {:?}", delivery.data());
//! });
//! stream.subscribe_symbol(SymbolChannel::Market, "*", None)?;
//! stream.connect()?;
//! # Ok(())
//! # }
//! ```

use crate::connection::{ConnectionConfig, ConnectionState, SendOutcome, StreamConnection};
use crate::dispatch::{Delivery, HandlerId, HandlerKey};
use crate::subscription::{Subscription, SubscriptionManager};

use litlayer_types::{AddressChannel, LitlayerError, LitlayerResult, SubscribeRequest, SymbolChannel};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, instrument};

/// Subscription client for market and account channels
#[derive(Debug)]
pub struct UserStream {
    connection: StreamConnection,
    account_address: RwLock<Option<String>>,
    subscriptions: Mutex<SubscriptionManager>,
}

impl UserStream {
    /// Stream over a plain connection
    pub fn new(config: ConnectionConfig) -> Self {
        Self::from_connection(StreamConnection::new(config))
    }

    /// Wrap an already configured connection
    pub fn from_connection(connection: StreamConnection) -> Self {
        Self {
            connection,
            account_address: RwLock::new(None),
            subscriptions: Mutex::new(SubscriptionManager::new()),
        }
    }

    /// Underlying connection
    pub fn connection(&self) -> &StreamConnection {
        &self.connection
    }

    /// Start connecting
    pub fn connect(&self) -> LitlayerResult<()> {
        self.connection.connect()
    }

    /// Close and stop reconnecting
    pub fn disconnect(&self) {
        self.connection.disconnect();
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Default address for account channels
    pub fn set_account_address(&self, address: impl Into<String>) {
        *self.account_address.write() = Some(address.into());
    }

    /// The default account address, if set
    pub fn account_address(&self) -> Option<String> {
        self.account_address.read().clone()
    }

    /// Subscribe to a symbol channel; `*` on `market` selects every symbol
    #[instrument(skip(self, channel), fields(channel = channel.as_str()))]
    pub fn subscribe_symbol(
        &self,
        channel: SymbolChannel,
        symbol: &str,
        request_id: Option<&str>,
    ) -> LitlayerResult<SendOutcome> {
        if symbol.is_empty() {
            return Err(LitlayerError::invalid_parameter("symbol", "must not be empty"));
        }
        let request = with_id(SubscribeRequest::subscribe_symbol(channel, symbol), request_id);
        self.subscribe(request)
    }

    /// Subscribe to an account channel, falling back to the default address
    #[instrument(skip(self, channel), fields(channel = channel.as_str()))]
    pub fn subscribe_address(
        &self,
        channel: AddressChannel,
        address: Option<&str>,
        request_id: Option<&str>,
    ) -> LitlayerResult<SendOutcome> {
        let address = self.resolve_address(address)?;
        let request = with_id(SubscribeRequest::subscribe_address(channel, address), request_id);
        self.subscribe(request)
    }

    /// Unsubscribe from a symbol channel
    pub fn unsubscribe_symbol(
        &self,
        channel: SymbolChannel,
        symbol: &str,
        request_id: Option<&str>,
    ) -> LitlayerResult<SendOutcome> {
        let request = with_id(SubscribeRequest::unsubscribe_symbol(channel, symbol), request_id);
        self.unsubscribe(request)
    }

    /// Unsubscribe from an account channel
    pub fn unsubscribe_address(
        &self,
        channel: AddressChannel,
        address: Option<&str>,
        request_id: Option<&str>,
    ) -> LitlayerResult<SendOutcome> {
        let address = self.resolve_address(address)?;
        let request = with_id(SubscribeRequest::unsubscribe_address(channel, address), request_id);
        self.unsubscribe(request)
    }

    /// Subscriptions requested and not yet unsubscribed
    ///
    /// These are not replayed after a reconnect.
    pub fn active_subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.lock().all().to_vec()
    }

    /// Register an observer for a channel or result tag
    pub fn on<F>(&self, key: impl Into<HandlerKey>, handler: F) -> HandlerId
    where
        F: Fn(&Delivery<'_>) + Send + Sync + 'static,
    {
        self.connection.on(key, handler)
    }

    /// Remove an observer
    pub fn remove_handler(&self, key: impl Into<HandlerKey>, id: HandlerId) -> bool {
        self.connection.remove_handler(key, id)
    }

    fn resolve_address(&self, address: Option<&str>) -> LitlayerResult<String> {
        address
            .map(str::to_string)
            .or_else(|| self.account_address())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                LitlayerError::invalid_parameter(
                    "address",
                    "no address given and no account address set",
                )
            })
    }

    fn subscribe(&self, request: SubscribeRequest) -> LitlayerResult<SendOutcome> {
        let outcome = self.connection.send(&request)?;
        if let Some(sub) = Subscription::from_request(&request) {
            self.subscriptions.lock().add(sub);
        }
        debug!(?outcome, "Subscribe issued");
        Ok(outcome)
    }

    fn unsubscribe(&self, request: SubscribeRequest) -> LitlayerResult<SendOutcome> {
        let outcome = self.connection.send(&request)?;
        if let Some(sub) = Subscription::from_request(&request) {
            self.subscriptions.lock().remove(&sub);
        }
        debug!(?outcome, "Unsubscribe issued");
        Ok(outcome)
    }
}

fn with_id(request: SubscribeRequest, request_id: Option<&str>) -> SubscribeRequest {
    match request_id {
        Some(id) => request.with_id(id),
        None => request,
    }
}
