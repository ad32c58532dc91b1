//! Authenticated market-maker session
//!
//! A [`MakerSession`] logs in with an owner-signed `Authentication` message
//! every time the socket opens. Trading commands issued before the login is
//! accepted wait in the pending buffer; a rejected login disconnects the
//! session and those commands are never sent.

use crate::connection::{ConnectionBuilder, ConnectionConfig, ConnectionState, Handshake, StreamConnection};
use crate::dispatch::{Delivery, HandlerId, HandlerKey, TaggedClassifier};
use crate::hooks::Hooks;
use crate::transport::Transport;
use crate::user::UserStream;

use chrono::{DateTime, Utc};
use litlayer_auth::{typed_data, OwnerKey};
use litlayer_types::{
    CancelOrderData, CancelOrdersData, Chain, CreateOrder, Environment, JitAnswerData,
    LimitOrderData, LitlayerError, LitlayerResult, LoginAuthentication, LoginRequest,
    MakerChannel, Platform, PostRequest, ResultTag,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Login handshake for a maker session
#[derive(Debug, Clone)]
pub struct SessionLogin {
    owner: OwnerKey,
    chain: Chain,
    platform: Platform,
    environment: Environment,
}

impl SessionLogin {
    pub fn new(owner: OwnerKey, chain: Chain, platform: Platform, environment: Environment) -> Self {
        Self {
            owner,
            chain,
            platform,
            environment,
        }
    }

    /// Signed login request for `timestamp` (unix seconds)
    pub fn login_request(&self, id: impl Into<String>, timestamp: u64) -> LitlayerResult<LoginRequest> {
        let message = typed_data::authentication_message(self.environment, self.platform, timestamp);
        let signature = self
            .owner
            .sign_typed(&message, &typed_data::domain(self.chain))
            .map_err(|e| LitlayerError::authorization(format!("login signing failed: {e}")))?;

        Ok(LoginRequest::new(
            id,
            LoginAuthentication {
                platform: self.platform,
                chain_id: self.chain,
                timestamp,
                signature,
            },
        ))
    }
}

impl Handshake for SessionLogin {
    fn opening_frames(&self) -> LitlayerResult<Vec<String>> {
        let id = format!("login-{}", typed_data::unix_millis());
        let request = self.login_request(id, typed_data::unix_seconds())?;
        debug!(id = %request.id, "Sending login");
        Ok(vec![serde_json::to_string(&request)?])
    }

    fn gates_buffer(&self) -> bool {
        true
    }
}

/// A command waiting for its `postResponse`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub channel: MakerChannel,
    pub issued_at: DateTime<Utc>,
}

type PendingCommands = Arc<Mutex<HashMap<String, PendingCommand>>>;

/// Market-maker trading session
#[derive(Debug)]
pub struct MakerSession {
    stream: UserStream,
    pending: PendingCommands,
    sequence: AtomicU64,
}

impl MakerSession {
    /// Session over a real WebSocket
    pub fn new(config: ConnectionConfig, login: SessionLogin) -> Self {
        Self::build(StreamConnection::builder(config), login)
    }

    /// Session with custom hooks and transport
    pub fn with_parts(
        config: ConnectionConfig,
        login: SessionLogin,
        hooks: Hooks,
        transport: impl Transport + 'static,
    ) -> Self {
        Self::build(
            StreamConnection::builder(config).hooks(hooks).transport(transport),
            login,
        )
    }

    /// Session with custom hooks over a real WebSocket
    pub fn with_hooks(config: ConnectionConfig, login: SessionLogin, hooks: Hooks) -> Self {
        Self::build(StreamConnection::builder(config).hooks(hooks), login)
    }

    fn build(builder: ConnectionBuilder, login: SessionLogin) -> Self {
        let connection = builder
            .classifier(TaggedClassifier::maker())
            .handshake(Arc::new(login))
            .build();
        let pending: PendingCommands = Arc::new(Mutex::new(HashMap::new()));

        // Registered before any caller observer so these always run first
        let weak = connection.downgrade();
        connection.on(ResultTag::LoginResponse, move |delivery| {
            let Some(conn) = weak.upgrade() else {
                return;
            };
            match delivery {
                Delivery::Success { .. } => {
                    info!("Maker session authenticated");
                    conn.release_pending();
                }
                Delivery::Failure { response, error } => {
                    error!(code = response.code, reason = %error, "Maker login rejected");
                    conn.report_error(&LitlayerError::authorization(format!(
                        "login rejected ({}): {}",
                        response.code, error
                    )));
                    conn.disconnect();
                }
                Delivery::Push { .. } => {}
            }
        });

        let answered = pending.clone();
        connection.on(ResultTag::PostResponse, move |delivery| {
            let Some(response) = delivery.response() else {
                return;
            };
            let Some(id) = response.id.as_deref() else {
                return;
            };
            if let Some(command) = answered.lock().remove(id) {
                debug!(
                    id,
                    channel = command.channel.as_str(),
                    success = response.success,
                    "Command answered"
                );
            }
        });

        Self {
            stream: UserStream::from_connection(connection),
            pending,
            sequence: AtomicU64::new(0),
        }
    }

    /// Subscriptions share the session's socket
    pub fn stream(&self) -> &UserStream {
        &self.stream
    }

    /// Underlying connection
    pub fn connection(&self) -> &StreamConnection {
        self.stream.connection()
    }

    /// Start connecting; login runs on every open
    pub fn connect(&self) -> LitlayerResult<()> {
        self.stream.connect()
    }

    /// Close and stop reconnecting
    pub fn disconnect(&self) {
        self.stream.disconnect();
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        self.stream.state()
    }

    /// Register an observer
    pub fn on<F>(&self, key: impl Into<HandlerKey>, handler: F) -> HandlerId
    where
        F: Fn(&Delivery<'_>) + Send + Sync + 'static,
    {
        self.stream.on(key, handler)
    }

    /// Remove an observer
    pub fn remove_handler(&self, key: impl Into<HandlerKey>, id: HandlerId) -> bool {
        self.stream.remove_handler(key, id)
    }

    /// Place a limit order; returns the request id
    pub fn limit_order(&self, order: LimitOrderData, request_id: Option<&str>) -> LitlayerResult<String> {
        self.post(MakerChannel::LimitOrder, order, request_id)
    }

    /// Answer a JIT auction; returns the request id
    pub fn answer_jit(&self, answer: JitAnswerData, request_id: Option<&str>) -> LitlayerResult<String> {
        self.post(MakerChannel::AnswerJit, answer, request_id)
    }

    /// Cancel one order by exchange order number or client order id
    pub fn cancel_order(&self, cancel: CancelOrderData, request_id: Option<&str>) -> LitlayerResult<String> {
        if cancel.order_no.is_none() && cancel.client_order_id.is_none() {
            return Err(LitlayerError::invalid_parameter(
                "order_no",
                "either order_no or client_order_id is required",
            ));
        }
        self.post(MakerChannel::CancelOrder, cancel, request_id)
    }

    /// Cancel several orders; empty id lists are dropped from the frame
    pub fn cancel_orders(
        &self,
        order_nos: Vec<String>,
        client_order_ids: Vec<String>,
        request_id: Option<&str>,
    ) -> LitlayerResult<String> {
        if order_nos.is_empty() && client_order_ids.is_empty() {
            return Err(LitlayerError::invalid_parameter(
                "order_no",
                "either order_no or client_order_id must be a non-empty list",
            ));
        }
        let cancel = CancelOrdersData {
            order_no: Some(order_nos).filter(|ids| !ids.is_empty()),
            client_order_id: Some(client_order_ids).filter(|ids| !ids.is_empty()),
        };
        self.post(MakerChannel::CancelOrders, cancel, request_id)
    }

    /// Place a batch of orders
    pub fn create_orders(&self, orders: Vec<CreateOrder>, request_id: Option<&str>) -> LitlayerResult<String> {
        if orders.is_empty() {
            return Err(LitlayerError::invalid_parameter("orders", "must not be empty"));
        }
        self.post(MakerChannel::CreateOrders, orders, request_id)
    }

    /// Commands still waiting for a `postResponse`
    pub fn pending_commands(&self) -> HashMap<String, PendingCommand> {
        self.pending.lock().clone()
    }

    #[instrument(skip(self, data, channel), fields(channel = channel.as_str()))]
    fn post<T: Serialize>(
        &self,
        channel: MakerChannel,
        data: T,
        request_id: Option<&str>,
    ) -> LitlayerResult<String> {
        let id = request_id
            .map(str::to_string)
            .unwrap_or_else(|| self.next_request_id());
        let request = PostRequest::new(id.clone(), channel, data);

        self.pending.lock().insert(
            id.clone(),
            PendingCommand {
                channel,
                issued_at: Utc::now(),
            },
        );
        if let Err(e) = self.connection().send(&request) {
            self.pending.lock().remove(&id);
            return Err(e);
        }
        debug!(%id, "Command issued");
        Ok(id)
    }

    /// `post-<ms>-<seq>`; the sequence keeps ids distinct within a millisecond
    fn next_request_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("post-{}-{}", typed_data::unix_millis(), seq)
    }
}
