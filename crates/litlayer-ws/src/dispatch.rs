//! Frame classification and observer dispatch
//!
//! Every inbound frame is one of: an operation response (carries `result`),
//! a channel push (string `channel` plus `data`, no `result`), or something
//! unrecognized that is logged and dropped. Observers are registered per
//! [`HandlerKey`] and run in registration order.

use litlayer_types::{
    AddressChannel, ChannelPush, MakerChannel, OperationResponse, ResultTag, SymbolChannel,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// A classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Reply to a command
    Operation(OperationResponse),
    /// Subscription update
    Push(ChannelPush),
    /// Anything else
    Unrecognized(Value),
}

/// Decides what an inbound frame is
pub trait FrameClassifier: Send + Sync {
    fn classify(&self, value: Value) -> Frame;
}

/// Classifier keyed on the `result` tag
///
/// Operation responses whose tag is not in the accepted set are treated as
/// unrecognized.
#[derive(Debug, Clone)]
pub struct TaggedClassifier {
    accepted: Vec<ResultTag>,
}

impl TaggedClassifier {
    /// Accept the given result tags
    pub fn new(accepted: impl IntoIterator<Item = ResultTag>) -> Self {
        Self {
            accepted: accepted.into_iter().collect(),
        }
    }

    /// Tags a plain user stream answers to
    pub fn user() -> Self {
        Self::new([ResultTag::SubscriptionResponse])
    }

    /// Tags an authenticated maker session answers to
    pub fn maker() -> Self {
        Self::new([
            ResultTag::SubscriptionResponse,
            ResultTag::LoginResponse,
            ResultTag::PostResponse,
        ])
    }
}

impl FrameClassifier for TaggedClassifier {
    fn classify(&self, value: Value) -> Frame {
        let Some(obj) = value.as_object() else {
            return Frame::Unrecognized(value);
        };

        if let Some(result) = obj.get("result") {
            let accepted = result
                .as_str()
                .and_then(ResultTag::from_name)
                .is_some_and(|tag| self.accepted.contains(&tag));
            if !accepted {
                return Frame::Unrecognized(value);
            }
            return match serde_json::from_value::<OperationResponse>(value.clone()) {
                Ok(response) => Frame::Operation(response),
                Err(_) => Frame::Unrecognized(value),
            };
        }

        let is_push = obj.get("channel").is_some_and(Value::is_string) && obj.contains_key("data");
        if is_push {
            if let Ok(push) = serde_json::from_value::<ChannelPush>(value.clone()) {
                return Frame::Push(push);
            }
        }

        Frame::Unrecognized(value)
    }
}

/// Observer key: a push channel or an operation-response tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    Symbol(SymbolChannel),
    Address(AddressChannel),
    Maker(MakerChannel),
    Result(ResultTag),
}

impl HandlerKey {
    /// Key for a push channel name
    pub fn for_channel(name: &str) -> Option<Self> {
        SymbolChannel::from_name(name)
            .map(Self::Symbol)
            .or_else(|| AddressChannel::from_name(name).map(Self::Address))
            .or_else(|| MakerChannel::from_name(name).map(Self::Maker))
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(ch) => f.write_str(ch.as_str()),
            Self::Address(ch) => f.write_str(ch.as_str()),
            Self::Maker(ch) => f.write_str(ch.as_str()),
            Self::Result(tag) => f.write_str(tag.as_str()),
        }
    }
}

impl From<SymbolChannel> for HandlerKey {
    fn from(ch: SymbolChannel) -> Self {
        Self::Symbol(ch)
    }
}

impl From<AddressChannel> for HandlerKey {
    fn from(ch: AddressChannel) -> Self {
        Self::Address(ch)
    }
}

impl From<MakerChannel> for HandlerKey {
    fn from(ch: MakerChannel) -> Self {
        Self::Maker(ch)
    }
}

impl From<ResultTag> for HandlerKey {
    fn from(tag: ResultTag) -> Self {
        Self::Result(tag)
    }
}

/// What an observer receives
#[derive(Debug, Clone, Copy)]
pub enum Delivery<'a> {
    /// Channel push; `data` is the push payload
    Push { key: HandlerKey, data: &'a Value },
    /// Successful operation response
    Success {
        response: &'a OperationResponse,
        data: Option<&'a Value>,
    },
    /// Failed operation response
    Failure {
        response: &'a OperationResponse,
        error: &'a str,
    },
}

impl<'a> Delivery<'a> {
    fn from_response(response: &'a OperationResponse) -> Self {
        if response.success {
            Delivery::Success {
                response,
                data: response.data.as_ref(),
            }
        } else {
            Delivery::Failure {
                response,
                error: response.error.as_deref().unwrap_or_default(),
            }
        }
    }

    /// Payload of a push or a successful response
    pub fn data(&self) -> Option<&'a Value> {
        match *self {
            Delivery::Push { data, .. } => Some(data),
            Delivery::Success { data, .. } => data,
            Delivery::Failure { .. } => None,
        }
    }

    /// Error text of a failed response
    pub fn error(&self) -> Option<&'a str> {
        match *self {
            Delivery::Failure { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The full operation response, if this is one
    pub fn response(&self) -> Option<&'a OperationResponse> {
        match *self {
            Delivery::Success { response, .. } | Delivery::Failure { response, .. } => Some(response),
            Delivery::Push { .. } => None,
        }
    }

    /// Whether this is a successful response or a push
    pub fn is_success(&self) -> bool {
        !matches!(self, Delivery::Failure { .. })
    }
}

/// Observer callback
pub type Handler = Arc<dyn Fn(&Delivery<'_>) + Send + Sync>;

/// Identifies one registration, for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Observer registry
///
/// Dispatch works on a snapshot of the observer list, so an observer may
/// register or remove observers (itself included) while it runs. A
/// panicking observer is logged and the remaining observers still run.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<HandlerKey, Vec<(HandlerId, Handler)>>>,
    next_id: AtomicU64,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<HandlerKey, usize> = self
            .handlers
            .read()
            .iter()
            .map(|(key, list)| (*key, list.len()))
            .collect();
        f.debug_struct("HandlerRegistry").field("handlers", &counts).finish()
    }
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer under `key`
    pub fn add<F>(&self, key: impl Into<HandlerKey>, handler: F) -> HandlerId
    where
        F: Fn(&Delivery<'_>) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .entry(key.into())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove one registration; returns whether it existed
    pub fn remove(&self, key: impl Into<HandlerKey>, id: HandlerId) -> bool {
        let key = key.into();
        let mut handlers = self.handlers.write();
        let Some(list) = handlers.get_mut(&key) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(&key);
        }
        removed
    }

    /// Number of observers under `key`
    pub fn count(&self, key: impl Into<HandlerKey>) -> usize {
        self.handlers.read().get(&key.into()).map_or(0, Vec::len)
    }

    /// Deliver an operation response; returns how many observers ran
    pub fn dispatch_operation(&self, response: &OperationResponse) -> usize {
        let key = HandlerKey::Result(response.result);
        self.invoke(key, &Delivery::from_response(response))
    }

    /// Deliver a channel push; returns how many observers ran
    pub fn dispatch_push(&self, push: &ChannelPush) -> usize {
        let Some(key) = HandlerKey::for_channel(&push.channel) else {
            debug!(channel = %push.channel, "Push on unknown channel dropped");
            return 0;
        };
        self.invoke(key, &Delivery::Push { key, data: &push.data })
    }

    fn invoke(&self, key: HandlerKey, delivery: &Delivery<'_>) -> usize {
        let snapshot: Vec<(HandlerId, Handler)> = match self.handlers.read().get(&key) {
            Some(list) => list.clone(),
            None => {
                trace!(%key, "No observers");
                return 0;
            }
        };

        for (id, handler) in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(delivery))).is_err() {
                error!(%key, handler = id.0, "Observer panicked");
            }
        }
        snapshot.len()
    }
}
