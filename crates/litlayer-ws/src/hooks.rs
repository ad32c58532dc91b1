//! Observability hooks for connection lifecycle monitoring
//!
//! Hooks observe the connection without taking part in frame dispatch. They
//! run synchronously on the connection task, so keep them fast.
//!
//! # Example
//!
//! ```
//! use litlayer_ws::hooks::Hooks;
//!
//! let hooks = Hooks::new()
//!     .on_open(|info| {
//!         println!("Connected to {}", info.url);
//!     })
//!     .on_close(|info| {
//!         eprintln!("Closed: {:?}", info.reason);
//!     })
//!     .on_reconnect_attempt(|attempt, delay| {
//!         println!("Reconnecting (attempt {}), waiting {:?}", attempt, delay);
//!     });
//! ```

use litlayer_types::LitlayerError;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Information about a successful connection
#[derive(Debug, Clone)]
pub struct OpenInfo {
    /// Endpoint that accepted the connection
    pub url: String,
    /// Whether this is a reconnection
    pub is_reconnection: bool,
}

/// Reason the socket went away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Server closed the connection
    ServerClosed,
    /// Network error occurred
    NetworkError(String),
    /// The connect attempt itself failed
    ConnectFailed(String),
}

/// Information passed to the close hook
#[derive(Debug, Clone)]
pub struct CloseInfo {
    pub reason: CloseReason,
    /// Whether a reconnect is scheduled
    pub will_reconnect: bool,
}

/// Type alias for hook callbacks
pub type OpenHook = Arc<dyn Fn(&OpenInfo) + Send + Sync>;
pub type CloseHook = Arc<dyn Fn(&CloseInfo) + Send + Sync>;
pub type ReconnectAttemptHook = Arc<dyn Fn(u32, Duration) + Send + Sync>;
pub type MessageHook = Arc<dyn Fn(usize) + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&LitlayerError) + Send + Sync>;

/// Observability hooks container
///
/// All hooks are optional. A panicking hook is logged and does not stop the
/// connection task.
#[derive(Clone, Default)]
pub struct Hooks {
    pub(crate) on_open: Option<OpenHook>,
    pub(crate) on_close: Option<CloseHook>,
    pub(crate) on_reconnect_attempt: Option<ReconnectAttemptHook>,
    pub(crate) on_message: Option<MessageHook>,
    pub(crate) on_error: Option<ErrorHook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_open", &self.on_open.as_ref().map(|_| "..."))
            .field("on_close", &self.on_close.as_ref().map(|_| "..."))
            .field("on_reconnect_attempt", &self.on_reconnect_attempt.as_ref().map(|_| "..."))
            .field("on_message", &self.on_message.as_ref().map(|_| "..."))
            .field("on_error", &self.on_error.as_ref().map(|_| "..."))
            .finish()
    }
}

impl Hooks {
    /// Create a new empty hooks container
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for successful connections
    ///
    /// Called each time the socket opens, reconnections included.
    pub fn on_open<F>(mut self, f: F) -> Self
    where
        F: Fn(&OpenInfo) + Send + Sync + 'static,
    {
        self.on_open = Some(Arc::new(f));
        self
    }

    /// Register a callback for unexpected closes
    ///
    /// Not called after an explicit `disconnect`.
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&CloseInfo) + Send + Sync + 'static,
    {
        self.on_close = Some(Arc::new(f));
        self
    }

    /// Register a callback for reconnection attempts
    ///
    /// Called with the attempt number (1-indexed) before waiting `delay`.
    pub fn on_reconnect_attempt<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, Duration) + Send + Sync + 'static,
    {
        self.on_reconnect_attempt = Some(Arc::new(f));
        self
    }

    /// Register a callback for received messages (size in bytes)
    pub fn on_message<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(f));
        self
    }

    /// Register a callback for errors
    ///
    /// Receives transport failures, undecodable frames and rejected logins.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&LitlayerError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub(crate) fn invoke_open(&self, info: &OpenInfo) {
        if let Some(ref hook) = self.on_open {
            guarded("on_open", || hook(info));
        }
    }

    pub(crate) fn invoke_close(&self, info: &CloseInfo) {
        if let Some(ref hook) = self.on_close {
            guarded("on_close", || hook(info));
        }
    }

    pub(crate) fn invoke_reconnect_attempt(&self, attempt: u32, delay: Duration) {
        if let Some(ref hook) = self.on_reconnect_attempt {
            guarded("on_reconnect_attempt", || hook(attempt, delay));
        }
    }

    pub(crate) fn invoke_message(&self, size: usize) {
        if let Some(ref hook) = self.on_message {
            guarded("on_message", || hook(size));
        }
    }

    pub(crate) fn invoke_error(&self, err: &LitlayerError) {
        if let Some(ref hook) = self.on_error {
            guarded("on_error", || hook(err));
        }
    }
}

fn guarded(name: &str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        error!(hook = name, "Hook panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_hooks_builder() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let hooks = Hooks::new().on_open(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        hooks.invoke_open(&OpenInfo {
            url: "wss://testnet.v2.stellaxyz.io/v1/ws".to_string(),
            is_reconnection: false,
        });
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hooks_clone() {
        let hooks = Hooks::new().on_open(|_| {}).on_close(|_| {});

        let cloned = hooks.clone();
        assert!(cloned.on_open.is_some());
        assert!(cloned.on_close.is_some());
        assert!(cloned.on_error.is_none());
    }

    #[test]
    fn test_empty_hooks_are_noops() {
        let hooks = Hooks::default();
        hooks.invoke_error(&LitlayerError::Transport("reset".into()));
        hooks.invoke_message(10);
    }

    #[test]
    fn test_panicking_hook_is_contained() {
        let hooks = Hooks::new().on_error(|_| panic!("boom"));
        hooks.invoke_error(&LitlayerError::Transport("reset".into()));
    }
}
