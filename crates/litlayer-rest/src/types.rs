//! Response envelope and query parameters

use crate::error::{RestError, RestResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Display;

/// Standard LitLayer response wrapper
///
/// `{success: true, data, code, ts}` or `{success: false, msg, code}`.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    /// Whether the call succeeded
    pub success: bool,
    /// Zero on success
    #[serde(default)]
    pub code: i64,
    /// Error message on failure
    #[serde(default)]
    pub msg: Option<String>,
    /// Server timestamp (ms)
    #[serde(default)]
    pub ts: Option<i64>,
    /// Payload; `null` when absent
    #[serde(default)]
    pub data: Value,
}

impl ApiResponse {
    /// Check if the response indicates success
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Decode `data` into `T`, or surface the API failure
    pub fn into_result<T: DeserializeOwned>(self) -> RestResult<T> {
        if !self.success {
            return Err(RestError::Api {
                code: self.code,
                message: self.msg.unwrap_or_default(),
            });
        }
        serde_json::from_value(self.data).map_err(|e| RestError::Parse(e.to_string()))
    }
}

/// Query-string parameters; unset values are left out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Add a parameter only when `value` is set
    pub fn with_opt<V: Display>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// URL-encoded form, without the leading `?`
    pub fn encode(&self) -> RestResult<String> {
        serde_urlencoded::to_string(&self.pairs).map_err(|e| RestError::InvalidParameter(e.to_string()))
    }
}
