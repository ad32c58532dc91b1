//! Main REST client implementation

use crate::error::{RestError, RestResult};
use crate::types::{ApiResponse, Query};
use litlayer_auth::RequestSigner;
use litlayer_types::Endpoint;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// LitLayer REST API client
///
/// Read-only calls carry the platform and chain headers. Mutating calls are
/// signed by the delegated agent, and the body goes out exactly as signed.
///
/// # Example
///
/// ```no_run
/// use litlayer_auth::{AgentCredential, AgentDelegation, HttpDelegationRegistry, OwnerKey, RequestSigner};
/// use litlayer_rest::{LitlayerRestClient, Query};
/// use litlayer_types::{Chain, Endpoint, Environment, Platform};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let base_url = Endpoint::Testnet.rest_url();
///     let signer = RequestSigner::new(
///         Chain::BeraBepolia,
///         Platform::Stella,
///         Environment::Testnet,
///         OwnerKey::from_env()?,
///         AgentCredential::generate(),
///         AgentDelegation::new(Arc::new(HttpDelegationRegistry::new(base_url)?)),
///     );
///     let client = LitlayerRestClient::new(Arc::new(signer))?;
///
///     let markets: serde_json::Value = client
///         .get("v1/markets", &Query::new().with("symbol", "ETH"), &[])
///         .await?;
///     println!("{}", markets);
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct LitlayerRestClient {
    http_client: Client,
    base_url: String,
    signer: Arc<RequestSigner>,
}

impl LitlayerRestClient {
    /// Create a client for the testnet REST endpoint
    pub fn new(signer: Arc<RequestSigner>) -> RestResult<Self> {
        Self::with_config(ClientConfig::default(), signer)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, signer: Arc<RequestSigner>) -> RestResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(
                config
                    .user_agent
                    .as_deref()
                    .unwrap_or(concat!("litlayer-rest/", env!("CARGO_PKG_VERSION"))),
            )
            .build()?;

        info!(base_url = %config.base_url, "Created LitLayer REST client");

        Ok(Self::with_client(http_client, config.base_url, signer))
    }

    /// Reuse an existing HTTP client
    pub fn with_client(
        http_client: Client,
        base_url: impl Into<String>,
        signer: Arc<RequestSigner>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer,
        }
    }

    /// Base URL, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Signer used for mutating calls
    pub fn signer(&self) -> &Arc<RequestSigner> {
        &self.signer
    }

    /// `GET /health`; true only on a 200
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> RestResult<bool> {
        let response = self
            .http_client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        let healthy = response.status() == reqwest::StatusCode::OK;
        debug!(status = %response.status(), healthy, "Health check");
        Ok(healthy)
    }

    /// Read-only GET
    #[instrument(skip(self, query, headers))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
        headers: &[(&str, &str)],
    ) -> RestResult<T> {
        let mut url = self.url(path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.encode()?);
        }

        let mut request = self.http_client.get(&url);
        for (name, value) in self.signer.readonly_headers().pairs() {
            request = request.header(name, value);
        }
        self.execute(with_headers(request, headers)).await
    }

    /// Signed POST
    pub async fn post<T, B>(&self, path: &str, body: &B, headers: &[(&str, &str)]) -> RestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.signed(Method::POST, path, body, true, headers).await
    }

    /// Signed PUT
    pub async fn put<T, B>(&self, path: &str, body: &B, headers: &[(&str, &str)]) -> RestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.signed(Method::PUT, path, body, true, headers).await
    }

    /// Signed DELETE with a body
    pub async fn delete<T, B>(&self, path: &str, body: &B, headers: &[(&str, &str)]) -> RestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.signed(Method::DELETE, path, body, true, headers).await
    }

    /// Signed DELETE without a body; the signature covers `{}`
    pub async fn delete_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> RestResult<T> {
        let empty = serde_json::Map::new();
        self.signed(Method::DELETE, path, &empty, false, headers).await
    }

    #[instrument(skip(self, method, body, headers), fields(method = %method))]
    async fn signed<T, B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        send_body: bool,
        headers: &[(&str, &str)],
    ) -> RestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        // A failed delegation never reaches the wire
        let signed = self.signer.sign(body).await?;
        debug!(nonce = signed.headers.nonce, "Request signed");

        let mut request = self.http_client.request(method, self.url(path));
        for (name, value) in signed.headers.pairs() {
            request = request.header(name, value);
        }
        if send_body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(signed.body);
        }

        let result = self.execute(with_headers(request, headers)).await;
        if let Err(ref err) = result {
            if err.is_unauthorized() {
                warn!(error = %err, "Signed request refused, dropping cached delegation");
                self.signer.invalidate().await;
            }
        }
        result
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> RestResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(%status, "Request failed");
            return Err(failure_for_status(status, &text));
        }

        let envelope: ApiResponse =
            serde_json::from_str(&text).map_err(|e| RestError::Parse(e.to_string()))?;
        if !envelope.is_success() {
            debug!(code = envelope.code, "API returned failure");
        }
        envelope.into_result()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Non-2xx reply: keep the remote failure envelope when the body carries one
///
/// 401 and 403 stay status errors so the delegation gets re-checked.
fn failure_for_status(status: reqwest::StatusCode, body: &str) -> RestError {
    let auth_refused =
        status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN;
    if !auth_refused {
        if let Ok(envelope) = serde_json::from_str::<ApiResponse>(body) {
            if !envelope.is_success() {
                debug!(code = envelope.code, %status, "API returned failure");
                return RestError::Api {
                    code: envelope.code,
                    message: envelope.msg.unwrap_or_default(),
                };
            }
        }
    }
    RestError::from_status(status)
}

fn with_headers(mut request: RequestBuilder, headers: &[(&str, &str)]) -> RequestBuilder {
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    request
}

impl std::fmt::Debug for LitlayerRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LitlayerRestClient")
            .field("base_url", &self.base_url)
            .field("signer", &self.signer)
            .finish()
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Custom user agent
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Endpoint::Testnet.rest_url().to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for a known endpoint
    pub fn for_endpoint(endpoint: Endpoint) -> Self {
        Self::default().with_base_url(endpoint.rest_url())
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set a custom user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
