//! High-level LitLayer client

use crate::builder::LitlayerClientBuilder;
use litlayer_auth::{Address, RequestSigner};
use litlayer_rest::{LitlayerRestClient, RestResult};
use litlayer_types::LitlayerResult;
use litlayer_ws::{ConnectionState, MakerSession, UserStream};
use std::sync::Arc;
use tracing::{info, instrument};

/// One owner, one agent: the REST client and both streams share them
///
/// # Example
///
/// ```no_run
/// use litlayer_sdk::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     // Owner key comes from LITLAYER_PRIVATE_KEY
///     let client = LitlayerClient::builder().build()?;
///
///     client.user_stream().on(SymbolChannel::Market, |push| {
///         println!("market: {:?}", push.data());
///     });
///     client.user_stream().subscribe_symbol(SymbolChannel::Market, "*", None)?;
///     client.connect()?;
///
///     println!("healthy: {}", client.health_check().await?);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct LitlayerClient {
    signer: Arc<RequestSigner>,
    rest: LitlayerRestClient,
    user: UserStream,
    maker: MakerSession,
}

impl LitlayerClient {
    /// Create a new client builder
    pub fn builder() -> LitlayerClientBuilder {
        LitlayerClientBuilder::new()
    }

    pub(crate) fn from_parts(
        signer: Arc<RequestSigner>,
        rest: LitlayerRestClient,
        user: UserStream,
        maker: MakerSession,
    ) -> Self {
        Self {
            signer,
            rest,
            user,
            maker,
        }
    }

    /// Signed REST client
    pub fn rest(&self) -> &LitlayerRestClient {
        &self.rest
    }

    /// Market and account subscriptions
    pub fn user_stream(&self) -> &UserStream {
        &self.user
    }

    /// Authenticated maker session
    pub fn maker_session(&self) -> &MakerSession {
        &self.maker
    }

    /// Request signer shared with the REST client
    pub fn signer(&self) -> &Arc<RequestSigner> {
        &self.signer
    }

    /// Owner account address
    pub fn owner_address(&self) -> Address {
        self.signer.owner_address()
    }

    /// Delegated agent address
    pub fn agent_address(&self) -> Address {
        self.signer.agent_address()
    }

    /// `GET /health` on the REST API
    pub async fn health_check(&self) -> RestResult<bool> {
        self.rest.health_check().await
    }

    /// Delegate the agent now instead of on the first signed call
    #[instrument(skip(self))]
    pub async fn authorize(&self) -> LitlayerResult<()> {
        self.signer.ensure_authorized().await?;
        Ok(())
    }

    /// Start both streams
    pub fn connect(&self) -> LitlayerResult<()> {
        self.user.connect()?;
        self.maker.connect()?;
        info!("Streams connecting");
        Ok(())
    }

    /// Close both streams and stop reconnecting
    pub fn disconnect(&self) {
        self.user.disconnect();
        self.maker.disconnect();
    }

    /// States of the user stream and the maker session
    pub fn states(&self) -> (ConnectionState, ConnectionState) {
        (self.user.state(), self.maker.state())
    }
}
