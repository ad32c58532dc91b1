//! REST client tests against a mock HTTP server

use litlayer_auth::{
    AgentCredential, AgentDelegation, AuthError, HttpDelegationRegistry, OwnerKey, RequestSigner,
    SecretString,
};
use litlayer_rest::{LitlayerRestClient, Query, RestError};
use litlayer_types::{Chain, Environment, Platform};
use mockito::Matcher;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

const OWNER_KEY: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

#[derive(Serialize)]
struct NewOrder {
    symbol: &'static str,
    size: &'static str,
}

fn client_for(server: &mockito::ServerGuard) -> LitlayerRestClient {
    let owner = OwnerKey::from_private_key(&SecretString::from(OWNER_KEY.to_string())).unwrap();
    let registry = HttpDelegationRegistry::new(server.url()).unwrap();
    let signer = RequestSigner::new(
        Chain::BeraBepolia,
        Platform::Stella,
        Environment::Testnet,
        owner,
        AgentCredential::generate(),
        AgentDelegation::new(Arc::new(registry)),
    );
    // trailing slash is trimmed
    LitlayerRestClient::with_client(reqwest::Client::new(), format!("{}/", server.url()), Arc::new(signer))
}

async fn agent_is_authorized(server: &mut mockito::ServerGuard, hits: usize) -> mockito::Mock {
    server
        .mock("POST", "/v1/check-agent")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"data":null,"code":0,"ts":1}"#)
        .expect(hits)
        .create_async()
        .await
}

#[tokio::test]
async fn test_get_sends_readonly_headers_and_query() {
    let mut server = mockito::Server::new_async().await;
    let markets = server
        .mock("GET", "/v1/markets")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("symbol".into(), "ETH".into()),
            Matcher::UrlEncoded("page".into(), "2".into()),
        ]))
        .match_header("X-Platform", "stella")
        .match_header("X-Chain-EVM-Id", "80069")
        .match_header("X-Signature", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"success":true,"data":[{"symbol":"ETH"}],"code":0,"ts":1}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let query = Query::new()
        .with("symbol", "ETH")
        .with_opt("limit", None::<u32>)
        .with_opt("page", Some(2));
    let data: Vec<Value> = client.get("/v1/markets", &query, &[]).await.unwrap();

    assert_eq!(data[0]["symbol"], "ETH");
    markets.assert_async().await;
}

#[tokio::test]
async fn test_post_sends_the_signed_body() {
    let mut server = mockito::Server::new_async().await;
    let check = agent_is_authorized(&mut server, 1).await;
    let order = server
        .mock("POST", "/v1/order")
        .match_header("X-Platform", "stella")
        .match_header("X-Chain-EVM-Id", "80069")
        .match_header("X-Nonce", Matcher::Regex(r"^\d{13,}$".into()))
        .match_header("X-Signature", Matcher::Regex(r"^0x[0-9a-f]{130}$".into()))
        .match_header("X-Sub-Account", "7")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Exact(r#"{"symbol":"ETH","size":"0.1"}"#.into()))
        .with_status(200)
        .with_body(r#"{"success":true,"data":{"orderNo":"42"},"code":0,"ts":1}"#)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    let body = NewOrder { symbol: "ETH", size: "0.1" };

    let first: Value = client.post("v1/order", &body, &[("X-Sub-Account", "7")]).await.unwrap();
    assert_eq!(first["orderNo"], "42");

    // delegation is cached, only the signature is fresh
    let _: Value = client.post("v1/order", &body, &[("X-Sub-Account", "7")]).await.unwrap();

    check.assert_async().await;
    order.assert_async().await;
}

#[tokio::test]
async fn test_api_failure_envelope() {
    let mut server = mockito::Server::new_async().await;
    let _check = agent_is_authorized(&mut server, 1).await;
    let _order = server
        .mock("PUT", "/v1/order")
        .with_status(200)
        .with_body(r#"{"success":false,"msg":"insufficient margin","code":1001}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .put::<Value, _>("v1/order", &json!({"orderNo": "42"}), &[])
        .await
        .unwrap_err();

    assert!(
        matches!(err, RestError::Api { code: 1001, ref message } if message == "insufficient margin")
    );
}

#[tokio::test]
async fn test_http_status_error() {
    let mut server = mockito::Server::new_async().await;
    let _positions = server
        .mock("GET", "/v1/positions")
        .with_status(503)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .get::<Value>("v1/positions", &Query::new(), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, RestError::Status { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_failure_envelope_on_client_error_status() {
    let mut server = mockito::Server::new_async().await;
    let _positions = server
        .mock("GET", "/v1/positions")
        .match_query(Matcher::UrlEncoded("symbol".into(), "DOGE".into()))
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":false,"msg":"unknown symbol","code":2002}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .get::<Value>("v1/positions", &Query::new().with("symbol", "DOGE"), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, RestError::Api { code: 2002, ref message } if message == "unknown symbol"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_unauthorized_response_rechecks_delegation() {
    let mut server = mockito::Server::new_async().await;
    let check = agent_is_authorized(&mut server, 2).await;
    let _order = server
        .mock("POST", "/v1/order")
        .with_status(401)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    let body = NewOrder { symbol: "BTC", size: "1" };

    let err = client.post::<Value, _>("v1/order", &body, &[]).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(client.signer().delegation_status().await.is_none());

    let _ = client.post::<Value, _>("v1/order", &body, &[]).await;
    check.assert_async().await;
}

#[tokio::test]
async fn test_rejected_delegation_never_sends_the_request() {
    let mut server = mockito::Server::new_async().await;
    let _check = server
        .mock("POST", "/v1/check-agent")
        .with_status(200)
        .with_body(r#"{"success":false,"msg":"unknown agent","code":1}"#)
        .create_async()
        .await;
    let _exchange = server
        .mock("POST", "/v1/exchange")
        .with_status(200)
        .with_body(r#"{"success":false,"msg":"bad signature","code":2}"#)
        .create_async()
        .await;
    let order = server
        .mock("POST", "/v1/order")
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .post::<Value, _>("v1/order", &NewOrder { symbol: "ETH", size: "1" }, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, RestError::Auth(AuthError::Authorization(_))));
    order.assert_async().await;
}

#[tokio::test]
async fn test_delete_without_body() {
    let mut server = mockito::Server::new_async().await;
    let _check = agent_is_authorized(&mut server, 1).await;
    let cancel = server
        .mock("DELETE", "/v1/orders")
        .match_header("X-Signature", Matcher::Regex(r"^0x[0-9a-f]{130}$".into()))
        .match_body(Matcher::Exact(String::new()))
        .with_status(200)
        .with_body(r#"{"success":true,"data":null,"code":0,"ts":1}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    client.delete_empty::<()>("v1/orders", &[]).await.unwrap();
    cancel.assert_async().await;
}

#[tokio::test]
async fn test_health_check() {
    let mut server = mockito::Server::new_async().await;
    let client = client_for(&server);

    let healthy = server.mock("GET", "/health").with_status(200).create_async().await;
    assert!(client.health_check().await.unwrap());
    healthy.remove_async().await;

    let _down = server.mock("GET", "/health").with_status(502).create_async().await;
    assert!(!client.health_check().await.unwrap());
}
