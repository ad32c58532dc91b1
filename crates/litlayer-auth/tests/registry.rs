//! Delegation registry tests against a mock HTTP server

use litlayer_auth::{
    AgentCredential, AgentDelegation, AuthError, HttpDelegationRegistry, OwnerKey,
    RequestSigner, SecretString,
};
use litlayer_types::{Chain, Environment, Platform};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;

const OWNER_KEY: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

fn owner() -> OwnerKey {
    OwnerKey::from_private_key(&SecretString::from(OWNER_KEY.to_string())).unwrap()
}

fn signer_for(server: &mockito::ServerGuard, agent: AgentCredential) -> RequestSigner {
    let registry = HttpDelegationRegistry::new(server.url()).unwrap();
    RequestSigner::new(
        Chain::BeraBepolia,
        Platform::Stella,
        Environment::Testnet,
        owner(),
        agent,
        AgentDelegation::new(Arc::new(registry)),
    )
}

#[tokio::test]
async fn test_check_agent_posts_proxy_address() {
    let mut server = mockito::Server::new_async().await;
    let agent = AgentCredential::generate();

    let check = server
        .mock("POST", "/v1/check-agent")
        .match_body(Matcher::Json(json!({
            "chain_id": 80069,
            "platform": "stella",
            "proxy_address": agent.address().to_string(),
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"data":null,"code":0,"ts":1}"#)
        .expect(1)
        .create_async()
        .await;

    let delegation = AgentDelegation::new(Arc::new(HttpDelegationRegistry::new(server.url()).unwrap()));
    let authorized = delegation
        .is_authorized(Chain::BeraBepolia, Platform::Stella, agent.address())
        .await
        .unwrap();

    assert!(authorized);
    check.assert_async().await;
}

#[tokio::test]
async fn test_unknown_agent_is_exchanged_once() {
    let mut server = mockito::Server::new_async().await;
    let agent = AgentCredential::generate();
    let owner_address = owner().address().to_string();

    let check = server
        .mock("POST", "/v1/check-agent")
        .with_status(200)
        .with_body(r#"{"success":false,"msg":"agent not found","code":404}"#)
        .expect(1)
        .create_async()
        .await;
    let exchange = server
        .mock("POST", "/v1/exchange")
        .match_body(Matcher::PartialJson(json!({
            "chain_id": 80069,
            "platform": "stella",
            "proxy_address": agent.address().to_string(),
            "account_address": owner_address,
        })))
        .with_status(200)
        .with_body(r#"{"success":true,"data":null,"code":0,"ts":1}"#)
        .expect(1)
        .create_async()
        .await;

    let signer = signer_for(&server, agent);
    signer.sign(&json!({"symbol": "ETH"})).await.unwrap();
    signer.sign(&json!({"symbol": "BTC"})).await.unwrap();

    check.assert_async().await;
    exchange.assert_async().await;
}

#[tokio::test]
async fn test_rejected_exchange_surfaces_authorization_error() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/v1/check-agent")
        .with_status(200)
        .with_body(r#"{"success":false,"msg":"agent not found","code":404}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/v1/exchange")
        .with_status(200)
        .with_body(r#"{"success":false,"msg":"signature expired","code":4010}"#)
        .expect(1)
        .create_async()
        .await;

    let signer = signer_for(&server, AgentCredential::generate());
    let err = signer.sign(&json!({})).await.unwrap_err();
    assert!(matches!(err, AuthError::Authorization(_)));
}

#[tokio::test]
async fn test_unreachable_registry_is_http_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/check-agent")
        .with_status(503)
        .create_async()
        .await;

    let signer = signer_for(&server, AgentCredential::generate());
    let err = signer.sign(&json!({})).await.unwrap_err();
    assert!(matches!(err, AuthError::Http(_)));
}

#[tokio::test]
async fn test_client_error_envelope_means_not_authorized() {
    let mut server = mockito::Server::new_async().await;

    let check = server
        .mock("POST", "/v1/check-agent")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":false,"msg":"agent not found","code":4004}"#)
        .expect(1)
        .create_async()
        .await;
    let exchange = server
        .mock("POST", "/v1/exchange")
        .with_status(200)
        .with_body(r#"{"success":true,"data":null,"code":0,"ts":1}"#)
        .expect(1)
        .create_async()
        .await;

    let signer = signer_for(&server, AgentCredential::generate());
    signer.sign(&json!({"symbol": "ETH"})).await.unwrap();

    check.assert_async().await;
    exchange.assert_async().await;
}
