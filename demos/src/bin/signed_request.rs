//! Demo 3: Signed REST Request
//!
//! Showcases: agent delegation on first use, read-only vs signed headers,
//! envelope decoding
//!
//! Run: LITLAYER_PRIVATE_KEY=0x... cargo run --bin signed_request

use colored::*;
use litlayer_sdk::prelude::*;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = LitlayerClient::builder().build()?;
    let rest = client.rest();

    println!("{} owner {}", "•".cyan(), client.owner_address());
    println!("{} agent {}", "•".cyan(), client.agent_address());

    if !client.health_check().await? {
        println!("{} API unhealthy", "✗".red());
        return Ok(());
    }

    // Read-only: platform and chain headers only
    let orders: Value = rest
        .get(
            "v1/orders",
            &Query::new()
                .with("address", client.owner_address())
                .with("page", 1),
            &[],
        )
        .await?;
    println!("{} open orders: {}", "✓".green(), orders);

    // Signed: delegates the agent if the registry does not know it yet
    client.authorize().await?;
    let result: Result<Value, RestError> = rest
        .post("v1/leverage", &json!({"symbol": "ETH", "leverage": 5}), &[])
        .await;
    match result {
        Ok(data) => println!("{} leverage set: {}", "✓".green(), data),
        Err(RestError::Api { code, message }) => {
            println!("{} API rejected ({}): {}", "✗".red(), code, message)
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
