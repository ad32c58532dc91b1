//! Demo 2: Maker Session
//!
//! Showcases: owner-signed login, commands queued until the login is accepted,
//! per-request result observers
//!
//! Run: LITLAYER_PRIVATE_KEY=0x... cargo run --bin maker_session

use chrono::Utc;
use colored::*;
use litlayer_sdk::prelude::*;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("{}", "═".repeat(65).cyan());
    println!("{}", "  LITLAYER MAKER SESSION".cyan().bold());
    println!("{}", "═".repeat(65).cyan());

    let client = LitlayerClient::builder()
        .with_hooks(Hooks::new().on_error(|err| {
            println!("{} {}", "✗".red(), err);
        }))
        .build()?;
    let maker = client.maker_session();

    maker.on(ResultTag::LoginResponse, |login| {
        if login.is_success() {
            println!("{} session accepted", "✓".green());
        }
    });
    maker.on(ResultTag::PostResponse, |reply| {
        let id = reply.response().and_then(|r| r.id.clone()).unwrap_or_default();
        match reply.error() {
            None => println!("{} {} -> {:?}", "✓".green(), id, reply.data()),
            Some(error) => println!("{} {} -> {}", "✗".red(), id, error),
        }
    });
    maker.on(MakerChannel::JitAuction, |push| {
        let Some(data) = push.data() else { return };
        match serde_json::from_value::<JitAuctionData>(data.clone()) {
            Ok(auction) => println!(
                "{} JIT auction {}: {:?} {} {}",
                "⚡".yellow(),
                auction.user_order_hash,
                auction.order_side,
                auction.order_quantity,
                auction.pair_symbol
            ),
            Err(e) => println!("{} undecoded JIT auction: {}", "✗".red(), e),
        }
    });

    // Issued before connect: held until the login response arrives
    let expiry = (Utc::now().timestamp() + 3600) as u64;
    let order = LimitOrderData::new("ETH", OrderDirection::Long, dec!(1800), dec!(0.05), 5, expiry)
        .with_client_order_id("demo-1");
    let id = maker.limit_order(order, None)?;
    println!("{} queued limit order {}", "→".cyan(), id);

    maker.connect()?;

    tokio::signal::ctrl_c().await?;
    maker.cancel_order(
        CancelOrderData {
            order_no: None,
            client_order_id: Some("demo-1".into()),
        },
        None,
    )?;
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    maker.disconnect();
    Ok(())
}
