//! Demo 1: Market Stream
//!
//! Showcases: buffered subscriptions, channel observers, fixed-delay reconnect
//!
//! Run: RUST_LOG=litlayer_ws=debug cargo run --bin market_stream

use colored::*;
use litlayer_sdk::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("{}", "═".repeat(65).cyan());
    println!("{}", "  LITLAYER MARKET STREAM".cyan().bold());
    println!("{}", "═".repeat(65).cyan());

    let hooks = Hooks::new()
        .on_open(|info| {
            let label = if info.is_reconnection { "reconnected" } else { "connected" };
            println!("{} {} to {}", "✓".green(), label, info.url);
        })
        .on_close(|info| {
            println!("{} closed: {:?} (reconnect: {})", "✗".red(), info.reason, info.will_reconnect);
        })
        .on_reconnect_attempt(|attempt, delay| {
            println!("{} reconnect attempt {} in {:?}", "↻".yellow(), attempt, delay);
        });

    let connection = StreamConnection::builder(ConnectionConfig::for_endpoint(Endpoint::Testnet))
        .hooks(hooks)
        .build();
    let stream = UserStream::from_connection(connection);

    let pushes = Arc::new(AtomicU64::new(0));

    stream.on(ResultTag::SubscriptionResponse, |ack| {
        let id = ack.response().and_then(|r| r.id.clone()).unwrap_or_default();
        if ack.is_success() {
            println!("{} subscription {} acknowledged", "✓".green(), id);
        } else {
            println!("{} subscription {} rejected: {:?}", "✗".red(), id, ack.error());
        }
    });

    let counter = pushes.clone();
    stream.on(SymbolChannel::Market, move |push| {
        let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
        let Some(data) = push.data() else { return };
        match serde_json::from_value::<MarketData>(data.clone()) {
            Ok(market) => println!(
                "  {:>6}  {:<8} mark {} (24h {}) funding {}",
                n.to_string().white().bold(),
                market.symbol,
                market.mark_px,
                market.px.past24h,
                market.funding_rate
            ),
            Err(e) => println!("  {:>6}  {} {}", n, "undecoded:".red(), e),
        }
    });

    stream.on(SymbolChannel::Trade, |push| {
        let Some(data) = push.data() else { return };
        if let Ok(trades) = serde_json::from_value::<Vec<TradeData>>(data.clone()) {
            for trade in trades {
                println!("  {} {} {} @ {}", "trade".blue(), trade.side, trade.sz, trade.px);
            }
        }
    });

    // Buffered now, sent in order once the socket opens
    stream.subscribe_symbol(SymbolChannel::Market, "*", Some("market-all"))?;
    stream.subscribe_symbol(SymbolChannel::Trade, "ETH", Some("trade-eth"))?;
    stream.connect()?;

    tokio::signal::ctrl_c().await?;
    stream.disconnect();
    println!("\n{} {} market pushes received", "■".cyan(), pushes.load(Ordering::Relaxed));
    Ok(())
}
