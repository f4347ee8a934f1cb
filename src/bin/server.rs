//! Record ledger server binary
//!
//! Opens the ledger, tails the live event feed as JSON lines, and shuts
//! down cleanly on ctrl-c.

use anyhow::Context;
use record_ledger::{Config, Ledger, Principal};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting record ledger server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Owner identity is supplied by the hosting environment
    let deployer = Principal::new(
        std::env::var("LEDGER_OWNER").unwrap_or_else(|_| "deployer".to_string()),
    );

    // Open ledger
    let ledger = Ledger::open(config, deployer)
        .await
        .context("Failed to open ledger")?;
    tracing::info!(
        owner = %ledger.owner().await?,
        total_operations = ledger.total_operations().await?,
        "Ledger opened"
    );

    // Tail committed events as JSON lines
    let mut events = BroadcastStream::new(ledger.subscribe());
    let tail = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!("Failed to encode event: {}", e),
                },
                Err(lag) => tracing::warn!("Event tail lagged: {}", lag),
            }
        }
    });

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down record ledger server");
    ledger.shutdown().await?;
    tail.abort();
    Ok(())
}
