//! node-pulse observer.
//!
//! Connects to an Ethereum node, then reports every new block, the
//! transactions in it that matter, and balance changes of watched accounts
//! until interrupted.
//!
//! ```text
//!   HTTP ──► connectivity ──► WebSocket newHeads? ──yes──► push delivery
//!                                   │no
//!                                   └──────────────────► poll delivery
//!   both ──► BlockHandler ──► stdout
//!   HTTP ──► BalanceMonitor ──► stdout
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use node_pulse::blockchain::EthRpc;
use node_pulse::config::load_or_default;
use node_pulse::lifecycle::{signals, Shutdown};
use node_pulse::observability::{logging, metrics};
use node_pulse::observer::{self, connectivity, ConsoleSink};

#[derive(Parser)]
#[command(name = "node-pulse")]
#[command(about = "Watch an Ethereum node for new blocks, transactions and balance changes", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the HTTP JSON-RPC endpoint
    #[arg(long)]
    http_url: Option<String>,

    /// Override the WebSocket endpoint
    #[arg(long)]
    ws_url: Option<String>,

    /// Poll over HTTP even if WebSocket is available
    #[arg(long)]
    poll: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(url) = cli.http_url {
        config.node.http_url = url;
    }
    if let Some(url) = cli.ws_url {
        config.node.ws_url = url;
    }
    if cli.poll {
        config.observer.use_push = false;
    }

    logging::init_logging(&config.observability);
    tracing::info!("node-pulse v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(address) = &config.observability.metrics_address {
        match address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(metrics_address = %address, error = %e, "Failed to parse metrics address"),
        }
    }

    let readiness = match connectivity::initialize(
        &config.node,
        config.observer.use_push,
        config.observer.watch_pending,
    )
    .await
    {
        Ok(readiness) => readiness,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start observer");
            eprintln!("Failed to connect to {}: {}", config.node.http_url, e);
            std::process::exit(1);
        }
    };

    println!("Watching {} account(s):", config.observer.watched_accounts.len());
    for account in &config.observer.watched_accounts {
        println!("   {}", account);
    }
    println!("Press Ctrl+C to stop\n");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let rpc: Arc<dyn EthRpc> = Arc::new(readiness.client);
    observer::run(
        rpc,
        readiness.head,
        readiness.chain_id,
        readiness.delivery,
        &config.observer,
        Arc::new(ConsoleSink),
        &shutdown,
    )
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
