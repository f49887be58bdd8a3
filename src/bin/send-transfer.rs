//! Sign and submit a single ether transfer, then wait for its receipt.
//!
//! The private key is read from the environment variable named by
//! `transfer.private_key_env` (default `NODE_PULSE_PRIVATE_KEY`).

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use node_pulse::blockchain::units::parse_ether;
use node_pulse::blockchain::{NodeClient, TransferSettings, TransferSubmitter, Wallet};
use node_pulse::config::load_or_default;
use node_pulse::observability::logging;

#[derive(Parser)]
#[command(name = "send-transfer")]
#[command(about = "Send ether from the configured account and wait for the receipt", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recipient address (overrides transfer.to_address)
    #[arg(long)]
    to: Option<String>,

    /// Amount in ether (overrides transfer.amount_eth)
    #[arg(long)]
    amount: Option<String>,

    /// Override the HTTP JSON-RPC endpoint
    #[arg(long)]
    http_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(url) = cli.http_url {
        config.node.http_url = url;
    }
    if let Some(to) = cli.to {
        config.transfer.to_address = to;
    }
    if let Some(amount) = cli.amount {
        config.transfer.amount_eth = amount;
    }

    logging::init_logging(&config.observability);

    let to = config.transfer.to_address.parse()?;
    let value = parse_ether(&config.transfer.amount_eth)?;

    let wallet = Wallet::from_env(&config.transfer.private_key_env, config.node.chain_id)?;
    let client = NodeClient::new(config.node.clone())?;
    let submitter = TransferSubmitter::new(
        Arc::new(client),
        wallet,
        TransferSettings::from_config(&config.transfer),
    );

    match submitter.execute(to, value).await {
        Ok(report) => {
            println!("{}", report);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, severity = ?e.severity(), "Transfer failed");
            eprintln!("Transfer failed: {}", e);
            std::process::exit(1);
        }
    }
}
