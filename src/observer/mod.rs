//! Block, transaction and balance observer.
//!
//! # Architecture
//! ```text
//! connectivity::initialize ──► DeliveryMode::Push(HeadSubscription) ─┐
//!                          └─► DeliveryMode::Poll (BlockCursor) ──────┤
//!                                                                     ▼
//!                              BlockObserver ──► BlockHandler ──► EventSink
//!                              BalanceMonitor ─────────────────► EventSink
//! ```
//! The block observer and the balance monitor run as separate tasks and stop
//! together on shutdown.

pub mod balances;
pub mod connectivity;
pub mod cursor;
pub mod dispatcher;
pub mod events;
pub mod handler;
pub mod sink;
pub mod subscription;

pub use balances::BalanceMonitor;
pub use connectivity::{DeliveryMode, Readiness};
pub use dispatcher::BlockObserver;
pub use events::ObserverEvent;
pub use handler::BlockHandler;
pub use sink::{ConsoleSink, EventSink};

use alloy::primitives::Address;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::rpc::EthRpc;
use crate::blockchain::types::{NodeError, NodeResult};
use crate::config::ObserverConfig;
use crate::lifecycle::Shutdown;

/// Parse the configured watch-list.
pub fn watched_accounts(config: &ObserverConfig) -> NodeResult<Vec<Address>> {
    config
        .watched_accounts
        .iter()
        .map(|raw| {
            raw.parse::<Address>().map_err(|e| {
                NodeError::InvalidConfig(format!("Invalid watched account '{}': {}", raw, e))
            })
        })
        .collect()
}

/// Report network statistics, then run the block observer and the balance
/// monitor until `shutdown` fires.
pub async fn run(
    rpc: Arc<dyn EthRpc>,
    readiness_head: u64,
    chain_id: u64,
    delivery: DeliveryMode,
    config: &ObserverConfig,
    sink: Arc<dyn EventSink>,
    shutdown: &Shutdown,
) -> NodeResult<()> {
    let accounts = watched_accounts(config)?;

    let gas_price = match rpc.gas_price().await {
        Ok(price) => Some(price),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read gas price");
            None
        }
    };
    sink.emit(ObserverEvent::NetworkStats {
        block: readiness_head,
        chain_id,
        gas_price,
    });
    sink.emit(ObserverEvent::DeliveryStarted {
        push: delivery.is_push(),
        pending: delivery.watches_pending(),
    });

    let observer = BlockObserver::new(
        rpc.clone(),
        BlockHandler::new(accounts.iter().copied(), sink.clone()),
        Duration::from_secs(config.poll_interval_secs),
        Duration::from_secs(config.error_backoff_secs),
    );
    let monitor = BalanceMonitor::new(
        rpc,
        accounts,
        sink,
        Duration::from_secs(config.balance_interval_secs),
    );

    let blocks = tokio::spawn(observer.run(delivery, readiness_head, shutdown.subscribe()));
    let balances = tokio::spawn(monitor.run(shutdown.subscribe()));

    let (blocks, balances) = tokio::join!(blocks, balances);
    if let Err(e) = blocks {
        tracing::error!(error = %e, "Block observer task failed");
    }
    if let Err(e) = balances {
        tracing::error!(error = %e, "Balance monitor task failed");
    }

    Ok(())
}
