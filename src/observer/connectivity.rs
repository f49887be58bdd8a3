//! Startup checks: reach the node over HTTP, then try to open a push channel.

use std::time::Duration;

use crate::blockchain::client::NodeClient;
use crate::blockchain::rpc::EthRpc;
use crate::blockchain::types::{NodeError, NodeResult};
use crate::config::NodeConfig;
use crate::observer::subscription::HeadSubscription;

/// How new blocks reach the observer.
#[derive(Debug)]
pub enum DeliveryMode {
    /// `newHeads` (and possibly `newPendingTransactions`) over WebSocket.
    Push(HeadSubscription),
    /// Periodic `eth_blockNumber` over HTTP.
    Poll,
}

impl DeliveryMode {
    pub fn is_push(&self) -> bool {
        matches!(self, DeliveryMode::Push(_))
    }

    pub fn watches_pending(&self) -> bool {
        match self {
            DeliveryMode::Push(subscription) => subscription.watches_pending(),
            DeliveryMode::Poll => false,
        }
    }
}

/// A node known to be reachable, plus how blocks will be delivered.
#[derive(Debug)]
pub struct Readiness {
    pub client: NodeClient,
    pub head: u64,
    pub chain_id: u64,
    pub delivery: DeliveryMode,
}

/// Check the node and pick a delivery mode.
///
/// The HTTP endpoint must answer `eth_blockNumber` and `eth_chainId`; failure
/// there is fatal. A chain ID other than the configured one is only warned
/// about. The push channel is optional: when `use_push` is off, `ws_url` is
/// empty, or the connection fails, delivery falls back to polling. With
/// `watch_pending`, pending transactions are subscribed to on the same
/// channel; a node that refuses that keeps head delivery only.
pub async fn initialize(config: &NodeConfig, use_push: bool, watch_pending: bool) -> NodeResult<Readiness> {
    let client = NodeClient::new(config.clone())?;

    let head = client.block_number().await.map_err(|e| {
        tracing::error!(http_url = %config.http_url, error = %e, "Node unreachable over HTTP");
        e
    })?;

    let chain_id = match client.verify_chain_id().await {
        Ok(id) => id.0,
        Err(NodeError::ChainMismatch { expected, actual }) => {
            tracing::warn!(expected, actual, "Connected node reports a different chain ID");
            actual
        }
        Err(e) => return Err(e),
    };

    tracing::info!(http_url = %config.http_url, head, chain_id, "Connected to node");

    let delivery = if !use_push {
        tracing::info!("Push delivery disabled, polling for blocks");
        DeliveryMode::Poll
    } else if config.ws_url.trim().is_empty() {
        tracing::info!("No WebSocket URL configured, polling for blocks");
        DeliveryMode::Poll
    } else {
        let connect_timeout = Duration::from_secs(config.ws_connect_timeout_secs);
        match HeadSubscription::connect(&config.ws_url, connect_timeout).await {
            Ok(mut subscription) => {
                if watch_pending {
                    if let Err(e) = subscription.subscribe_pending(connect_timeout).await {
                        tracing::warn!(error = %e, "Pending transactions unavailable, watching blocks only");
                    }
                }
                DeliveryMode::Push(subscription)
            }
            Err(e) => {
                tracing::warn!(
                    ws_url = %config.ws_url,
                    error = %e,
                    "WebSocket unavailable, falling back to HTTP polling"
                );
                DeliveryMode::Poll
            }
        }
    };

    Ok(Readiness {
        client,
        head,
        chain_id,
        delivery,
    })
}
