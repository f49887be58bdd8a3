//! Periodic balance reads for watched accounts.

use alloy::primitives::{Address, U256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::rpc::EthRpc;
use crate::lifecycle::ShutdownListener;
use crate::observability::metrics;
use crate::observer::events::{BalanceChange, ObserverEvent};
use crate::observer::sink::EventSink;

/// Reports balance movements of watched accounts between polls.
pub struct BalanceMonitor {
    rpc: Arc<dyn EthRpc>,
    accounts: Vec<Address>,
    /// Last successfully read balance per account.
    known: HashMap<Address, U256>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
}

impl BalanceMonitor {
    pub fn new(
        rpc: Arc<dyn EthRpc>,
        accounts: Vec<Address>,
        sink: Arc<dyn EventSink>,
        interval: Duration,
    ) -> Self {
        Self {
            rpc,
            accounts,
            known: HashMap::new(),
            sink,
            interval,
        }
    }

    /// Remembered balance for `account`, if it was ever read.
    pub fn known_balance(&self, account: &Address) -> Option<U256> {
        self.known.get(account).copied()
    }

    /// Read every balance once and report it as the starting point.
    pub async fn initialize(&mut self) {
        for account in self.accounts.clone() {
            match self.rpc.balance(account).await {
                Ok(balance) => {
                    self.known.insert(account, balance);
                    self.sink
                        .emit(ObserverEvent::InitialBalance { account, balance });
                }
                Err(e) => {
                    tracing::warn!(%account, error = %e, "Failed to read initial balance");
                }
            }
        }
    }

    /// One round: re-read every balance, report changes against the last
    /// known value, then remember the new one.
    pub async fn poll_once(&mut self) -> Vec<BalanceChange> {
        let mut changes = Vec::new();

        for account in self.accounts.clone() {
            let current = match self.rpc.balance(account).await {
                Ok(balance) => balance,
                Err(e) => {
                    tracing::warn!(%account, error = %e, "Failed to read balance, skipping");
                    continue;
                }
            };

            if let Some(previous) = self.known.insert(account, current) {
                if previous != current {
                    let change = BalanceChange {
                        account,
                        previous,
                        current,
                    };
                    metrics::record_balance_change();
                    self.sink.emit(ObserverEvent::BalanceChange(change));
                    changes.push(change);
                }
            }
        }

        changes
    }

    /// Initialize, then poll every interval until shutdown.
    pub async fn run(mut self, mut listener: ShutdownListener) {
        tracing::info!(
            accounts = self.accounts.len(),
            interval_secs = self.interval.as_secs(),
            "Balance monitor started"
        );

        tokio::select! {
            _ = self.initialize() => {}
            _ = listener.wait() => return,
        }

        while listener.sleep(self.interval).await {
            tokio::select! {
                changes = self.poll_once() => {
                    if !changes.is_empty() {
                        tracing::debug!(changes = changes.len(), "Balance round complete");
                    }
                }
                _ = listener.wait() => break,
            }
        }

        tracing::info!("Balance monitor stopped");
    }
}
