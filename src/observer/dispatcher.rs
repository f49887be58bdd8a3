//! Block delivery: push notifications or HTTP polling, feeding the handler.
//! In push mode, announced pending transactions are fetched and filtered too.

use alloy::primitives::TxHash;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::rpc::EthRpc;
use crate::blockchain::types::{NodeResult, Severity};
use crate::lifecycle::ShutdownListener;
use crate::observer::connectivity::DeliveryMode;
use crate::observer::cursor::BlockCursor;
use crate::observer::handler::BlockHandler;
use crate::observer::subscription::{HeadSubscription, PushNotice};

/// Drives blocks from the node into a [`BlockHandler`] until shutdown.
pub struct BlockObserver {
    rpc: Arc<dyn EthRpc>,
    handler: BlockHandler,
    poll_interval: Duration,
    error_backoff: Duration,
}

impl BlockObserver {
    pub fn new(
        rpc: Arc<dyn EthRpc>,
        handler: BlockHandler,
        poll_interval: Duration,
        error_backoff: Duration,
    ) -> Self {
        Self {
            rpc,
            handler,
            poll_interval,
            error_backoff,
        }
    }

    /// Run in the given delivery mode. `start_head` is the head observed at
    /// startup; polling dispatches only blocks after it.
    pub async fn run(self, mode: DeliveryMode, start_head: u64, listener: ShutdownListener) {
        match mode {
            DeliveryMode::Push(subscription) => self.run_push(subscription, listener).await,
            DeliveryMode::Poll => self.run_poll(start_head, listener).await,
        }
    }

    async fn run_push(&self, mut subscription: HeadSubscription, mut listener: ShutdownListener) {
        tracing::info!(
            subscription = subscription.id(),
            pending = subscription.watches_pending(),
            "Block observer started (push)"
        );

        loop {
            let next = tokio::select! {
                next = subscription.next_notice() => next,
                _ = listener.wait() => {
                    tracing::info!("Block observer received shutdown signal");
                    break;
                }
            };

            let notice = match next {
                Ok(Some(notice)) => notice,
                Ok(None) => {
                    tracing::warn!("Node closed the block subscription");
                    break;
                }
                Err(e) if e.severity() == Severity::Ignorable => {
                    tracing::warn!(error = %e, "Skipping malformed subscription message");
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Block subscription failed");
                    break;
                }
            };

            let work = async {
                match notice {
                    PushNotice::Head(head) => {
                        tracing::debug!(block = head.number, hash = %head.hash, "New head");
                        self.dispatch(head.number).await;
                    }
                    PushNotice::PendingTransaction(hash) => self.dispatch_pending(hash).await,
                }
            };

            tokio::select! {
                _ = work => {}
                _ = listener.wait() => {
                    tracing::info!("Block observer received shutdown signal");
                    break;
                }
            }
        }

        subscription.close().await;
        tracing::info!("Block observer stopped");
    }

    /// Fetch one announced block and hand it over. Failures are logged only.
    async fn dispatch(&self, number: u64) {
        match self.rpc.block_with_transactions(number).await {
            Ok(Some(block)) => {
                self.handler.handle_block(&block);
            }
            Ok(None) => tracing::warn!(block = number, "Announced block not available"),
            Err(e) => tracing::warn!(block = number, error = %e, "Failed to fetch block"),
        }
    }

    /// Fetch one announced pool transaction and hand it over. A transaction
    /// already gone from the pool is skipped quietly.
    async fn dispatch_pending(&self, hash: TxHash) {
        match self.rpc.transaction_by_hash(hash).await {
            Ok(Some(tx)) => {
                self.handler.handle_pending(&tx);
            }
            Ok(None) => tracing::debug!(%hash, "Pending transaction no longer known"),
            Err(e) => tracing::warn!(%hash, error = %e, "Failed to fetch pending transaction"),
        }
    }

    async fn run_poll(&self, start_head: u64, mut listener: ShutdownListener) {
        tracing::info!(
            start_head,
            interval_ms = self.poll_interval.as_millis() as u64,
            "Block observer started (polling)"
        );
        let mut cursor = BlockCursor::new(start_head);

        loop {
            let result = tokio::select! {
                result = self.poll_once(&mut cursor) => result,
                _ = listener.wait() => break,
            };

            let pause = match result {
                Ok(_) => self.poll_interval,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        last_seen = cursor.last_seen(),
                        backoff_ms = self.error_backoff.as_millis() as u64,
                        "Block polling failed, backing off"
                    );
                    self.error_backoff
                }
            };

            if !listener.sleep(pause).await {
                break;
            }
        }

        tracing::info!(last_seen = cursor.last_seen(), "Block observer stopped");
    }

    /// One polling round: read the head and dispatch every block after the
    /// cursor, in order. Returns how many blocks were dispatched.
    ///
    /// The cursor moves past each block as it is handled, so an error midway
    /// resumes at the block that failed. A block the node does not return
    /// yet ends the round without being skipped.
    pub async fn poll_once(&self, cursor: &mut BlockCursor) -> NodeResult<usize> {
        let head = self.rpc.block_number().await?;
        let mut dispatched = 0;

        for number in cursor.pending(head) {
            match self.rpc.block_with_transactions(number).await {
                Ok(Some(block)) => {
                    self.handler.handle_block(&block);
                    dispatched += 1;
                }
                Ok(None) => {
                    tracing::debug!(block = number, head, "Block not available yet");
                    break;
                }
                Err(e) if e.severity() == Severity::Ignorable => {
                    tracing::warn!(block = number, error = %e, "Skipping undecodable block");
                }
                Err(e) => return Err(e),
            }
            cursor.advance(number);
        }

        Ok(dispatched)
    }
}
