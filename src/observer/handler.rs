//! Per-block and per-transaction reporting.
//!
//! A transaction is shown when it touches a watched account OR moves a
//! nonzero amount; either condition alone is enough. Pending transactions
//! go through the same filter.

use alloy::primitives::Address;
use std::collections::HashSet;
use std::sync::Arc;

use crate::blockchain::types::{BlockInfo, TxInfo};
use crate::observability::metrics;
use crate::observer::events::{
    BlockSummary, Direction, Involvement, ObserverEvent, PendingTransactionEvent, TransactionEvent,
};
use crate::observer::sink::EventSink;

/// Inspects dispatched blocks against a fixed watch-list.
#[derive(Clone)]
pub struct BlockHandler {
    watched: HashSet<Address>,
    sink: Arc<dyn EventSink>,
}

impl BlockHandler {
    pub fn new(watched: impl IntoIterator<Item = Address>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            watched: watched.into_iter().collect(),
            sink,
        }
    }

    pub fn is_watched(&self, address: &Address) -> bool {
        self.watched.contains(address)
    }

    /// The watched side of `tx`, if any. A watched sender wins over a watched recipient.
    pub fn involvement(&self, tx: &TxInfo) -> Option<Involvement> {
        if self.is_watched(&tx.from) {
            return Some(Involvement {
                account: tx.from,
                direction: Direction::Sent,
            });
        }
        tx.to.filter(|to| self.is_watched(to)).map(|to| Involvement {
            account: to,
            direction: Direction::Received,
        })
    }

    /// `Some(involvement)` when `tx` passes the display filter.
    fn filter(&self, tx: &TxInfo) -> Option<Option<Involvement>> {
        let involvement = self.involvement(tx);
        if involvement.is_none() && tx.value.is_zero() {
            return None;
        }
        Some(involvement)
    }

    /// Build the event for `tx` if it passes the display filter.
    pub fn classify(&self, tx: &TxInfo, block_number: u64) -> Option<TransactionEvent> {
        self.filter(tx).map(|involvement| TransactionEvent {
            tx: tx.clone(),
            block_number,
            involvement,
        })
    }

    pub fn classify_pending(&self, tx: &TxInfo) -> Option<PendingTransactionEvent> {
        self.filter(tx).map(|involvement| PendingTransactionEvent {
            tx: tx.clone(),
            involvement,
        })
    }

    /// Report a pool transaction if it qualifies. Returns whether it was reported.
    pub fn handle_pending(&self, tx: &TxInfo) -> bool {
        let Some(event) = self.classify_pending(tx) else {
            return false;
        };
        let direction = event
            .involvement
            .map(|i| i.direction.as_str())
            .unwrap_or("other");
        metrics::record_pending_transaction(direction);
        self.sink.emit(ObserverEvent::PendingTransaction(event));
        true
    }

    /// Report a block and its qualifying transactions. Returns how many
    /// transactions were reported.
    pub fn handle_block(&self, block: &BlockInfo) -> usize {
        self.sink.emit(ObserverEvent::NewBlock(BlockSummary::from(block)));
        metrics::record_block_dispatched(block.number);

        let mut reported = 0;
        for tx in &block.transactions {
            if let Some(event) = self.classify(tx, block.number) {
                let direction = event
                    .involvement
                    .map(|i| i.direction.as_str())
                    .unwrap_or("other");
                metrics::record_transaction_reported(direction);
                self.sink.emit(ObserverEvent::Transaction(event));
                reported += 1;
            }
        }

        tracing::debug!(
            block = block.number,
            transactions = block.transactions.len(),
            reported,
            "Block handled"
        );
        reported
    }
}
