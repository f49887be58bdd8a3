//! Events the observer reports, and how they read on a console.

use alloy::primitives::{Address, B256, I256, U256};
use std::fmt;

use crate::blockchain::types::{BlockInfo, TxInfo};
use crate::blockchain::units::{format_ether, format_ether_signed, format_gwei};

/// Which side of a transaction the watched account is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Sent => "sent",
            Direction::Received => "received",
        }
    }
}

/// A watched account taking part in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Involvement {
    pub account: Address,
    pub direction: Direction,
}

/// Header-level facts about a dispatched block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSummary {
    pub number: u64,
    pub hash: B256,
    pub timestamp: u64,
    pub transaction_count: usize,
    pub gas_used: u64,
}

impl From<&BlockInfo> for BlockSummary {
    fn from(block: &BlockInfo) -> Self {
        Self {
            number: block.number,
            hash: block.hash,
            timestamp: block.timestamp,
            transaction_count: block.transactions.len(),
            gas_used: block.gas_used,
        }
    }
}

/// A transaction that passed the display filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEvent {
    pub tx: TxInfo,
    pub block_number: u64,
    pub involvement: Option<Involvement>,
}

/// A transaction seen in the node's pool, not yet mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransactionEvent {
    pub tx: TxInfo,
    pub involvement: Option<Involvement>,
}

/// A watched account's balance moved between two polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub account: Address,
    pub previous: U256,
    pub current: U256,
}

impl BalanceChange {
    /// `current - previous` in wei.
    pub fn delta(&self) -> I256 {
        I256::from_raw(self.current).wrapping_sub(I256::from_raw(self.previous))
    }
}

/// Everything the observer prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    NetworkStats {
        block: u64,
        chain_id: u64,
        gas_price: Option<u128>,
    },
    DeliveryStarted {
        push: bool,
        pending: bool,
    },
    NewBlock(BlockSummary),
    Transaction(TransactionEvent),
    PendingTransaction(PendingTransactionEvent),
    InitialBalance {
        account: Address,
        balance: U256,
    },
    BalanceChange(BalanceChange),
}

impl fmt::Display for ObserverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObserverEvent::NetworkStats {
                block,
                chain_id,
                gas_price,
            } => {
                writeln!(f, "NETWORK STATISTICS")?;
                writeln!(f, "   Latest Block: #{}", block)?;
                write!(f, "   Chain ID: {}", chain_id)?;
                if let Some(price) = gas_price {
                    write!(f, "\n   Gas Price: {} gwei", format_gwei(*price))?;
                }
                Ok(())
            }
            ObserverEvent::DeliveryStarted { push: true, pending } => {
                write!(f, "Subscribed to new blocks over WebSocket")?;
                if *pending {
                    write!(f, " (with pending transactions)")?;
                }
                Ok(())
            }
            ObserverEvent::DeliveryStarted { push: false, .. } => {
                write!(f, "Polling for new blocks over HTTP")
            }
            ObserverEvent::NewBlock(block) => {
                writeln!(f, "\nNEW BLOCK #{}", block.number)?;
                writeln!(f, "   Hash: {}", block.hash)?;
                writeln!(f, "   Timestamp: {}", block.timestamp)?;
                writeln!(f, "   Transactions: {}", block.transaction_count)?;
                write!(f, "   Gas Used: {}", block.gas_used)
            }
            ObserverEvent::Transaction(event) => {
                let tx = &event.tx;
                writeln!(f, "\nNEW TRANSACTION")?;
                writeln!(f, "   Hash: {}", tx.hash)?;
                writeln!(f, "   From: {}", tx.from)?;
                match tx.to {
                    Some(to) => writeln!(f, "   To: {}", to)?,
                    None => writeln!(f, "   To: Contract Creation")?,
                }
                writeln!(f, "   Value: {} ETH", format_ether(tx.value))?;
                writeln!(f, "   Gas Price: {} gwei", format_gwei(tx.gas_price))?;
                write!(f, "   Block: #{}", event.block_number)?;
                write_involvement(f, event.involvement.as_ref())
            }
            ObserverEvent::PendingTransaction(event) => {
                let tx = &event.tx;
                writeln!(f, "\nPENDING TRANSACTION")?;
                writeln!(f, "   Hash: {}", tx.hash)?;
                writeln!(f, "   From: {}", tx.from)?;
                match tx.to {
                    Some(to) => writeln!(f, "   To: {}", to)?,
                    None => writeln!(f, "   To: Contract Creation")?,
                }
                writeln!(f, "   Value: {} ETH", format_ether(tx.value))?;
                write!(f, "   Gas Price: {} gwei", format_gwei(tx.gas_price))?;
                write_involvement(f, event.involvement.as_ref())
            }
            ObserverEvent::InitialBalance { account, balance } => {
                write!(f, "   {}: {} ETH", account, format_ether(*balance))
            }
            ObserverEvent::BalanceChange(change) => {
                let trend = if change.current > change.previous {
                    "up"
                } else {
                    "down"
                };
                writeln!(f, "\nBALANCE CHANGE ({})", trend)?;
                writeln!(f, "   Account: {}", change.account)?;
                writeln!(f, "   Previous: {} ETH", format_ether(change.previous))?;
                writeln!(f, "   Current: {} ETH", format_ether(change.current))?;
                write!(f, "   Change: {} ETH", format_ether_signed(change.delta()))
            }
        }
    }
}

fn write_involvement(f: &mut fmt::Formatter<'_>, involvement: Option<&Involvement>) -> fmt::Result {
    match involvement {
        Some(involvement) => {
            let label = match involvement.direction {
                Direction::Sent => "SENT",
                Direction::Received => "RECEIVED",
            };
            write!(f, "\n   {} by watched account {}", label, involvement.account)
        }
        None => Ok(()),
    }
}
