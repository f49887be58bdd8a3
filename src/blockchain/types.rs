//! Chain-specific types and error definitions.

use alloy::primitives::{Address, TxHash, B256, U256};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// How a caller should treat a failed node operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The flow cannot continue.
    Fatal,
    /// Transient; a loop may retry after its back-off.
    Retryable,
    /// Skip the item and carry on.
    Ignorable,
}

/// Errors that can occur during node operations.
#[derive(Debug, Error)]
pub enum NodeError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The node refused a submitted transaction.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Response or notification could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// WebSocket subscription failed.
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// A configured value could not be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NodeError {
    /// Classify the error for loop and flow control.
    pub fn severity(&self) -> Severity {
        match self {
            NodeError::Rpc(_) | NodeError::Timeout(_) | NodeError::Subscription(_) => {
                Severity::Retryable
            }
            NodeError::Malformed(_) => Severity::Ignorable,
            NodeError::Rejected(_)
            | NodeError::Wallet(_)
            | NodeError::ChainMismatch { .. }
            | NodeError::InvalidConfig(_) => Severity::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.severity() == Severity::Retryable
    }
}

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// A transaction as seen inside a fetched block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInfo {
    pub hash: TxHash,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    /// Effective gas price in wei.
    pub gas_price: u128,
    pub nonce: u64,
}

/// A block with its full transaction list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u64,
    pub hash: B256,
    /// Unix seconds.
    pub timestamp: u64,
    pub gas_used: u64,
    pub transactions: Vec<TxInfo>,
}

/// The parts of a transaction receipt the tools report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptInfo {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    /// `false` when the transaction reverted.
    pub success: bool,
}
