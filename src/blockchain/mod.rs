//! Node access, signing and the transfer flow.
//!
//! # Data Flow
//! ```text
//! Environment variable (private key)
//!     → wallet.rs (key loading, signing)
//! NodeConfig (RPC URL, timeouts)
//!     → client.rs (HTTP JSON-RPC with per-call deadlines, implements rpc.rs)
//! Both
//!     → transaction.rs (nonce, build, sign, broadcast, wait for receipt)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod rpc;
pub mod transaction;
pub mod types;
pub mod units;
pub mod wallet;

#[cfg(test)]
pub mod mock;

pub use client::NodeClient;
pub use rpc::EthRpc;
pub use transaction::{ReceiptOutcome, TransferReport, TransferSettings, TransferSubmitter};
pub use types::{BlockInfo, ChainId, NodeError, NodeResult, ReceiptInfo, Severity, TxInfo};
pub use wallet::Wallet;
