//! The node operations both tools consume.
//!
//! [`NodeClient`](crate::blockchain::NodeClient) implements this over HTTP;
//! tests substitute an in-memory node.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::blockchain::types::{BlockInfo, ChainId, NodeResult, ReceiptInfo, TxInfo};

/// Read/write access to an Ethereum JSON-RPC node.
#[async_trait]
pub trait EthRpc: Send + Sync {
    /// `eth_chainId`.
    async fn chain_id(&self) -> NodeResult<ChainId>;

    /// `eth_blockNumber`.
    async fn block_number(&self) -> NodeResult<u64>;

    /// `eth_gasPrice`, in wei.
    async fn gas_price(&self) -> NodeResult<u128>;

    /// `eth_getBalance` at the latest block.
    async fn balance(&self, address: Address) -> NodeResult<U256>;

    /// `eth_getTransactionCount` at the latest block.
    async fn transaction_count(&self, address: Address) -> NodeResult<u64>;

    /// `eth_getBlockByNumber` with full transaction objects.
    /// `None` if the node does not know the block yet.
    async fn block_with_transactions(&self, number: u64) -> NodeResult<Option<BlockInfo>>;

    /// `eth_getTransactionByHash`. `None` if the node does not know it (or
    /// already dropped it from the pool).
    async fn transaction_by_hash(&self, hash: TxHash) -> NodeResult<Option<TxInfo>>;

    /// `eth_sendRawTransaction`. Returns the hash reported by the node.
    async fn send_raw_transaction(&self, raw: &[u8]) -> NodeResult<TxHash>;

    /// `eth_getTransactionReceipt`. `None` means not yet mined.
    async fn transaction_receipt(&self, hash: TxHash) -> NodeResult<Option<ReceiptInfo>>;
}
