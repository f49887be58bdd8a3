//! Node RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC HTTP endpoint
//! - Query chain state (block number, balances, blocks, receipts)
//! - Submit raw signed transactions
//! - Put a deadline on every call and map failures to [`NodeError`]

use alloy::consensus::Transaction as ConsensusTx;
use alloy::eips::BlockNumberOrTag;
use alloy::network::{ReceiptResponse, TransactionResponse};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Block, Transaction};
use alloy::transports::{RpcError, TransportResult};
use async_trait::async_trait;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::rpc::EthRpc;
use crate::blockchain::types::{BlockInfo, ChainId, NodeError, NodeResult, ReceiptInfo, TxInfo};
use crate::config::NodeConfig;
use crate::observability::metrics;

/// HTTP JSON-RPC client for a single node.
#[derive(Clone)]
pub struct NodeClient {
    provider: Arc<dyn Provider + Send + Sync>,
    config: NodeConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl NodeClient {
    /// Create a client for `config.http_url`.
    ///
    /// No request is made here; use [`NodeClient::verify_chain_id`] or any
    /// read to check connectivity.
    pub fn new(config: NodeConfig) -> NodeResult<Self> {
        let url: url::Url = config.http_url.parse().map_err(|e| {
            NodeError::InvalidConfig(format!("Invalid RPC URL '{}': {}", config.http_url, e))
        })?;
        let provider = Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;

        tracing::debug!(
            http_url = %config.http_url,
            timeout_secs = config.rpc_timeout_secs,
            "Node client created"
        );

        Ok(Self {
            provider,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
        })
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> NodeResult<ChainId> {
        let chain_id = self.chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(NodeError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(chain_id)
    }

    async fn call<T, F>(&self, method: &'static str, fut: F) -> NodeResult<T>
    where
        F: IntoFuture<Output = TransportResult<T>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            // Answered, but not in the expected shape.
            Ok(Err(RpcError::DeserError { err, .. })) => {
                metrics::record_rpc_error(method);
                tracing::warn!(method, error = %err, "Undecodable RPC response");
                Err(NodeError::Malformed(format!("{} returned an undecodable response: {}", method, err)))
            }
            Ok(Err(e)) => {
                metrics::record_rpc_error(method);
                tracing::warn!(method, error = %e, "RPC error");
                Err(NodeError::Rpc(format!("{} failed: {}", method, e)))
            }
            Err(_) => {
                metrics::record_rpc_error(method);
                tracing::warn!(method, "RPC timeout");
                Err(NodeError::Timeout(self.config.rpc_timeout_secs))
            }
        }
    }
}

#[async_trait]
impl EthRpc for NodeClient {
    async fn chain_id(&self) -> NodeResult<ChainId> {
        self.call("eth_chainId", self.provider.get_chain_id())
            .await
            .map(ChainId)
    }

    async fn block_number(&self) -> NodeResult<u64> {
        self.call("eth_blockNumber", self.provider.get_block_number()).await
    }

    async fn gas_price(&self) -> NodeResult<u128> {
        self.call("eth_gasPrice", self.provider.get_gas_price()).await
    }

    async fn balance(&self, address: Address) -> NodeResult<U256> {
        self.call("eth_getBalance", self.provider.get_balance(address)).await
    }

    async fn transaction_count(&self, address: Address) -> NodeResult<u64> {
        self.call(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address),
        )
        .await
    }

    async fn block_with_transactions(&self, number: u64) -> NodeResult<Option<BlockInfo>> {
        let block = self
            .call(
                "eth_getBlockByNumber",
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Number(number))
                    .full(),
            )
            .await?;

        block.map(block_info).transpose()
    }

    async fn transaction_by_hash(&self, hash: TxHash) -> NodeResult<Option<TxInfo>> {
        let tx = self
            .call(
                "eth_getTransactionByHash",
                self.provider.get_transaction_by_hash(hash),
            )
            .await?;
        Ok(tx.map(|tx| tx_info(&tx, None)))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> NodeResult<TxHash> {
        match timeout(self.timeout_duration, self.provider.send_raw_transaction(raw)).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => {
                metrics::record_rpc_error("eth_sendRawTransaction");
                // An error payload means the node looked at the transaction and refused it.
                match e.as_error_resp() {
                    Some(payload) => Err(NodeError::Rejected(payload.message.to_string())),
                    None => Err(NodeError::Rpc(format!("eth_sendRawTransaction failed: {}", e))),
                }
            }
            Err(_) => {
                metrics::record_rpc_error("eth_sendRawTransaction");
                Err(NodeError::Timeout(self.config.rpc_timeout_secs))
            }
        }
    }

    async fn transaction_receipt(&self, hash: TxHash) -> NodeResult<Option<ReceiptInfo>> {
        let receipt = self
            .call(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(hash),
            )
            .await?;

        Ok(receipt.and_then(|r| {
            // Pending receipts (no block yet) are treated as absent.
            r.block_number().map(|block_number| ReceiptInfo {
                tx_hash: r.transaction_hash(),
                block_number,
                gas_used: r.gas_used(),
                success: r.status(),
            })
        }))
    }
}

fn block_info(block: Block) -> NodeResult<BlockInfo> {
    let base_fee = block.header.base_fee_per_gas;
    let txs: Vec<TxInfo> = block
        .transactions
        .txns()
        .map(|tx| tx_info(tx, base_fee))
        .collect();

    if txs.len() != block.transactions.len() {
        return Err(NodeError::Malformed(format!(
            "block {} returned transaction hashes instead of objects",
            block.header.number
        )));
    }

    Ok(BlockInfo {
        number: block.header.number,
        hash: block.header.hash,
        timestamp: block.header.timestamp,
        gas_used: block.header.gas_used,
        transactions: txs,
    })
}

fn tx_info(tx: &Transaction, base_fee: Option<u64>) -> TxInfo {
    TxInfo {
        hash: TransactionResponse::tx_hash(tx),
        from: TransactionResponse::from(tx),
        to: ConsensusTx::to(tx),
        value: ConsensusTx::value(tx),
        gas_price: ConsensusTx::effective_gas_price(tx, base_fee),
        nonce: ConsensusTx::nonce(tx),
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("http_url", &self.config.http_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
