//! Transfer building, signing, submission and receipt monitoring.
//!
//! # Responsibilities
//! - Build a plain value transfer from the sender's current nonce
//! - Sign locally and broadcast the raw payload
//! - Wait for the receipt with a bounded deadline
//! - Report balances before and after

use alloy::consensus::TxLegacy;
use alloy::primitives::{Address, Bytes, Signature, TxHash, TxKind, B256, U256};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::rpc::EthRpc;
use crate::blockchain::types::{NodeError, NodeResult, ReceiptInfo};
use crate::blockchain::units::{format_ether, format_gwei, gwei_to_wei};
use crate::blockchain::wallet::Wallet;
use crate::config::TransferConfig;

/// Gas used by a plain value transfer with no calldata.
pub const TRANSFER_GAS: u64 = 21_000;

/// A fully populated, unsigned transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub to: Address,
    /// Amount in wei.
    pub value: U256,
    pub gas_limit: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    pub nonce: u64,
    pub chain_id: u64,
}

impl TransferRequest {
    pub(crate) fn to_legacy(&self) -> TxLegacy {
        TxLegacy {
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.to),
            value: self.value,
            input: Bytes::new(),
        }
    }
}

/// A signed transfer, ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub struct SignedTransfer {
    pub request: TransferRequest,
    /// EIP-2718 encoding of the signed transaction.
    pub raw: Bytes,
    /// Locally computed transaction hash.
    pub hash: TxHash,
    pub signature: Signature,
    pub(crate) signing_hash: B256,
}

impl SignedTransfer {
    /// Recover the address that produced the signature.
    pub fn recover_signer(&self) -> NodeResult<Address> {
        self.signature
            .recover_address_from_prehash(&self.signing_hash)
            .map_err(|e| NodeError::Wallet(format!("Signature recovery failed: {}", e)))
    }
}

/// What became of a submitted transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptOutcome {
    /// Included in a block; `receipt.success` tells whether it reverted.
    Mined(ReceiptInfo),
    /// No receipt before the deadline. The transaction may still be mined.
    Pending { tx_hash: TxHash },
}

/// Balances of both parties at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancePair {
    pub from: U256,
    pub to: U256,
}

/// Everything the transfer run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub from: Address,
    pub request: TransferRequest,
    pub tx_hash: TxHash,
    pub before: BalancePair,
    pub after: BalancePair,
    pub outcome: ReceiptOutcome,
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sending from: {}", self.from)?;
        writeln!(f, "Sending to: {}", self.request.to)?;
        writeln!(f)?;
        writeln!(f, "Balances before transaction:")?;
        writeln!(f, "From: {} ETH", format_ether(self.before.from))?;
        writeln!(f, "To: {} ETH", format_ether(self.before.to))?;
        writeln!(f)?;
        writeln!(f, "Transaction details:")?;
        writeln!(f, "Amount: {} ETH", format_ether(self.request.value))?;
        writeln!(f, "Gas price: {} gwei", format_gwei(self.request.gas_price))?;
        writeln!(f, "Nonce: {}", self.request.nonce)?;
        writeln!(f, "Chain ID: {}", self.request.chain_id)?;
        writeln!(f)?;
        writeln!(f, "Transaction sent: {}", self.tx_hash)?;
        match &self.outcome {
            ReceiptOutcome::Mined(receipt) => {
                if receipt.success {
                    writeln!(f, "Transaction confirmed!")?;
                } else {
                    writeln!(f, "Transaction reverted!")?;
                }
                writeln!(f, "Block number: {}", receipt.block_number)?;
                writeln!(f, "Gas used: {}", receipt.gas_used)?;
            }
            ReceiptOutcome::Pending { tx_hash } => {
                writeln!(f, "Transaction sent but not confirmed yet: {}", tx_hash)?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Balances after transaction:")?;
        writeln!(f, "From: {} ETH", format_ether(self.after.from))?;
        write!(f, "To: {} ETH", format_ether(self.after.to))
    }
}

/// Knobs for a transfer run, derived from [`TransferConfig`].
#[derive(Debug, Clone)]
pub struct TransferSettings {
    pub gas_limit: u64,
    /// Fixed price in wei; `None` asks the node.
    pub gas_price: Option<u128>,
    /// `None` waits for the receipt indefinitely.
    pub receipt_timeout: Option<Duration>,
    pub receipt_poll_interval: Duration,
}

impl TransferSettings {
    pub fn from_config(config: &TransferConfig) -> Self {
        Self {
            gas_limit: config.gas_limit,
            gas_price: config.gas_price_gwei.map(gwei_to_wei),
            receipt_timeout: match config.receipt_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            receipt_poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
        }
    }
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self::from_config(&TransferConfig::default())
    }
}

/// Runs one transfer from a wallet against a node.
pub struct TransferSubmitter {
    rpc: Arc<dyn EthRpc>,
    wallet: Wallet,
    settings: TransferSettings,
}

impl TransferSubmitter {
    pub fn new(rpc: Arc<dyn EthRpc>, wallet: Wallet, settings: TransferSettings) -> Self {
        Self {
            rpc,
            wallet,
            settings,
        }
    }

    /// Send `value` wei to `to` and wait for the outcome.
    ///
    /// Each step depends on the previous one succeeding; the first failure
    /// is returned and nothing is retried.
    pub async fn execute(&self, to: Address, value: U256) -> NodeResult<TransferReport> {
        let from = self.wallet.address();

        self.verify_connectivity().await?;

        let before = self.balances(from, to).await?;
        tracing::info!(
            %from,
            %to,
            from_balance = %format_ether(before.from),
            to_balance = %format_ether(before.to),
            "Balances before transfer"
        );

        let request = self.build(to, value).await?;
        let signed = self.wallet.sign_transfer(&request)?;

        let tx_hash = self.submit(&signed).await?;
        let outcome = self.wait_for_receipt(tx_hash).await?;

        let after = self.balances(from, to).await?;

        Ok(TransferReport {
            from,
            request,
            tx_hash,
            before,
            after,
            outcome,
        })
    }

    async fn verify_connectivity(&self) -> NodeResult<()> {
        let block = self.rpc.block_number().await?;
        let chain_id = self.rpc.chain_id().await?;
        if chain_id.0 != self.wallet.chain_id() {
            return Err(NodeError::ChainMismatch {
                expected: self.wallet.chain_id(),
                actual: chain_id.0,
            });
        }
        tracing::info!(block, chain_id = chain_id.0, "Connected to node");
        Ok(())
    }

    async fn balances(&self, from: Address, to: Address) -> NodeResult<BalancePair> {
        Ok(BalancePair {
            from: self.rpc.balance(from).await?,
            to: self.rpc.balance(to).await?,
        })
    }

    /// Assemble the request from the sender's current on-chain nonce.
    pub async fn build(&self, to: Address, value: U256) -> NodeResult<TransferRequest> {
        let nonce = self.rpc.transaction_count(self.wallet.address()).await?;

        let gas_price = match self.settings.gas_price {
            Some(price) => price,
            None => self.rpc.gas_price().await?,
        };

        Ok(TransferRequest {
            to,
            value,
            gas_limit: self.settings.gas_limit,
            gas_price,
            nonce,
            chain_id: self.wallet.chain_id(),
        })
    }

    async fn submit(&self, signed: &SignedTransfer) -> NodeResult<TxHash> {
        let node_hash = self.rpc.send_raw_transaction(&signed.raw).await?;
        if node_hash != signed.hash {
            tracing::warn!(
                local = %signed.hash,
                node = %node_hash,
                "Node reported a different transaction hash"
            );
        }
        tracing::info!(
            tx_hash = %node_hash,
            nonce = signed.request.nonce,
            "Transaction sent"
        );
        Ok(node_hash)
    }

    /// Poll for the receipt until it appears or the deadline passes.
    pub async fn wait_for_receipt(&self, tx_hash: TxHash) -> NodeResult<ReceiptOutcome> {
        let poll = async {
            let mut ticker = interval(self.settings.receipt_poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match self.rpc.transaction_receipt(tx_hash).await? {
                    Some(receipt) => return Ok(ReceiptOutcome::Mined(receipt)),
                    None => tracing::debug!(tx_hash = %tx_hash, "Transaction pending"),
                }
            }
        };

        match self.settings.receipt_timeout {
            Some(limit) => match timeout(limit, poll).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(
                        tx_hash = %tx_hash,
                        timeout_secs = limit.as_secs(),
                        "No receipt before deadline"
                    );
                    Ok(ReceiptOutcome::Pending { tx_hash })
                }
            },
            None => poll.await,
        }
    }
}
