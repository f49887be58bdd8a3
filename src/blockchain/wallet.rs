//! Wallet management and transaction signing.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::consensus::{SignableTransaction, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;

use crate::blockchain::transaction::{SignedTransfer, TransferRequest};
use crate::blockchain::types::{NodeError, NodeResult};

/// A signing key bound to one chain.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
    /// Chain ID for EIP-155 replay protection.
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for transaction signing
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> NodeResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| NodeError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Wallet initialized"
        );

        Ok(Self { signer, chain_id })
    }

    /// Load wallet from the named environment variable.
    pub fn from_env(var: &str, chain_id: u64) -> NodeResult<Self> {
        let private_key = std::env::var(var)
            .map_err(|_| NodeError::Wallet(format!("Environment variable {} not set", var)))?;

        Self::from_private_key(&private_key, chain_id)
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain ID this wallet is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a transfer as a legacy EIP-155 transaction.
    pub fn sign_transfer(&self, request: &TransferRequest) -> NodeResult<SignedTransfer> {
        if request.chain_id != self.chain_id {
            return Err(NodeError::ChainMismatch {
                expected: self.chain_id,
                actual: request.chain_id,
            });
        }

        let tx = request.to_legacy();
        let signing_hash = tx.signature_hash();
        let signature = self
            .signer
            .sign_hash_sync(&signing_hash)
            .map_err(|e| NodeError::Wallet(format!("Signing failed: {}", e)))?;

        let signed = tx.into_signed(signature);
        let hash = *signed.hash();
        let envelope = TxEnvelope::from(signed);

        Ok(SignedTransfer {
            request: request.clone(),
            raw: Bytes::from(envelope.encoded_2718()),
            hash,
            signature,
            signing_hash,
        })
    }
}
