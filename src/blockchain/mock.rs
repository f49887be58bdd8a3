//! An in-memory node for unit tests. Canned chain state is set up through
//! the builder; every call is counted so tests can assert on traffic.

use alloy::primitives::{keccak256, Address, TxHash, U256};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::rpc::EthRpc;
use super::types::{BlockInfo, ChainId, NodeError, NodeResult, ReceiptInfo, TxInfo};

/// Well-known dev key (first Anvil/Hardhat account).
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub struct MockNode {
    chain_id: u64,
    gas_price: u128,
    nonce: u64,
    /// Scripted `eth_blockNumber` answers; the last one repeats. `Err` simulates an outage.
    heads: Mutex<VecDeque<Result<u64, String>>>,
    last_head: Mutex<u64>,
    blocks: HashMap<u64, BlockInfo>,
    /// Blocks the node answers with an undecodable payload.
    malformed_blocks: Vec<u64>,
    pool: HashMap<TxHash, TxInfo>,
    /// Scripted balances per account; the last one repeats.
    balances: Mutex<HashMap<Address, VecDeque<Result<U256, String>>>>,
    receipt_after_polls: Option<usize>,
    reject_with: Option<String>,
    sent: Mutex<Vec<Vec<u8>>>,
    calls: AtomicUsize,
    nonce_reads: AtomicUsize,
    receipt_reads: AtomicUsize,
    fetched_blocks: Mutex<Vec<u64>>,
}

impl MockNode {
    pub fn builder() -> MockNodeBuilder {
        MockNodeBuilder {
            chain_id: 1337,
            gas_price: 1_000_000_000,
            nonce: 0,
            heads: VecDeque::new(),
            blocks: HashMap::new(),
            malformed_blocks: Vec::new(),
            pool: HashMap::new(),
            balances: HashMap::new(),
            receipt_after_polls: Some(0),
            reject_with: None,
        }
    }

    /// Total RPC calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn nonce_reads(&self) -> usize {
        self.nonce_reads.load(Ordering::SeqCst)
    }

    pub fn receipt_reads(&self) -> usize {
        self.receipt_reads.load(Ordering::SeqCst)
    }

    pub fn sent_transactions(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    /// Block numbers requested through `eth_getBlockByNumber`, in order.
    pub fn fetched_blocks(&self) -> Vec<u64> {
        self.fetched_blocks.lock().unwrap().clone()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockNodeBuilder {
    chain_id: u64,
    gas_price: u128,
    nonce: u64,
    heads: VecDeque<Result<u64, String>>,
    blocks: HashMap<u64, BlockInfo>,
    malformed_blocks: Vec<u64>,
    pool: HashMap<TxHash, TxInfo>,
    balances: HashMap<Address, VecDeque<Result<U256, String>>>,
    receipt_after_polls: Option<usize>,
    reject_with: Option<String>,
}

impl MockNodeBuilder {
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn gas_price(mut self, wei: u128) -> Self {
        self.gas_price = wei;
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn heads(mut self, heads: &[u64]) -> Self {
        self.heads.extend(heads.iter().copied().map(Ok));
        self
    }

    pub fn head_error(mut self, message: &str) -> Self {
        self.heads.push_back(Err(message.to_string()));
        self
    }

    pub fn with_block(mut self, block: BlockInfo) -> Self {
        self.blocks.insert(block.number, block);
        self
    }

    /// Empty blocks for every number in `numbers`.
    pub fn with_empty_blocks(mut self, numbers: impl IntoIterator<Item = u64>) -> Self {
        for number in numbers {
            self.blocks.insert(number, empty_block(number));
        }
        self
    }

    pub fn malformed_block(mut self, number: u64) -> Self {
        self.malformed_blocks.push(number);
        self
    }

    /// A transaction `eth_getTransactionByHash` can find.
    pub fn with_pending(mut self, tx: TxInfo) -> Self {
        self.pool.insert(tx.hash, tx);
        self
    }

    pub fn balances(mut self, account: Address, values: &[u64]) -> Self {
        self.balances
            .entry(account)
            .or_default()
            .extend(values.iter().map(|v| Ok(U256::from(*v))));
        self
    }

    pub fn balance_error(mut self, account: Address, message: &str) -> Self {
        self.balances
            .entry(account)
            .or_default()
            .push_back(Err(message.to_string()));
        self
    }

    /// Receipts appear on the (n+1)-th poll.
    pub fn receipt_after_polls(mut self, polls: usize) -> Self {
        self.receipt_after_polls = Some(polls);
        self
    }

    pub fn never_mine(mut self) -> Self {
        self.receipt_after_polls = None;
        self
    }

    pub fn reject_with(mut self, message: &str) -> Self {
        self.reject_with = Some(message.to_string());
        self
    }

    pub fn build(self) -> MockNode {
        MockNode {
            chain_id: self.chain_id,
            gas_price: self.gas_price,
            nonce: self.nonce,
            heads: Mutex::new(self.heads),
            last_head: Mutex::new(0),
            blocks: self.blocks,
            malformed_blocks: self.malformed_blocks,
            pool: self.pool,
            balances: Mutex::new(self.balances),
            receipt_after_polls: self.receipt_after_polls,
            reject_with: self.reject_with,
            sent: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            nonce_reads: AtomicUsize::new(0),
            receipt_reads: AtomicUsize::new(0),
            fetched_blocks: Mutex::new(Vec::new()),
        }
    }
}

pub fn empty_block(number: u64) -> BlockInfo {
    BlockInfo {
        number,
        hash: keccak256(number.to_be_bytes()),
        timestamp: 1_700_000_000 + number,
        gas_used: 0,
        transactions: Vec::new(),
    }
}

/// Pop the next scripted value, keeping the last one sticky.
fn next_scripted<T: Clone>(queue: &mut VecDeque<Result<T, String>>) -> Option<Result<T, String>> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl EthRpc for MockNode {
    async fn chain_id(&self) -> NodeResult<ChainId> {
        self.touch();
        Ok(ChainId(self.chain_id))
    }

    async fn block_number(&self) -> NodeResult<u64> {
        self.touch();
        let mut heads = self.heads.lock().unwrap();
        let mut last = self.last_head.lock().unwrap();
        match next_scripted(&mut heads) {
            Some(Ok(head)) => {
                *last = head;
                Ok(head)
            }
            Some(Err(message)) => Err(NodeError::Rpc(message)),
            None => Ok(*last),
        }
    }

    async fn gas_price(&self) -> NodeResult<u128> {
        self.touch();
        Ok(self.gas_price)
    }

    async fn balance(&self, address: Address) -> NodeResult<U256> {
        self.touch();
        let mut balances = self.balances.lock().unwrap();
        match balances.get_mut(&address).and_then(next_scripted) {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(NodeError::Rpc(message)),
            None => Ok(U256::ZERO),
        }
    }

    async fn transaction_count(&self, _address: Address) -> NodeResult<u64> {
        self.touch();
        self.nonce_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.nonce)
    }

    async fn block_with_transactions(&self, number: u64) -> NodeResult<Option<BlockInfo>> {
        self.touch();
        self.fetched_blocks.lock().unwrap().push(number);
        if self.malformed_blocks.contains(&number) {
            return Err(NodeError::Malformed(format!("block {} does not decode", number)));
        }
        Ok(self.blocks.get(&number).cloned())
    }

    async fn transaction_by_hash(&self, hash: TxHash) -> NodeResult<Option<TxInfo>> {
        self.touch();
        Ok(self.pool.get(&hash).cloned())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> NodeResult<TxHash> {
        self.touch();
        if let Some(message) = &self.reject_with {
            return Err(NodeError::Rejected(message.clone()));
        }
        self.sent.lock().unwrap().push(raw.to_vec());
        Ok(keccak256(raw))
    }

    async fn transaction_receipt(&self, hash: TxHash) -> NodeResult<Option<ReceiptInfo>> {
        self.touch();
        let polls = self.receipt_reads.fetch_add(1, Ordering::SeqCst);
        Ok(match self.receipt_after_polls {
            Some(after) if polls >= after => Some(ReceiptInfo {
                tx_hash: hash,
                block_number: *self.last_head.lock().unwrap() + 1,
                gas_used: 21_000,
                success: true,
            }),
            _ => None,
        })
    }
}
