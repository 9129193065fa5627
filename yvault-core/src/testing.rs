//! Scripted chain and log builders shared by the indexer tests.

use crate::chain::bindings::{IYieldVault, VaultEventSignature};
use crate::chain::{BlockHeader, ChainClient, ChainError, RawLog};
use alloy::primitives::{Address, B256, Log, U256, address, keccak256};
use alloy::sol_types::SolEvent;
use alloy::transports::TransportErrorKind;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

pub(crate) const VAULT: Address = address!("00000000000000000000000000000000000000aa");
const SENDER: Address = address!("00000000000000000000000000000000000000ff");
const RECEIVER: Address = address!("00000000000000000000000000000000000000ee");

#[derive(Default)]
struct MockChainState {
    head: u64,
    logs: Vec<RawLog>,
    hidden_headers: HashSet<u64>,
    /// Blocks whose header reports a different number than requested.
    shifted_headers: HashSet<u64>,
    head_failures: u32,
    log_queries: Vec<(u64, u64)>,
}

/// An in-memory node whose head, logs and failures are set by the test.
#[derive(Default)]
pub(crate) struct MockChain {
    state: Mutex<MockChainState>,
}

impl MockChain {
    pub(crate) fn new(head: u64) -> Self {
        let chain = Self::default();
        chain.set_head(head);
        chain
    }

    pub(crate) fn set_head(&self, head: u64) {
        self.state.lock().unwrap().head = head;
    }

    pub(crate) fn push_log(&self, log: RawLog) {
        self.state.lock().unwrap().logs.push(log);
    }

    /// Make `block_header(number)` answer `BlockNotFound` until revealed.
    pub(crate) fn hide_header(&self, number: u64) {
        self.state.lock().unwrap().hidden_headers.insert(number);
    }

    pub(crate) fn reveal_header(&self, number: u64) {
        self.state.lock().unwrap().hidden_headers.remove(&number);
    }

    /// Make `block_header(number)` return the header of `number + 1`.
    pub(crate) fn shift_header(&self, number: u64) {
        self.state.lock().unwrap().shifted_headers.insert(number);
    }

    /// Fail the next `count` head queries with a transport error.
    pub(crate) fn fail_head(&self, count: u32) {
        self.state.lock().unwrap().head_failures = count;
    }

    /// Distinct blocks whose logs were queried, ascending.
    pub(crate) fn queried_blocks(&self) -> Vec<u64> {
        let state = self.state.lock().unwrap();
        let mut blocks: Vec<u64> = state
            .log_queries
            .iter()
            .flat_map(|&(from, to)| from..=to)
            .collect();
        blocks.sort_unstable();
        blocks.dedup();
        blocks
    }

    pub(crate) fn clear_queries(&self) {
        self.state.lock().unwrap().log_queries.clear();
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn head_height(&self) -> Result<u64, ChainError> {
        let mut state = self.state.lock().unwrap();
        if state.head_failures > 0 {
            state.head_failures -= 1;
            return Err(TransportErrorKind::custom_str("node unavailable").into());
        }
        Ok(state.head)
    }

    async fn block_header(&self, number: u64) -> Result<BlockHeader, ChainError> {
        let state = self.state.lock().unwrap();
        if state.hidden_headers.contains(&number) || number > state.head {
            return Err(ChainError::BlockNotFound(number));
        }
        let number = if state.shifted_headers.contains(&number) {
            number + 1
        } else {
            number
        };
        Ok(BlockHeader {
            number,
            hash: block_hash(number),
        })
    }

    async fn query_logs(
        &self,
        signature: VaultEventSignature,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.log_queries.push((from_block, to_block));
        let mut logs: Vec<RawLog> = state
            .logs
            .iter()
            .filter(|log| {
                log.block_number >= from_block
                    && log.block_number <= to_block
                    && log.topics().first() == Some(&signature.topic())
            })
            .cloned()
            .collect();
        logs.sort_by_key(|log| (log.block_number, log.log_index));
        Ok(logs)
    }
}

pub(crate) fn block_hash(number: u64) -> B256 {
    B256::left_padding_from(&number.to_be_bytes())
}

/// Transaction hash derived from a short test label.
pub(crate) fn tx_hash(label: &str) -> B256 {
    keccak256(label.as_bytes())
}

fn raw_log<E: SolEvent>(block: u64, tx_label: &str, log_index: u32, event: &E) -> RawLog {
    RawLog {
        inner: Log {
            address: VAULT,
            data: event.encode_log_data(),
        },
        block_number: block,
        block_hash: Some(block_hash(block)),
        tx_hash: tx_hash(tx_label),
        log_index,
        removed: false,
    }
}

/// `Deposit(sender, owner, assets, shares)`
pub(crate) fn deposit_log(
    block: u64,
    tx_label: &str,
    log_index: u32,
    owner: &str,
    amount: u64,
    shares: u64,
) -> RawLog {
    let event = IYieldVault::Deposit {
        sender: SENDER,
        owner: owner.parse().unwrap(),
        assets: U256::from(amount),
        shares: U256::from(shares),
    };
    raw_log(block, tx_label, log_index, &event)
}

/// `Withdraw(sender, receiver, owner, assets, shares)`
pub(crate) fn withdraw_log(
    block: u64,
    tx_label: &str,
    log_index: u32,
    owner: &str,
    amount: u64,
    shares: u64,
) -> RawLog {
    let event = IYieldVault::Withdraw {
        sender: SENDER,
        receiver: RECEIVER,
        owner: owner.parse().unwrap(),
        assets: U256::from(amount),
        shares: U256::from(shares),
    };
    raw_log(block, tx_label, log_index, &event)
}
