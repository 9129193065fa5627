//! Validated runtime configuration.
//!
//! File parsing lives in the server crate; these are the types the core
//! consumes once loading and validation are done.

mod admin;

pub use admin::{AdminCredentials, hash_secret};

use crate::utils::retry::RetryPolicy;
use alloy::primitives::Address;
use std::time::Duration;
use url::Url;

/// Number of blocks stacked on top of a block before it is indexed.
pub const DEFAULT_CONFIRMATIONS: u64 = 3;
/// Idle wait when no newly finalized block exists.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);
/// Wait after a failed cycle.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_millis(5000);

/// Sync loop settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    pub confirmations: u64,
    pub poll_interval: Duration,
    pub retry_policy: RetryPolicy,
    /// First block to index when no cursor has been persisted yet.
    pub start_block: u64,
    /// Upper bound on blocks applied before the cursor is persisted.
    pub max_blocks_per_cycle: Option<u64>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            confirmations: DEFAULT_CONFIRMATIONS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_policy: RetryPolicy::Fixed(DEFAULT_ERROR_BACKOFF),
            start_block: 0,
            max_blocks_per_cycle: None,
        }
    }
}

impl IndexerConfig {
    /// Cursor value used before the first batch has committed.
    pub fn initial_cursor(&self) -> u64 {
        self.start_block.saturating_sub(1)
    }
}

/// Chain access settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub rpc_url: Url,
    pub vault_address: Address,
    /// Falls back to `eth_chainId` when unset.
    pub chain_id: Option<u64>,
    pub receipt_timeout: Duration,
}
