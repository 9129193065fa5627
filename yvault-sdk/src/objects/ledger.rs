//! Read API response types.

use serde::{Deserialize, Serialize};

/// Kind of vault event, as exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Deposit,
    Withdraw,
}

/// Aggregate vault totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultStatsResponse {
    pub total_deposits: String,
    pub total_withdrawals: String,
    pub total_shares: String,
    pub user_count: i64,
}

impl VaultStatsResponse {
    /// Totals reported before the first event has been indexed.
    pub fn empty() -> Self {
        Self {
            total_deposits: "0".to_owned(),
            total_withdrawals: "0".to_owned(),
            total_shares: "0".to_owned(),
            user_count: 0,
        }
    }
}

/// Totals of a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPositionResponse {
    pub address: String,
    pub total_deposits: String,
    pub total_withdrawals: String,
    pub total_shares: String,
}

impl UserPositionResponse {
    /// Position of an address that has never interacted with the vault.
    pub fn empty(address: String) -> Self {
        Self {
            address,
            total_deposits: "0".to_owned(),
            total_withdrawals: "0".to_owned(),
            total_shares: "0".to_owned(),
        }
    }
}

/// Indexer progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub last_processed_block: u64,
    pub last_safe_block: u64,
    pub confirmations: u64,
    /// Unix timestamp of the last cursor write, if any.
    pub updated_at: Option<i64>,
}

const DEFAULT_PAGE_LIMIT: u32 = 20;
const MAX_PAGE_LIMIT: u32 = 100;

/// Query parameters for listing a user's vault events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_confirmed")]
    pub confirmed: bool,
}

impl Default for TransactionsQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            confirmed: default_confirmed(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

fn default_confirmed() -> bool {
    true
}

/// Clamp page and limit to safe values, returning `(page, limit, offset)`.
pub fn clamp_page(page: u32, limit: u32) -> (u32, u32, u64) {
    let page = page.max(1);
    let limit = limit.clamp(1, MAX_PAGE_LIMIT);
    let offset = u64::from(page - 1) * u64::from(limit);
    (page, limit, offset)
}

/// One vault event in a user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub tx_hash: String,
    pub block_number: String,
    pub log_index: i32,
    pub event_type: EventType,
    pub amount: String,
    pub shares: String,
}

/// A page of a user's vault events, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsPage {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub transactions: Vec<TransactionItem>,
}
