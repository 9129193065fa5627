//! API request and response types.
//!
//! Every token amount and share count crosses the wire as a base-10 string.
//! Token values exceed the integer range JSON numbers can carry safely.

pub mod admin;
pub mod ledger;

pub use admin::{AdminTxResponse, SimulateYieldRequest, UpdateCapRequest};
pub use ledger::{
    EventType, SyncStatusResponse, TransactionItem, TransactionsPage, TransactionsQuery,
    UserPositionResponse, VaultStatsResponse, clamp_page,
};
