//! The ledger store: events, global totals, per-user positions and the sync
//! cursor.
//!
//! [`LedgerStore`] is the seam between the indexer and persistence. Writes for
//! one block go through a single [`LedgerTransaction`]; nothing is visible
//! until it commits, and dropping it uncommitted discards everything.

pub mod memory;
pub mod postgres;

pub use memory::{Failpoint, LedgerSnapshot, MemoryLedger};
pub use postgres::PgLedger;

use crate::entities::EventKind;
use async_trait::async_trait;
use alloy::primitives::U256;
use bigdecimal::num_bigint::{BigInt, Sign};
use thiserror::Error;
use tracing::debug;

/// Errors from the ledger backend.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A value read or written does not fit the column type.
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("ledger backend error: {0}")]
    Backend(String),
}

/// Outcome of an event insert. A duplicate key is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    Inserted,
    AlreadyExists,
}

/// Whether a position upsert created the row or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionUpsert {
    Created,
    Updated,
}

/// A decoded event ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVaultEvent {
    pub chain_id: u64,
    pub contract_address: String,
    pub tx_hash: String,
    pub log_index: u32,
    pub block_number: u64,
    pub block_hash: String,
    pub event_type: EventKind,
    /// Lowercase `0x` hex.
    pub user_address: String,
    pub amount: U256,
    pub shares: U256,
    /// Set once the block is buried under the confirmation depth.
    pub confirmed: bool,
}

/// Signed change one event makes to the running totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDelta {
    pub deposits: BigInt,
    pub withdrawals: BigInt,
    pub shares: BigInt,
}

impl LedgerDelta {
    pub fn from_event(event_type: EventKind, amount: &U256, shares: &U256) -> Self {
        let amount = u256_to_bigint(amount);
        let shares = u256_to_bigint(shares);
        match event_type {
            EventKind::Deposit => Self {
                deposits: amount,
                withdrawals: BigInt::from(0),
                shares,
            },
            EventKind::Withdraw => Self {
                deposits: BigInt::from(0),
                withdrawals: amount,
                shares: -shares,
            },
        }
    }
}

pub fn u256_to_bigint(value: &U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

/// Global vault totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultTotals {
    pub total_deposits: BigInt,
    pub total_withdrawals: BigInt,
    pub total_shares: BigInt,
    pub user_count: i64,
}

/// Running totals for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionTotals {
    pub total_deposits: BigInt,
    pub total_withdrawals: BigInt,
    pub total_shares: BigInt,
}

/// Durable state the indexer reads and writes.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Last block whose range was fully applied, if any cycle has completed.
    async fn sync_cursor(&self) -> Result<Option<u64>, LedgerError>;

    /// Persist the cursor at `block`. Never moves it backwards; returns the
    /// stored value.
    async fn advance_cursor(&self, block: u64) -> Result<u64, LedgerError>;

    /// Open the atomic write scope for one block.
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, LedgerError>;
}

/// Writes for a single block.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Insert the event keyed by `(tx_hash, log_index)`.
    async fn insert_event(&mut self, event: &NewVaultEvent) -> Result<InsertResult, LedgerError>;

    /// Add `delta` to the user's position, creating it seeded with `delta`.
    async fn apply_position(
        &mut self,
        user_address: &str,
        delta: &LedgerDelta,
    ) -> Result<PositionUpsert, LedgerError>;

    /// Add `delta` to the vault totals and `new_users` to the user count,
    /// creating the row seeded with them.
    async fn apply_vault_stats(
        &mut self,
        delta: &LedgerDelta,
        new_users: i64,
    ) -> Result<(), LedgerError>;

    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;
}

/// Record one event and fold it into the aggregates.
///
/// A duplicate event leaves the aggregates untouched, which is what makes
/// replaying a block harmless.
pub async fn record_event(
    tx: &mut dyn LedgerTransaction,
    event: &NewVaultEvent,
) -> Result<InsertResult, LedgerError> {
    if tx.insert_event(event).await? == InsertResult::AlreadyExists {
        debug!(
            tx_hash = %event.tx_hash,
            log_index = event.log_index,
            "Event already recorded, skipping"
        );
        return Ok(InsertResult::AlreadyExists);
    }

    let delta = LedgerDelta::from_event(event.event_type, &event.amount, &event.shares);
    let new_users = match tx.apply_position(&event.user_address, &delta).await? {
        PositionUpsert::Created => 1,
        PositionUpsert::Updated => 0,
    };
    tx.apply_vault_stats(&delta, new_users).await?;
    Ok(InsertResult::Inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_delta() {
        let delta = LedgerDelta::from_event(
            EventKind::Deposit,
            &U256::from(1000),
            &U256::from(900),
        );
        assert_eq!(delta.deposits, BigInt::from(1000));
        assert_eq!(delta.withdrawals, BigInt::from(0));
        assert_eq!(delta.shares, BigInt::from(900));
    }

    #[test]
    fn test_withdraw_delta_subtracts_shares() {
        let delta = LedgerDelta::from_event(
            EventKind::Withdraw,
            &U256::from(200),
            &U256::from(180),
        );
        assert_eq!(delta.deposits, BigInt::from(0));
        assert_eq!(delta.withdrawals, BigInt::from(200));
        assert_eq!(delta.shares, BigInt::from(-180));
    }

    #[test]
    fn test_u256_max_converts_exactly() {
        let max = u256_to_bigint(&U256::MAX);
        assert_eq!(max, (BigInt::from(1) << 256) - 1);
        assert_eq!(u256_to_bigint(&U256::ZERO), BigInt::from(0));
    }
}
