//! In-process [`LedgerStore`] used by tests and local dry runs.
//!
//! Keeps the same semantics as the Postgres store, including the all-or-nothing
//! block scope: a transaction works on a staged copy that replaces the live
//! state only on commit.

use super::{
    InsertResult, LedgerDelta, LedgerError, LedgerStore, LedgerTransaction, NewVaultEvent,
    PositionTotals, PositionUpsert, VaultTotals,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// An operation that can be told to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failpoint {
    Begin,
    InsertEvent,
    ApplyPosition,
    ApplyVaultStats,
    Commit,
    AdvanceCursor,
}

/// Copy of the committed state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub cursor: Option<u64>,
    /// Events in insertion order.
    pub events: Vec<NewVaultEvent>,
    /// `None` until the first event is applied.
    pub vault: Option<VaultTotals>,
    pub positions: BTreeMap<String, PositionTotals>,
}

#[derive(Default)]
struct MemoryState {
    committed: LedgerSnapshot,
    failpoint: Option<Failpoint>,
}

impl MemoryState {
    fn trip(&mut self, point: Failpoint) -> Result<(), LedgerError> {
        if self.failpoint == Some(point) {
            self.failpoint = None;
            return Err(LedgerError::Backend(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call reaching `point` fail with [`LedgerError::Backend`].
    pub async fn fail_next(&self, point: Failpoint) {
        self.state.lock().await.failpoint = Some(point);
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.state.lock().await.committed.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn sync_cursor(&self) -> Result<Option<u64>, LedgerError> {
        Ok(self.state.lock().await.committed.cursor)
    }

    async fn advance_cursor(&self, block: u64) -> Result<u64, LedgerError> {
        let mut state = self.state.lock().await;
        state.trip(Failpoint::AdvanceCursor)?;
        let cursor = state.committed.cursor.map_or(block, |current| current.max(block));
        state.committed.cursor = Some(cursor);
        Ok(cursor)
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, LedgerError> {
        let mut state = self.state.lock().await;
        state.trip(Failpoint::Begin)?;
        Ok(Box::new(MemoryLedgerTransaction {
            state: self.state.clone(),
            staged: state.committed.clone(),
        }))
    }
}

struct MemoryLedgerTransaction {
    state: Arc<Mutex<MemoryState>>,
    staged: LedgerSnapshot,
}

impl MemoryLedgerTransaction {
    async fn trip(&self, point: Failpoint) -> Result<(), LedgerError> {
        self.state.lock().await.trip(point)
    }
}

#[async_trait]
impl LedgerTransaction for MemoryLedgerTransaction {
    async fn insert_event(&mut self, event: &NewVaultEvent) -> Result<InsertResult, LedgerError> {
        self.trip(Failpoint::InsertEvent).await?;
        let exists = self
            .staged
            .events
            .iter()
            .any(|e| e.tx_hash == event.tx_hash && e.log_index == event.log_index);
        if exists {
            return Ok(InsertResult::AlreadyExists);
        }
        self.staged.events.push(event.clone());
        Ok(InsertResult::Inserted)
    }

    async fn apply_position(
        &mut self,
        user_address: &str,
        delta: &LedgerDelta,
    ) -> Result<PositionUpsert, LedgerError> {
        self.trip(Failpoint::ApplyPosition).await?;
        let outcome = if self.staged.positions.contains_key(user_address) {
            PositionUpsert::Updated
        } else {
            PositionUpsert::Created
        };
        let position = self
            .staged
            .positions
            .entry(user_address.to_owned())
            .or_default();
        position.total_deposits += &delta.deposits;
        position.total_withdrawals += &delta.withdrawals;
        position.total_shares += &delta.shares;
        Ok(outcome)
    }

    async fn apply_vault_stats(
        &mut self,
        delta: &LedgerDelta,
        new_users: i64,
    ) -> Result<(), LedgerError> {
        self.trip(Failpoint::ApplyVaultStats).await?;
        let vault = self.staged.vault.get_or_insert_with(VaultTotals::default);
        vault.total_deposits += &delta.deposits;
        vault.total_withdrawals += &delta.withdrawals;
        vault.total_shares += &delta.shares;
        vault.user_count += new_users;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let this = *self;
        let mut state = this.state.lock().await;
        state.trip(Failpoint::Commit)?;
        let cursor = state.committed.cursor;
        state.committed = LedgerSnapshot {
            cursor,
            ..this.staged
        };
        Ok(())
    }
}
