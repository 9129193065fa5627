use super::{
    InsertResult, LedgerDelta, LedgerError, LedgerStore, LedgerTransaction, NewVaultEvent,
    PositionUpsert, u256_to_bigint,
};
use crate::entities::sync_state::{AdvanceSyncCursor, GetSyncState};
use crate::entities::user_position::UserPosition;
use crate::entities::vault_event::{VaultEventInsert, VaultEventRecord};
use crate::entities::vault_stats::VaultStats;
use crate::entities::to_numeric;
use crate::framework::{DatabaseProcessor, TransactionProcessor};
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;

/// [`LedgerStore`] backed by the Postgres tables in `migrations/`.
#[derive(Clone)]
pub struct PgLedger {
    db: DatabaseProcessor,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            db: DatabaseProcessor { pool },
        }
    }
}

fn to_i64(field: &'static str, value: u64) -> Result<i64, LedgerError> {
    i64::try_from(value).map_err(|_| LedgerError::OutOfRange {
        field,
        value: value.to_string(),
    })
}

fn to_u64(field: &'static str, value: i64) -> Result<u64, LedgerError> {
    u64::try_from(value).map_err(|_| LedgerError::OutOfRange {
        field,
        value: value.to_string(),
    })
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn sync_cursor(&self) -> Result<Option<u64>, LedgerError> {
        let state = self.db.process(GetSyncState).await?;
        state
            .map(|s| to_u64("last_safe_block", s.last_safe_block))
            .transpose()
    }

    async fn advance_cursor(&self, block: u64) -> Result<u64, LedgerError> {
        let block = to_i64("last_safe_block", block)?;
        let stored = self.db.process(AdvanceSyncCursor { block }).await?;
        to_u64("last_safe_block", stored)
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, LedgerError> {
        let inner = self.db.begin().await?;
        Ok(Box::new(PgLedgerTransaction { inner }))
    }
}

/// One block's writes inside a Postgres transaction.
pub struct PgLedgerTransaction {
    inner: TransactionProcessor<'static>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn insert_event(&mut self, event: &NewVaultEvent) -> Result<InsertResult, LedgerError> {
        let insert = VaultEventInsert {
            chain_id: to_i64("chain_id", event.chain_id)?,
            contract_address: event.contract_address.clone(),
            tx_hash: event.tx_hash.clone(),
            log_index: i32::try_from(event.log_index).map_err(|_| LedgerError::OutOfRange {
                field: "log_index",
                value: event.log_index.to_string(),
            })?,
            block_number: to_i64("block_number", event.block_number)?,
            block_hash: event.block_hash.clone(),
            event_type: event.event_type,
            user_address: event.user_address.clone(),
            amount: to_numeric(&u256_to_bigint(&event.amount)),
            shares: to_numeric(&u256_to_bigint(&event.shares)),
            confirmed: event.confirmed,
        };
        let inserted = VaultEventRecord::insert_tx(&mut self.inner.tx, &insert).await?;
        Ok(if inserted {
            InsertResult::Inserted
        } else {
            InsertResult::AlreadyExists
        })
    }

    async fn apply_position(
        &mut self,
        user_address: &str,
        delta: &LedgerDelta,
    ) -> Result<PositionUpsert, LedgerError> {
        let created = UserPosition::apply_tx(
            &mut self.inner.tx,
            user_address,
            &to_numeric(&delta.deposits),
            &to_numeric(&delta.withdrawals),
            &to_numeric(&delta.shares),
        )
        .await?;
        Ok(if created {
            PositionUpsert::Created
        } else {
            PositionUpsert::Updated
        })
    }

    async fn apply_vault_stats(
        &mut self,
        delta: &LedgerDelta,
        new_users: i64,
    ) -> Result<(), LedgerError> {
        VaultStats::apply_tx(
            &mut self.inner.tx,
            &to_numeric(&delta.deposits),
            &to_numeric(&delta.withdrawals),
            &to_numeric(&delta.shares),
            new_users,
        )
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.inner.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_numbers_beyond_bigint_are_rejected() {
        assert!(matches!(
            to_i64("block_number", u64::MAX),
            Err(LedgerError::OutOfRange { field: "block_number", .. })
        ));
        assert_eq!(to_i64("block_number", 47).unwrap(), 47);
    }

    #[test]
    fn test_negative_cursor_is_rejected() {
        assert!(to_u64("last_safe_block", -1).is_err());
        assert_eq!(to_u64("last_safe_block", 0).unwrap(), 0);
    }

    use crate::entities::EventKind;
    use crate::entities::user_position::GetUserPosition;
    use crate::entities::vault_stats::GetVaultStats;
    use crate::ledger::record_event;
    use alloy::primitives::U256;
    use bigdecimal::BigDecimal;

    const ALICE: &str = "0x0000000000000000000000000000000000000abc";
    const BOB: &str = "0x0000000000000000000000000000000000000b0b";

    fn event(
        tx_hash: &str,
        log_index: u32,
        event_type: EventKind,
        user: &str,
        amount: u64,
        shares: u64,
    ) -> NewVaultEvent {
        NewVaultEvent {
            chain_id: 31337,
            contract_address: "0x00000000000000000000000000000000000000aa".to_owned(),
            tx_hash: tx_hash.to_owned(),
            log_index,
            block_number: 100,
            block_hash: "0x64".to_owned(),
            event_type,
            user_address: user.to_owned(),
            amount: U256::from(amount),
            shares: U256::from(shares),
            confirmed: true,
        }
    }

    async fn apply(ledger: &PgLedger, events: &[NewVaultEvent]) -> Vec<InsertResult> {
        let mut tx = ledger.begin().await.unwrap();
        let mut results = Vec::new();
        for event in events {
            results.push(record_event(&mut *tx, event).await.unwrap());
        }
        tx.commit().await.unwrap();
        results
    }

    fn numeric(value: i64) -> BigDecimal {
        BigDecimal::from(value)
    }

    async fn stats(pool: &PgPool) -> (BigDecimal, BigDecimal, BigDecimal, i64) {
        let db = DatabaseProcessor { pool: pool.clone() };
        let stats = db.process(GetVaultStats).await.unwrap().unwrap();
        (
            stats.total_deposits,
            stats.total_withdrawals,
            stats.total_shares,
            stats.user_count,
        )
    }

    async fn position(pool: &PgPool, user: &str) -> (BigDecimal, BigDecimal, BigDecimal) {
        let db = DatabaseProcessor { pool: pool.clone() };
        let position = db
            .process(GetUserPosition {
                user_address: user.to_owned(),
            })
            .await
            .unwrap()
            .unwrap();
        (
            position.total_deposits,
            position.total_withdrawals,
            position.total_shares,
        )
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_deposit_is_stored_confirmed(pool: PgPool) {
        let ledger = PgLedger::new(pool.clone());
        let results = apply(
            &ledger,
            &[event("0xt1", 0, EventKind::Deposit, ALICE, 1000, 900)],
        )
        .await;
        assert_eq!(results, vec![InsertResult::Inserted]);

        let (event_type, confirmed): (EventKind, bool) = sqlx::query_as(
            "SELECT event_type, confirmed FROM vault_events WHERE tx_hash = $1 AND log_index = $2",
        )
        .bind("0xt1")
        .bind(0i32)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(event_type, EventKind::Deposit);
        assert!(confirmed);

        assert_eq!(
            stats(&pool).await,
            (numeric(1000), numeric(0), numeric(900), 1)
        );
        assert_eq!(
            position(&pool, ALICE).await,
            (numeric(1000), numeric(0), numeric(900))
        );
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_replayed_event_changes_nothing(pool: PgPool) {
        let ledger = PgLedger::new(pool.clone());
        let deposit = event("0xt1", 0, EventKind::Deposit, ALICE, 1000, 900);
        apply(&ledger, std::slice::from_ref(&deposit)).await;

        let results = apply(&ledger, std::slice::from_ref(&deposit)).await;
        assert_eq!(results, vec![InsertResult::AlreadyExists]);

        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM vault_events")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            stats(&pool).await,
            (numeric(1000), numeric(0), numeric(900), 1)
        );
        assert_eq!(
            position(&pool, ALICE).await,
            (numeric(1000), numeric(0), numeric(900))
        );
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_duplicate_within_one_transaction(pool: PgPool) {
        let ledger = PgLedger::new(pool.clone());
        let deposit = event("0xt1", 0, EventKind::Deposit, ALICE, 1000, 900);
        let results = apply(&ledger, &[deposit.clone(), deposit]).await;
        assert_eq!(
            results,
            vec![InsertResult::Inserted, InsertResult::AlreadyExists]
        );
        assert_eq!(
            stats(&pool).await,
            (numeric(1000), numeric(0), numeric(900), 1)
        );
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_withdraw_after_deposit(pool: PgPool) {
        let ledger = PgLedger::new(pool.clone());
        apply(
            &ledger,
            &[event("0xt1", 0, EventKind::Deposit, ALICE, 1000, 900)],
        )
        .await;
        apply(
            &ledger,
            &[event("0xt2", 0, EventKind::Withdraw, ALICE, 200, 180)],
        )
        .await;

        assert_eq!(
            stats(&pool).await,
            (numeric(1000), numeric(200), numeric(720), 1)
        );
        assert_eq!(
            position(&pool, ALICE).await,
            (numeric(1000), numeric(200), numeric(720))
        );
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_first_event_withdraw_goes_negative(pool: PgPool) {
        let ledger = PgLedger::new(pool.clone());
        apply(
            &ledger,
            &[event("0xt1", 0, EventKind::Withdraw, BOB, 200, 180)],
        )
        .await;

        assert_eq!(
            stats(&pool).await,
            (numeric(0), numeric(200), numeric(-180), 1)
        );
        assert_eq!(
            position(&pool, BOB).await,
            (numeric(0), numeric(200), numeric(-180))
        );
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_uncommitted_block_leaves_no_trace(pool: PgPool) {
        let ledger = PgLedger::new(pool.clone());
        let mut tx = ledger.begin().await.unwrap();
        record_event(
            &mut *tx,
            &event("0xt1", 0, EventKind::Deposit, ALICE, 1000, 900),
        )
        .await
        .unwrap();
        drop(tx);

        let db = DatabaseProcessor { pool: pool.clone() };
        assert!(db.process(GetVaultStats).await.unwrap().is_none());
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM vault_events")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_cursor_never_moves_backwards(pool: PgPool) {
        let ledger = PgLedger::new(pool);
        assert_eq!(ledger.sync_cursor().await.unwrap(), None);

        assert_eq!(ledger.advance_cursor(47).await.unwrap(), 47);
        assert_eq!(ledger.advance_cursor(40).await.unwrap(), 47);
        assert_eq!(ledger.sync_cursor().await.unwrap(), Some(47));

        assert_eq!(ledger.advance_cursor(52).await.unwrap(), 52);
        assert_eq!(ledger.sync_cursor().await.unwrap(), Some(52));
    }
}
