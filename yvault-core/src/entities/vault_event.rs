use crate::entities::EventKind;
use crate::framework::DatabaseProcessor;
use bigdecimal::BigDecimal;
use kanau::processor::Processor;

/// A stored Deposit or Withdraw log. `(tx_hash, log_index)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct VaultEventRecord {
    pub id: i64,
    pub chain_id: i64,
    pub contract_address: String,
    pub tx_hash: String,
    pub log_index: i32,
    pub block_number: i64,
    pub block_hash: String,
    pub event_type: EventKind,
    pub user_address: String,
    pub amount: BigDecimal,
    pub shares: BigDecimal,
    pub confirmed: bool,
    pub removed: bool,
    pub created_at: time::OffsetDateTime,
}

/// Data for inserting a new vault event.
#[derive(Debug, Clone)]
pub struct VaultEventInsert {
    pub chain_id: i64,
    pub contract_address: String,
    pub tx_hash: String,
    pub log_index: i32,
    pub block_number: i64,
    pub block_hash: String,
    pub event_type: EventKind,
    pub user_address: String,
    pub amount: BigDecimal,
    pub shares: BigDecimal,
    pub confirmed: bool,
}

impl VaultEventRecord {
    /// Insert an event within a transaction.
    ///
    /// Returns `false` when an event with the same `(tx_hash, log_index)` was
    /// already stored; the transaction stays usable in that case.
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event: &VaultEventInsert,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO vault_events
                (chain_id, contract_address, tx_hash, log_index, block_number, block_hash,
                 event_type, user_address, amount, shares, confirmed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (tx_hash, log_index) DO NOTHING
            "#,
        )
        .bind(event.chain_id)
        .bind(&event.contract_address)
        .bind(&event.tx_hash)
        .bind(event.log_index)
        .bind(event.block_number)
        .bind(&event.block_hash)
        .bind(event.event_type)
        .bind(&event.user_address)
        .bind(&event.amount)
        .bind(&event.shares)
        .bind(event.confirmed)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, Clone)]
/// One page of a user's events, newest block first.
///
/// Rows flagged `removed` are never returned.
pub struct ListUserVaultEvents {
    pub user_address: String,
    pub confirmed: bool,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListUserVaultEvents> for DatabaseProcessor {
    type Output = Vec<VaultEventRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListUserVaultEvents")]
    async fn process(
        &self,
        query: ListUserVaultEvents,
    ) -> Result<Vec<VaultEventRecord>, sqlx::Error> {
        let events = sqlx::query_as::<_, VaultEventRecord>(
            r#"
            SELECT id, chain_id, contract_address, tx_hash, log_index, block_number, block_hash,
                   event_type, user_address, amount, shares, confirmed, removed, created_at
            FROM vault_events
            WHERE user_address = $1 AND confirmed = $2 AND removed = false
            ORDER BY block_number DESC, log_index DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&query.user_address)
        .bind(query.confirmed)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}

#[derive(Debug, Clone)]
/// Total count matching [`ListUserVaultEvents`] without paging.
pub struct CountUserVaultEvents {
    pub user_address: String,
    pub confirmed: bool,
}

impl Processor<CountUserVaultEvents> for DatabaseProcessor {
    type Output = i64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CountUserVaultEvents")]
    async fn process(&self, query: CountUserVaultEvents) -> Result<i64, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM vault_events
            WHERE user_address = $1 AND confirmed = $2 AND removed = false
            "#,
        )
        .bind(&query.user_address)
        .bind(query.confirmed)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
