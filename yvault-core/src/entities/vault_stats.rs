use crate::framework::DatabaseProcessor;
use bigdecimal::BigDecimal;
use kanau::processor::Processor;

/// Global totals for the vault. A single row keyed by `id = 1`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct VaultStats {
    pub total_deposits: BigDecimal,
    pub total_withdrawals: BigDecimal,
    pub total_shares: BigDecimal,
    pub user_count: i64,
    pub updated_at: time::OffsetDateTime,
}

impl VaultStats {
    /// Add signed deltas to the totals within a transaction, creating the row
    /// seeded with the deltas if it does not exist yet.
    pub async fn apply_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        deposits: &BigDecimal,
        withdrawals: &BigDecimal,
        shares: &BigDecimal,
        new_users: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO vault_stats (id, total_deposits, total_withdrawals, total_shares, user_count, updated_at)
            VALUES (1, $1, $2, $3, $4, now())
            ON CONFLICT (id) DO UPDATE
            SET total_deposits = vault_stats.total_deposits + EXCLUDED.total_deposits,
                total_withdrawals = vault_stats.total_withdrawals + EXCLUDED.total_withdrawals,
                total_shares = vault_stats.total_shares + EXCLUDED.total_shares,
                user_count = vault_stats.user_count + EXCLUDED.user_count,
                updated_at = now()
            "#,
        )
        .bind(deposits)
        .bind(withdrawals)
        .bind(shares)
        .bind(new_users)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Read the global totals. `None` before the first event is applied.
pub struct GetVaultStats;

impl Processor<GetVaultStats> for DatabaseProcessor {
    type Output = Option<VaultStats>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetVaultStats")]
    async fn process(&self, _query: GetVaultStats) -> Result<Option<VaultStats>, sqlx::Error> {
        let stats = sqlx::query_as::<_, VaultStats>(
            r#"
            SELECT total_deposits, total_withdrawals, total_shares, user_count, updated_at
            FROM vault_stats
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(stats)
    }
}
