use crate::framework::DatabaseProcessor;
use bigdecimal::BigDecimal;
use kanau::processor::Processor;

/// Per-user running totals, keyed by lowercase address.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserPosition {
    pub user_address: String,
    pub total_deposits: BigDecimal,
    pub total_withdrawals: BigDecimal,
    pub total_shares: BigDecimal,
    pub created_at: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

impl UserPosition {
    /// Add signed deltas to a user's totals within a transaction.
    ///
    /// A missing row is created seeded with the deltas. Returns `true` if the
    /// row was created by this call.
    pub async fn apply_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_address: &str,
        deposits: &BigDecimal,
        withdrawals: &BigDecimal,
        shares: &BigDecimal,
    ) -> Result<bool, sqlx::Error> {
        let created = sqlx::query_scalar::<_, bool>(
            r#"
            INSERT INTO user_positions (user_address, total_deposits, total_withdrawals, total_shares, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (user_address) DO UPDATE
            SET total_deposits = user_positions.total_deposits + EXCLUDED.total_deposits,
                total_withdrawals = user_positions.total_withdrawals + EXCLUDED.total_withdrawals,
                total_shares = user_positions.total_shares + EXCLUDED.total_shares,
                updated_at = now()
            RETURNING (xmax = 0) AS created
            "#,
        )
        .bind(user_address)
        .bind(deposits)
        .bind(withdrawals)
        .bind(shares)
        .fetch_one(&mut **tx)
        .await?;
        Ok(created)
    }
}

#[derive(Debug, Clone)]
/// Read one user's totals. `None` if the address never appeared in an event.
pub struct GetUserPosition {
    pub user_address: String,
}

impl Processor<GetUserPosition> for DatabaseProcessor {
    type Output = Option<UserPosition>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetUserPosition")]
    async fn process(&self, query: GetUserPosition) -> Result<Option<UserPosition>, sqlx::Error> {
        let position = sqlx::query_as::<_, UserPosition>(
            r#"
            SELECT user_address, total_deposits, total_withdrawals, total_shares, created_at, updated_at
            FROM user_positions
            WHERE user_address = $1
            "#,
        )
        .bind(&query.user_address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(position)
    }
}
