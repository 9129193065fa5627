use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// The single-row sync cursor.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SyncState {
    pub last_processed_block: i64,
    pub last_safe_block: i64,
    pub updated_at: time::OffsetDateTime,
}

#[derive(Debug, Clone)]
/// Read the persisted cursor. `None` before the first cycle completes.
pub struct GetSyncState;

impl Processor<GetSyncState> for DatabaseProcessor {
    type Output = Option<SyncState>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSyncState")]
    async fn process(&self, _query: GetSyncState) -> Result<Option<SyncState>, sqlx::Error> {
        let state = sqlx::query_as::<_, SyncState>(
            r#"
            SELECT last_processed_block, last_safe_block, updated_at
            FROM sync_state
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(state)
    }
}

#[derive(Debug, Clone)]
/// Move the cursor forward to `block`.
///
/// The stored value never decreases: advancing to a block below the current
/// cursor leaves it unchanged. Returns the cursor after the write.
pub struct AdvanceSyncCursor {
    pub block: i64,
}

impl Processor<AdvanceSyncCursor> for DatabaseProcessor {
    type Output = i64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:AdvanceSyncCursor")]
    async fn process(&self, advance: AdvanceSyncCursor) -> Result<i64, sqlx::Error> {
        let cursor = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO sync_state (id, last_processed_block, last_safe_block, updated_at)
            VALUES (1, $1, $1, now())
            ON CONFLICT (id) DO UPDATE
            SET last_processed_block = GREATEST(sync_state.last_processed_block, EXCLUDED.last_processed_block),
                last_safe_block = GREATEST(sync_state.last_safe_block, EXCLUDED.last_safe_block),
                updated_at = now()
            RETURNING last_safe_block
            "#,
        )
        .bind(advance.block)
        .fetch_one(&self.pool)
        .await?;
        Ok(cursor)
    }
}
