//! Read API handlers over the indexed ledger.
//!
//! Missing rows are answered with zeros rather than 404: an address that never
//! touched the vault simply has an empty position.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use kanau::processor::Processor;
use yvault_core::entities::from_numeric;
use yvault_core::entities::sync_state::GetSyncState;
use yvault_core::entities::user_position::GetUserPosition;
use yvault_core::entities::vault_event::{
    CountUserVaultEvents, ListUserVaultEvents, VaultEventRecord,
};
use yvault_core::entities::vault_stats::GetVaultStats;
use yvault_core::framework::DatabaseProcessor;
use yvault_sdk::objects::{
    SyncStatusResponse, TransactionItem, TransactionsPage, TransactionsQuery,
    UserPositionResponse, VaultStatsResponse, clamp_page,
};

use crate::api::extractors::UserAddress;
use crate::state::AppState;

/// Build the read API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sync", get(sync_status))
        .route("/vault/stats", get(vault_stats))
        .route("/users/{address}/position", get(user_position))
        .route("/transactions/{address}", get(transactions))
}

/// Errors that can occur in read API handlers.
#[derive(Debug)]
pub(crate) enum ApiError {
    Database(sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Database(e) => {
                tracing::error!(error = %e, "API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

fn processor(state: &AppState) -> DatabaseProcessor {
    DatabaseProcessor {
        pool: state.db.clone(),
    }
}

fn to_transaction_item(record: &VaultEventRecord) -> TransactionItem {
    TransactionItem {
        tx_hash: record.tx_hash.clone(),
        block_number: record.block_number.to_string(),
        log_index: record.log_index,
        event_type: record.event_type.into(),
        amount: from_numeric(&record.amount).to_string(),
        shares: from_numeric(&record.shares).to_string(),
    }
}

/// `GET /sync`: where the indexer stands.
async fn sync_status(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let sync = processor(&state)
        .process(GetSyncState)
        .await
        .map_err(ApiError::Database)?;

    let response = match sync {
        Some(s) => SyncStatusResponse {
            last_processed_block: u64::try_from(s.last_processed_block).unwrap_or_default(),
            last_safe_block: u64::try_from(s.last_safe_block).unwrap_or_default(),
            confirmations: state.confirmations,
            updated_at: Some(s.updated_at.unix_timestamp()),
        },
        None => SyncStatusResponse {
            last_processed_block: 0,
            last_safe_block: 0,
            confirmations: state.confirmations,
            updated_at: None,
        },
    };
    Ok(Json(response))
}

/// `GET /vault/stats`
async fn vault_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = processor(&state)
        .process(GetVaultStats)
        .await
        .map_err(ApiError::Database)?;

    let response = stats.map_or_else(VaultStatsResponse::empty, |s| VaultStatsResponse {
        total_deposits: from_numeric(&s.total_deposits).to_string(),
        total_withdrawals: from_numeric(&s.total_withdrawals).to_string(),
        total_shares: from_numeric(&s.total_shares).to_string(),
        user_count: s.user_count,
    });
    Ok(Json(response))
}

/// `GET /users/{address}/position`
async fn user_position(
    State(state): State<AppState>,
    UserAddress(address): UserAddress,
) -> Result<impl IntoResponse, ApiError> {
    let position = processor(&state)
        .process(GetUserPosition {
            user_address: address.clone(),
        })
        .await
        .map_err(ApiError::Database)?;

    let response = match position {
        Some(p) => UserPositionResponse {
            address,
            total_deposits: from_numeric(&p.total_deposits).to_string(),
            total_withdrawals: from_numeric(&p.total_withdrawals).to_string(),
            total_shares: from_numeric(&p.total_shares).to_string(),
        },
        None => UserPositionResponse::empty(address),
    };
    Ok(Json(response))
}

/// `GET /transactions/{address}?page&limit&confirmed`: newest block first.
async fn transactions(
    State(state): State<AppState>,
    UserAddress(address): UserAddress,
    Query(query): Query<TransactionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit, offset) = clamp_page(query.page, query.limit);
    let processor = processor(&state);

    let records = processor
        .process(ListUserVaultEvents {
            user_address: address.clone(),
            confirmed: query.confirmed,
            limit: i64::from(limit),
            offset: i64::try_from(offset).unwrap_or(i64::MAX),
        })
        .await
        .map_err(ApiError::Database)?;

    let total = processor
        .process(CountUserVaultEvents {
            user_address: address,
            confirmed: query.confirmed,
        })
        .await
        .map_err(ApiError::Database)?;

    Ok(Json(TransactionsPage {
        page,
        limit,
        total,
        transactions: records.iter().map(to_transaction_item).collect(),
    }))
}
