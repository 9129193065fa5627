//! Admin API handlers.
//!
//! Each endpoint sends one owner-only transaction to the vault and answers
//! once it is mined. The ledger is never written here; any resulting events
//! reach it through the indexer.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use alloy::primitives::U256;
use yvault_core::chain::{ChainError, VaultCall};
use yvault_sdk::objects::{AdminTxResponse, SimulateYieldRequest, UpdateCapRequest};

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pause", post(pause))
        .route("/unpause", post(unpause))
        .route("/cap-update", post(update_cap))
        .route("/yield-update", post(simulate_yield))
}

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub(crate) enum AdminApiError {
    InvalidAmount(&'static str),
    Chain(ChainError),
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> Response {
        match self {
            AdminApiError::InvalidAmount(field) => (
                StatusCode::BAD_REQUEST,
                format!("{field} must be a non-negative base-10 integer"),
            )
                .into_response(),
            AdminApiError::Chain(ChainError::NoAdminAccount) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "admin account not configured",
            )
                .into_response(),
            AdminApiError::Chain(ChainError::ReceiptTimeout(tx_hash)) => {
                tracing::error!(tx_hash = %tx_hash, "Admin transaction not mined in time");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    format!("transaction {tx_hash} not mined in time"),
                )
                    .into_response()
            }
            AdminApiError::Chain(ChainError::Reverted(tx_hash)) => (
                StatusCode::BAD_GATEWAY,
                format!("transaction {tx_hash} reverted"),
            )
                .into_response(),
            AdminApiError::Chain(e) => {
                tracing::error!(error = %e, "Admin API chain error");
                (StatusCode::BAD_GATEWAY, "chain request failed").into_response()
            }
        }
    }
}

fn parse_amount(raw: &str, field: &'static str) -> Result<U256, AdminApiError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AdminApiError::InvalidAmount(field));
    }
    U256::from_str_radix(raw, 10).map_err(|_| AdminApiError::InvalidAmount(field))
}

async fn execute(
    state: &AppState,
    call: VaultCall,
    message: &str,
) -> Result<Json<AdminTxResponse>, AdminApiError> {
    let tx_hash = state
        .vault_admin
        .execute(call)
        .await
        .map_err(AdminApiError::Chain)?;
    Ok(Json(AdminTxResponse {
        tx_hash: tx_hash.to_string(),
        message: message.to_owned(),
    }))
}

/// `POST /admin/pause`: stop deposits and withdrawals.
async fn pause(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<impl IntoResponse, AdminApiError> {
    execute(&state, VaultCall::Pause, "Vault paused").await
}

/// `POST /admin/unpause`
async fn unpause(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<impl IntoResponse, AdminApiError> {
    execute(&state, VaultCall::Unpause, "Vault unpaused").await
}

/// `POST /admin/cap-update`: set a new deposit cap.
async fn update_cap(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(body): Json<UpdateCapRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    let new_cap = parse_amount(&body.new_cap, "newCap")?;
    execute(&state, VaultCall::UpdateCap(new_cap), "Deposit cap updated").await
}

/// `POST /admin/yield-update`: push simulated yield into the vault.
async fn simulate_yield(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(body): Json<SimulateYieldRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    let amount = parse_amount(&body.amount, "amount")?;
    execute(&state, VaultCall::SimulateYield(amount), "Yield simulated").await
}
