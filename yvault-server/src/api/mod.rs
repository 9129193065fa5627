//! HTTP API.
//!
//! # Endpoints
//!
//! Read API (public):
//! - `GET /sync`                        – indexer cursor and confirmation depth
//! - `GET /vault/stats`                 – global vault totals
//! - `GET /users/{address}/position`    – one user's totals
//! - `GET /transactions/{address}`      – a user's events, newest first
//!
//! Admin API (`Yvault-Admin-Authorization` header):
//! - `POST /admin/pause`
//! - `POST /admin/unpause`
//! - `POST /admin/cap-update`
//! - `POST /admin/yield-update`

use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod extractors;
pub mod ledger;

/// Build the `/api/v1` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(ledger::router())
        .nest("/admin", admin::router())
}
