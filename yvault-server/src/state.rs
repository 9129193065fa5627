//! Application state shared across all request handlers.

use sqlx::PgPool;
use std::sync::Arc;
use yvault_core::chain::VaultAdmin;
use yvault_core::config::AdminCredentials;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Hashed admin secret.
    pub admin: Arc<AdminCredentials>,
    /// Sends owner-only calls to the vault contract.
    pub vault_admin: Arc<VaultAdmin>,
    /// Confirmation depth the indexer runs with, reported by `/api/v1/sync`.
    pub confirmations: u64,
}

impl AppState {
    pub fn new(
        db: PgPool,
        admin: AdminCredentials,
        vault_admin: VaultAdmin,
        confirmations: u64,
    ) -> Self {
        Self {
            db,
            admin: Arc::new(admin),
            vault_admin: Arc::new(vault_admin),
            confirmations,
        }
    }
}
