//! Admin API request and response types.

use serde::{Deserialize, Serialize};

/// Body of `POST /admin/cap-update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCapRequest {
    /// New deposit cap in the asset's smallest unit, base-10.
    pub new_cap: String,
}

/// Body of `POST /admin/yield-update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulateYieldRequest {
    /// Yield amount in the asset's smallest unit, base-10.
    pub amount: String,
}

/// Result of a mined admin transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminTxResponse {
    pub tx_hash: String,
    pub message: String,
}
