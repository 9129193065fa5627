//! TOML file configuration structures.
//!
//! These structs directly map to the `yvault-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;
use yvault_core::config::AdminCredentials;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub chain: ChainConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Chain access section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: Url,
    pub vault_address: String,
    /// Queried from the node when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
}

fn default_receipt_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

/// Sync loop section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    #[serde(default)]
    pub backoff: BackoffKind,
    /// Upper bound for exponential backoff.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default)]
    pub start_block: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_blocks_per_cycle: Option<u64>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            confirmations: default_confirmations(),
            poll_interval_ms: default_poll_interval_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            backoff: BackoffKind::default(),
            max_backoff_ms: default_max_backoff_ms(),
            start_block: 0,
            max_blocks_per_cycle: None,
        }
    }
}

fn default_confirmations() -> u64 {
    yvault_core::config::DEFAULT_CONFIRMATIONS
}

fn default_poll_interval_ms() -> u64 {
    yvault_core::config::DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_error_backoff_ms() -> u64 {
    yvault_core::config::DEFAULT_ERROR_BACKOFF.as_millis() as u64
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        AdminCredentials::is_hashed(&self.admin.secret)
    }
}
