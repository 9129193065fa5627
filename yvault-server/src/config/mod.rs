//! Configuration module for yvault-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;

use crate::config::file::{BackoffKind, FileConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use yvault_core::config::{AdminCredentials, ChainConfig, IndexerConfig, hash_secret};
use yvault_core::utils::retry::RetryPolicy;
use alloy::signers::local::PrivateKeySigner;
use yvault_sdk::address::parse_address;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Server-level settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminCredentials,
    pub chain: ChainConfig,
    pub indexer: IndexerConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = hash_secret(&file_config.admin.secret)
                .map_err(|e| ConfigError::HashError(e.to_string()))?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        self.build_loaded_config(file_config, secret_hash)
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        parse_address(&config.chain.vault_address).map_err(|e| {
            ConfigError::ValidationError(format!("chain.vault_address: {e}"))
        })?;
        if config.indexer.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "indexer.poll_interval_ms must be greater than zero".to_owned(),
            ));
        }
        if config.indexer.error_backoff_ms == 0 {
            return Err(ConfigError::ValidationError(
                "indexer.error_backoff_ms must be greater than zero".to_owned(),
            ));
        }
        if config.indexer.max_blocks_per_cycle == Some(0) {
            return Err(ConfigError::ValidationError(
                "indexer.max_blocks_per_cycle must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }

    fn build_loaded_config(
        &self,
        file_config: FileConfig,
        secret_hash: String,
    ) -> Result<LoadedConfig, ConfigError> {
        let FileConfig {
            server,
            chain,
            indexer,
            ..
        } = file_config;

        let vault_address = parse_address(&chain.vault_address)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        let error_backoff = Duration::from_millis(indexer.error_backoff_ms);
        let retry_policy = match indexer.backoff {
            BackoffKind::Fixed => RetryPolicy::Fixed(error_backoff),
            BackoffKind::Exponential => RetryPolicy::Exponential {
                base: error_backoff,
                max: Duration::from_millis(indexer.max_backoff_ms).max(error_backoff),
            },
        };

        Ok(LoadedConfig {
            server: ServerConfig {
                listen: server.listen,
            },
            admin: AdminCredentials::from_hash(secret_hash),
            chain: ChainConfig {
                rpc_url: chain.rpc_url,
                vault_address,
                chain_id: chain.chain_id,
                receipt_timeout: Duration::from_secs(chain.receipt_timeout_secs),
            },
            indexer: IndexerConfig {
                confirmations: indexer.confirmations,
                poll_interval: Duration::from_millis(indexer.poll_interval_ms),
                retry_policy,
                start_block: indexer.start_block,
                max_blocks_per_cycle: indexer.max_blocks_per_cycle,
            },
        })
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

/// Get the key that signs admin transactions from `ADMIN_PRIVATE_KEY`.
///
/// Returns `None` when the variable is unset or empty; admin calls are then
/// refused.
pub fn get_admin_signer() -> Result<Option<PrivateKeySigner>, ConfigError> {
    parse_admin_key(std::env::var("ADMIN_PRIVATE_KEY").ok().as_deref())
}

fn parse_admin_key(raw: Option<&str>) -> Result<Option<PrivateKeySigner>, ConfigError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<PrivateKeySigner>()
        .map(Some)
        .map_err(|e| ConfigError::ValidationError(format!("ADMIN_PRIVATE_KEY: {e}")))
}
