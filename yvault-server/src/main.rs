//! Yield Vault Ledger Server
//!
//! Indexes Deposit and Withdraw events of an ERC-4626 vault into Postgres and
//! serves the resulting ledger over HTTP.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::{Parser, ValueEnum};
use config::{ConfigLoader, get_admin_signer, get_database_url};
use server::{build_router, run_server};
use shutdown::shutdown_and_notify;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use yvault_core::chain::{RpcChainClient, VaultAdmin};
use yvault_core::ledger::PgLedger;
use yvault_core::processors::SyncLoop;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Yield Vault Ledger - confirmation-lagged indexer and read API
#[derive(Parser, Debug)]
#[command(name = "yvault-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./yvault-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "YVAULT_LOG_FORMAT")]
    log_format: LogFormat,

    /// Serve the API without running the indexer
    #[arg(long, default_value = "false")]
    no_indexer: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.log_format);

    tracing::info!("Starting yvault-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = ConfigLoader::new(&args.config, args.listen);
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let listen_addr = loaded_config.server.listen;
    let chain_config = loaded_config.chain;
    let indexer_config = loaded_config.indexer;

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    let admin_signer = get_admin_signer().map_err(|e| {
        tracing::error!("Invalid admin signing key: {}", e);
        e
    })?;
    match &admin_signer {
        Some(signer) => tracing::info!(admin = %signer.address(), "Admin signing key loaded"),
        None => tracing::warn!("ADMIN_PRIVATE_KEY not set, admin calls are disabled"),
    }

    let chain_client = Arc::new(RpcChainClient::new(
        chain_config.rpc_url.clone(),
        chain_config.vault_address,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let indexer_handle = if args.no_indexer {
        tracing::info!("Indexer disabled by --no-indexer");
        None
    } else {
        let chain_id = match chain_config.chain_id {
            Some(id) => id,
            None => chain_client.chain_id().await.map_err(|e| {
                tracing::error!("Failed to query chain id: {}", e);
                e
            })?,
        };
        tracing::info!(
            chain_id = chain_id,
            vault = %chain_config.vault_address,
            "Starting indexer"
        );
        let sync_loop = SyncLoop::new(
            chain_client.clone(),
            Arc::new(PgLedger::new(db_pool.clone())),
            chain_id,
            chain_config.vault_address,
            indexer_config.clone(),
            shutdown_rx,
        );
        Some(tokio::spawn(sync_loop.run()))
    };

    let vault_admin = VaultAdmin::new(
        chain_config.rpc_url,
        chain_config.vault_address,
        admin_signer,
        chain_config.receipt_timeout,
    );
    let state = AppState::new(
        db_pool.clone(),
        loaded_config.admin,
        vault_admin,
        indexer_config.confirmations,
    );

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(
        router,
        listen_addr,
        shutdown_and_notify(shutdown_tx.clone()),
    )
    .await;

    // The server may also have stopped on its own error.
    let _ = shutdown_tx.send(true);
    if let Some(handle) = indexer_handle {
        tracing::info!("Waiting for indexer to stop...");
        if let Err(e) = handle.await {
            tracing::error!("Indexer task failed: {}", e);
        }
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
