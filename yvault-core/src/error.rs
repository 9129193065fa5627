use crate::chain::ChainError;
use crate::decoder::DecodeError;
use crate::ledger::LedgerError;
use thiserror::Error;

/// Anything that aborts a sync cycle. The loop logs it, backs off and retries
/// the whole unprocessed range.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("failed to decode log {log_index} in block {block}: {source}")]
    Decode {
        block: u64,
        log_index: u32,
        #[source]
        source: DecodeError,
    },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("failed to persist cursor at block {block}: {source}")]
    CursorPersist {
        block: u64,
        #[source]
        source: LedgerError,
    },
}
