//! Read access to the chain the vault lives on.
//!
//! [`ChainClient`] is the seam between the indexer and the RPC node; the
//! production implementation is [`RpcChainClient`], tests script their own.

pub mod bindings;
pub mod rpc;
pub mod vault_admin;

pub use bindings::VaultEventSignature;
pub use rpc::RpcChainClient;
pub use vault_admin::{VaultAdmin, VaultCall};

use alloy::primitives::{B256, Log, TxHash};
use alloy::providers::PendingTransactionError;
use alloy::transports::TransportError;
use async_trait::async_trait;
use thiserror::Error;

/// A mined vault log, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    /// Emitting contract, topics and data.
    pub inner: Log,
    pub block_number: u64,
    pub block_hash: Option<B256>,
    pub tx_hash: TxHash,
    pub log_index: u32,
    pub removed: bool,
}

impl RawLog {
    pub fn topics(&self) -> &[B256] {
        self.inner.data.topics()
    }
}

/// The part of a block header the indexer records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: B256,
}

/// Errors raised while talking to the node.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport failure, timeout or JSON-RPC error response.
    #[error("RPC error: {0}")]
    Rpc(#[from] TransportError),

    /// The node answered with something that is not the expected shape.
    #[error("malformed RPC response: {0}")]
    Malformed(String),

    /// The header is pruned or not yet known to this node.
    #[error("block {0} not found")]
    BlockNotFound(u64),

    /// The node answered a header query with a different block.
    #[error("requested block {requested}, node returned block {returned}")]
    HeaderMismatch { requested: u64, returned: u64 },

    /// Waiting on a submitted admin transaction failed.
    #[error("pending transaction error: {0}")]
    PendingTransaction(#[from] PendingTransactionError),

    /// An admin transaction was mined but reverted.
    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    /// An admin transaction was not mined within the configured timeout.
    #[error("timed out waiting for receipt of {0}")]
    ReceiptTimeout(TxHash),

    /// Admin calls need a configured signing key.
    #[error("no admin signing key configured")]
    NoAdminAccount,
}

/// Read-only chain access used by the sync loop and the block processor.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Height of the latest block known to the node.
    async fn head_height(&self) -> Result<u64, ChainError>;

    /// Header of block `number`; [`ChainError::BlockNotFound`] when unavailable.
    async fn block_header(&self, number: u64) -> Result<BlockHeader, ChainError>;

    /// Vault logs with topic0 = `signature` in `from_block..=to_block`, in
    /// ascending block and log-index order.
    async fn query_logs(
        &self,
        signature: VaultEventSignature,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, ChainError>;
}
