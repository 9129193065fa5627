//! [`ChainClient`] over an alloy HTTP provider.

use super::{BlockHeader, ChainClient, ChainError, RawLog, VaultEventSignature};
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{BlockNumberOrTag, Filter, Log};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Chain client talking to a standard Ethereum JSON-RPC endpoint.
///
/// Log queries are always scoped to the configured vault address.
pub struct RpcChainClient {
    provider: DynProvider,
    vault_address: Address,
}

impl RpcChainClient {
    pub fn new(rpc_url: Url, vault_address: Address) -> Self {
        Self {
            provider: ProviderBuilder::new().connect_http(rpc_url).erased(),
            vault_address,
        }
    }

    pub fn vault_address(&self) -> Address {
        self.vault_address
    }

    /// `eth_chainId`
    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.provider.get_chain_id().await?)
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn head_height(&self) -> Result<u64, ChainError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn block_header(&self, number: u64) -> Result<BlockHeader, ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .await?
            .ok_or(ChainError::BlockNotFound(number))?;
        Ok(BlockHeader {
            number: block.header.number,
            hash: block.header.hash,
        })
    }

    async fn query_logs(
        &self,
        signature: VaultEventSignature,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, ChainError> {
        let filter = Filter::new()
            .select(from_block..=to_block)
            .address(self.vault_address)
            .event_signature(signature.topic());
        let logs = self.provider.get_logs(&filter).await?;
        debug!(
            event = signature.signature(),
            from_block = from_block,
            to_block = to_block,
            count = logs.len(),
            "Fetched vault logs"
        );
        logs.into_iter().map(RawLog::try_from).collect()
    }
}

impl TryFrom<Log> for RawLog {
    type Error = ChainError;

    /// Pending logs come back without position fields and are rejected.
    fn try_from(log: Log) -> Result<Self, Self::Error> {
        let block_number = log
            .block_number
            .ok_or_else(|| ChainError::Malformed("log without blockNumber".to_owned()))?;
        let tx_hash = log
            .transaction_hash
            .ok_or_else(|| ChainError::Malformed("log without transactionHash".to_owned()))?;
        let log_index = log
            .log_index
            .ok_or_else(|| ChainError::Malformed("log without logIndex".to_owned()))?;
        let log_index = u32::try_from(log_index)
            .map_err(|_| ChainError::Malformed(format!("logIndex {log_index} out of range")))?;

        Ok(RawLog {
            inner: log.inner,
            block_number,
            block_hash: log.block_hash,
            tx_hash,
            log_index,
            removed: log.removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{B256, LogData, address};

    fn rpc_log(block_number: Option<u64>, log_index: Option<u64>) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: address!("00000000000000000000000000000000000000aa"),
                data: LogData::new_unchecked(vec![B256::ZERO], Default::default()),
            },
            block_hash: Some(B256::repeat_byte(0xbe)),
            block_number,
            transaction_hash: Some(B256::repeat_byte(0xde)),
            log_index,
            ..Default::default()
        }
    }

    #[test]
    fn test_log_conversion() {
        let log = RawLog::try_from(rpc_log(Some(100), Some(2))).unwrap();
        assert_eq!(log.block_number, 100);
        assert_eq!(log.log_index, 2);
        assert_eq!(log.tx_hash, B256::repeat_byte(0xde));
        assert_eq!(log.topics(), &[B256::ZERO]);
        assert!(!log.removed);
    }

    #[test]
    fn test_pending_log_is_rejected() {
        assert!(matches!(
            RawLog::try_from(rpc_log(None, Some(0))),
            Err(ChainError::Malformed(_))
        ));
        assert!(matches!(
            RawLog::try_from(rpc_log(Some(1), None)),
            Err(ChainError::Malformed(_))
        ));
    }

    #[test]
    fn test_oversized_log_index_is_rejected() {
        assert!(matches!(
            RawLog::try_from(rpc_log(Some(1), Some(u64::from(u32::MAX) + 1))),
            Err(ChainError::Malformed(_))
        ));
    }
}
