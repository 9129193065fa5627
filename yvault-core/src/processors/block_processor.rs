use crate::chain::{ChainClient, ChainError, RawLog, VaultEventSignature};
use crate::decoder::decode_log;
use crate::error::IndexerError;
use crate::ledger::{InsertResult, LedgerStore, NewVaultEvent, record_event};
use alloy::primitives::Address;
use itertools::Itertools;
use std::sync::Arc;
use tracing::{debug, warn};

/// What applying one block did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockOutcome {
    /// Vault logs found in the block.
    pub logs: usize,
    /// Events newly recorded.
    pub applied: usize,
    /// Events skipped because they were already recorded.
    pub duplicates: usize,
}

/// Applies the vault logs of a single finalized block.
///
/// All of a block's ledger effects commit in one transaction, or none do.
/// Re-running a block that already committed changes nothing.
pub struct BlockProcessor<C, L> {
    chain: Arc<C>,
    ledger: Arc<L>,
    chain_id: u64,
    vault_address: Address,
}

impl<C: ChainClient, L: LedgerStore> BlockProcessor<C, L> {
    pub fn new(chain: Arc<C>, ledger: Arc<L>, chain_id: u64, vault_address: Address) -> Self {
        Self {
            chain,
            ledger,
            chain_id,
            vault_address,
        }
    }

    /// Deposit and Withdraw logs of `block`, merged into log-index order.
    async fn block_logs(&self, block: u64) -> Result<Vec<RawLog>, IndexerError> {
        let deposits = self
            .chain
            .query_logs(VaultEventSignature::Deposit, block, block)
            .await?;
        let withdrawals = self
            .chain
            .query_logs(VaultEventSignature::Withdraw, block, block)
            .await?;
        Ok(deposits
            .into_iter()
            .merge_by(withdrawals, |a, b| a.log_index <= b.log_index)
            .collect())
    }

    pub async fn process_block(&self, block: u64) -> Result<BlockOutcome, IndexerError> {
        let logs = self.block_logs(block).await?;
        if logs.is_empty() {
            return Ok(BlockOutcome::default());
        }

        let header = self.chain.block_header(block).await?;
        if header.number != block {
            return Err(ChainError::HeaderMismatch {
                requested: block,
                returned: header.number,
            }
            .into());
        }
        let contract_address = format!("{:#x}", self.vault_address);
        let block_hash = format!("{:#x}", header.hash);

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            if log.removed {
                warn!(
                    block = block,
                    tx_hash = %log.tx_hash,
                    log_index = log.log_index,
                    "Ignoring log flagged as removed"
                );
                continue;
            }
            let decoded = decode_log(log).map_err(|source| IndexerError::Decode {
                block,
                log_index: log.log_index,
                source,
            })?;
            events.push(NewVaultEvent {
                chain_id: self.chain_id,
                contract_address: contract_address.clone(),
                tx_hash: format!("{:#x}", log.tx_hash),
                log_index: log.log_index,
                block_number: block,
                block_hash: block_hash.clone(),
                event_type: decoded.kind,
                user_address: format!("{:#x}", decoded.owner),
                amount: decoded.amount,
                shares: decoded.shares,
                confirmed: true,
            });
        }

        let mut outcome = BlockOutcome {
            logs: logs.len(),
            ..Default::default()
        };
        if events.is_empty() {
            return Ok(outcome);
        }
        let mut tx = self.ledger.begin().await?;
        for event in &events {
            match record_event(&mut *tx, event).await? {
                InsertResult::Inserted => outcome.applied += 1,
                InsertResult::AlreadyExists => outcome.duplicates += 1,
            }
        }
        tx.commit().await?;

        debug!(
            block = block,
            logs = outcome.logs,
            applied = outcome.applied,
            duplicates = outcome.duplicates,
            "Block applied"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecodeError;
    use crate::entities::EventKind;
    use crate::ledger::{Failpoint, LedgerSnapshot, MemoryLedger};
    use crate::testing::{MockChain, VAULT, block_hash, deposit_log, tx_hash, withdraw_log};
    use alloy::primitives::Bytes;
    use bigdecimal::num_bigint::BigInt;

    const ALICE: &str = "0x0000000000000000000000000000000000000abc";
    const BOB: &str = "0x0000000000000000000000000000000000000b0b";

    type TestProcessor = BlockProcessor<MockChain, MemoryLedger>;

    fn setup(head: u64) -> (Arc<MockChain>, Arc<MemoryLedger>, TestProcessor) {
        let chain = Arc::new(MockChain::new(head));
        let ledger = Arc::new(MemoryLedger::new());
        let processor = BlockProcessor::new(chain.clone(), ledger.clone(), 1, VAULT);
        (chain, ledger, processor)
    }

    fn assert_consistent(snapshot: &LedgerSnapshot) {
        let vault = snapshot.vault.clone().unwrap_or_default();
        let (deposited, withdrawn, shares) = snapshot.positions.values().fold(
            (BigInt::from(0), BigInt::from(0), BigInt::from(0)),
            |(d, w, s), p| (d + &p.total_deposits, w + &p.total_withdrawals, s + &p.total_shares),
        );
        assert_eq!(vault.total_deposits, deposited);
        assert_eq!(vault.total_withdrawals, withdrawn);
        assert_eq!(vault.total_shares, shares);
    }

    #[tokio::test]
    async fn test_deposit_creates_event_stats_and_position() {
        let (chain, ledger, processor) = setup(200);
        chain.push_log(deposit_log(100, "0xt1", 0, ALICE, 1000, 900));

        let outcome = processor.process_block(100).await.unwrap();
        assert_eq!(
            outcome,
            BlockOutcome {
                logs: 1,
                applied: 1,
                duplicates: 0
            }
        );

        let snapshot = ledger.snapshot().await;
        assert_eq!(snapshot.events.len(), 1);
        let event = &snapshot.events[0];
        assert_eq!(event.event_type, EventKind::Deposit);
        assert_eq!(event.user_address, ALICE);
        assert_eq!(event.block_hash, format!("{:#x}", block_hash(100)));
        assert_eq!(event.tx_hash, format!("{:#x}", tx_hash("0xt1")));
        assert_eq!(event.contract_address, format!("{:#x}", VAULT));
        assert!(event.confirmed);

        let vault = snapshot.vault.clone().unwrap();
        assert_eq!(vault.total_deposits, BigInt::from(1000));
        assert_eq!(vault.total_withdrawals, BigInt::from(0));
        assert_eq!(vault.total_shares, BigInt::from(900));
        assert_eq!(vault.user_count, 1);

        let position = &snapshot.positions[ALICE];
        assert_eq!(position.total_deposits, BigInt::from(1000));
        assert_eq!(position.total_withdrawals, BigInt::from(0));
        assert_eq!(position.total_shares, BigInt::from(900));
        assert_consistent(&snapshot);
    }

    #[tokio::test]
    async fn test_replaying_a_block_changes_nothing() {
        let (chain, ledger, processor) = setup(200);
        chain.push_log(deposit_log(100, "0xt1", 0, ALICE, 1000, 900));

        processor.process_block(100).await.unwrap();
        let first = ledger.snapshot().await;

        let outcome = processor.process_block(100).await.unwrap();
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(ledger.snapshot().await, first);
    }

    #[tokio::test]
    async fn test_withdraw_after_deposit() {
        let (chain, ledger, processor) = setup(200);
        chain.push_log(deposit_log(100, "0xt1", 0, ALICE, 1000, 900));
        chain.push_log(withdraw_log(101, "0xt2", 0, ALICE, 200, 180));

        processor.process_block(100).await.unwrap();
        processor.process_block(101).await.unwrap();

        let snapshot = ledger.snapshot().await;
        let vault = snapshot.vault.clone().unwrap();
        assert_eq!(vault.total_deposits, BigInt::from(1000));
        assert_eq!(vault.total_withdrawals, BigInt::from(200));
        assert_eq!(vault.total_shares, BigInt::from(720));
        assert_eq!(vault.user_count, 1);

        let position = &snapshot.positions[ALICE];
        assert_eq!(position.total_withdrawals, BigInt::from(200));
        assert_eq!(position.total_shares, BigInt::from(720));
        assert_consistent(&snapshot);
    }

    #[tokio::test]
    async fn test_logs_are_applied_in_log_index_order() {
        let (chain, ledger, processor) = setup(200);
        chain.push_log(withdraw_log(100, "0xt1", 1, ALICE, 50, 45));
        chain.push_log(deposit_log(100, "0xt1", 0, ALICE, 100, 90));
        chain.push_log(deposit_log(100, "0xt2", 2, BOB, 300, 270));

        let outcome = processor.process_block(100).await.unwrap();
        assert_eq!(outcome.applied, 3);

        let snapshot = ledger.snapshot().await;
        let order: Vec<u32> = snapshot.events.iter().map(|e| e.log_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(snapshot.vault.clone().unwrap().user_count, 2);
        assert_consistent(&snapshot);
    }

    #[tokio::test]
    async fn test_empty_block_opens_no_transaction() {
        let (chain, ledger, processor) = setup(200);
        ledger.fail_next(Failpoint::Begin).await;

        let outcome = processor.process_block(100).await.unwrap();
        assert_eq!(outcome, BlockOutcome::default());

        // The armed failpoint is still waiting for the first begin().
        chain.push_log(deposit_log(101, "0xt1", 0, ALICE, 1, 1));
        assert!(matches!(
            processor.process_block(101).await,
            Err(IndexerError::Ledger(_))
        ));
    }

    #[tokio::test]
    async fn test_failure_mid_block_commits_nothing() {
        let (chain, ledger, processor) = setup(200);
        chain.push_log(deposit_log(100, "0xt1", 0, ALICE, 1000, 900));
        chain.push_log(deposit_log(100, "0xt2", 1, BOB, 500, 450));

        // Fails on the first event's stats update, after its insert.
        ledger.fail_next(Failpoint::ApplyVaultStats).await;
        assert!(processor.process_block(100).await.is_err());
        assert_eq!(ledger.snapshot().await, LedgerSnapshot::default());

        let outcome = processor.process_block(100).await.unwrap();
        assert_eq!(outcome.applied, 2);
        let snapshot = ledger.snapshot().await;
        assert_eq!(snapshot.vault.clone().unwrap().total_deposits, BigInt::from(1500));
        assert_consistent(&snapshot);
    }

    #[tokio::test]
    async fn test_missing_header_aborts_block() {
        let (chain, ledger, processor) = setup(200);
        chain.push_log(deposit_log(100, "0xt1", 0, ALICE, 1000, 900));
        chain.hide_header(100);

        let result = processor.process_block(100).await;
        assert!(matches!(
            result,
            Err(IndexerError::Chain(ChainError::BlockNotFound(100)))
        ));
        assert!(ledger.snapshot().await.events.is_empty());

        chain.reveal_header(100);
        assert_eq!(processor.process_block(100).await.unwrap().applied, 1);
    }

    #[tokio::test]
    async fn test_undecodable_log_aborts_block() {
        let (chain, ledger, processor) = setup(200);
        chain.push_log(deposit_log(100, "0xt1", 0, ALICE, 1000, 900));
        let mut broken = deposit_log(100, "0xt2", 1, BOB, 1, 1);
        broken.inner.data.data = Bytes::new();
        chain.push_log(broken);

        let result = processor.process_block(100).await;
        assert!(matches!(
            result,
            Err(IndexerError::Decode {
                block: 100,
                log_index: 1,
                source: DecodeError::Abi { .. }
            })
        ));
        assert_eq!(ledger.snapshot().await, LedgerSnapshot::default());
    }

    #[tokio::test]
    async fn test_first_event_withdraw_goes_negative() {
        let (chain, ledger, processor) = setup(200);
        chain.push_log(withdraw_log(100, "0xt1", 0, BOB, 200, 180));

        processor.process_block(100).await.unwrap();

        let snapshot = ledger.snapshot().await;
        let vault = snapshot.vault.clone().unwrap();
        assert_eq!(vault.total_shares, BigInt::from(-180));
        assert_eq!(vault.user_count, 1);
        assert_eq!(snapshot.positions[BOB].total_shares, BigInt::from(-180));
        assert_consistent(&snapshot);
    }

    #[tokio::test]
    async fn test_block_of_removed_logs_opens_no_transaction() {
        let (chain, ledger, processor) = setup(200);
        let mut log = deposit_log(100, "0xt1", 0, ALICE, 1000, 900);
        log.removed = true;
        chain.push_log(log);
        ledger.fail_next(Failpoint::Begin).await;

        let outcome = processor.process_block(100).await.unwrap();
        assert_eq!(
            outcome,
            BlockOutcome {
                logs: 1,
                applied: 0,
                duplicates: 0
            }
        );
        assert_eq!(ledger.snapshot().await, LedgerSnapshot::default());

        // The armed failpoint is still waiting for the first begin().
        chain.push_log(deposit_log(101, "0xt2", 0, ALICE, 1, 1));
        assert!(matches!(
            processor.process_block(101).await,
            Err(IndexerError::Ledger(_))
        ));
    }

    #[tokio::test]
    async fn test_header_for_another_block_aborts_block() {
        let (chain, ledger, processor) = setup(200);
        chain.push_log(deposit_log(100, "0xt1", 0, ALICE, 1000, 900));
        chain.shift_header(100);

        let result = processor.process_block(100).await;
        assert!(matches!(
            result,
            Err(IndexerError::Chain(ChainError::HeaderMismatch {
                requested: 100,
                returned: 101
            }))
        ));
        assert_eq!(ledger.snapshot().await, LedgerSnapshot::default());
    }
}
