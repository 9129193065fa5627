//! Follows the chain head and feeds finalized blocks to the [`BlockProcessor`].
//!
//! Each iteration reads the head, derives the highest block with enough
//! confirmations, applies every block above the persisted cursor in order and
//! only then moves the cursor. A failed iteration leaves the cursor where it
//! was, so the whole range is retried; block replay is idempotent.

use super::block_processor::BlockProcessor;
use crate::chain::ChainClient;
use crate::config::IndexerConfig;
use crate::error::IndexerError;
use crate::ledger::LedgerStore;
use alloy::primitives::Address;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Result of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No newly finalized block.
    Idle { head: u64, safe_block: u64 },
    /// Blocks `from..=to` were applied and the cursor now sits at `to`.
    Advanced { from: u64, to: u64, events: usize },
}

pub struct SyncLoop<C, L> {
    chain: Arc<C>,
    ledger: Arc<L>,
    processor: BlockProcessor<C, L>,
    config: IndexerConfig,
    shutdown_rx: watch::Receiver<bool>,
}

impl<C: ChainClient + 'static, L: LedgerStore + 'static> SyncLoop<C, L> {
    pub fn new(
        chain: Arc<C>,
        ledger: Arc<L>,
        chain_id: u64,
        vault_address: Address,
        config: IndexerConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let processor = BlockProcessor::new(chain.clone(), ledger.clone(), chain_id, vault_address);
        Self {
            chain,
            ledger,
            processor,
            config,
            shutdown_rx,
        }
    }

    /// Run a single iteration without sleeping.
    pub async fn poll_once(&self) -> Result<PollOutcome, IndexerError> {
        let head = self.chain.head_height().await?;
        let safe_block = head.saturating_sub(self.config.confirmations);
        let last_safe_block = self
            .ledger
            .sync_cursor()
            .await?
            .unwrap_or_else(|| self.config.initial_cursor());

        if safe_block <= last_safe_block {
            return Ok(PollOutcome::Idle { head, safe_block });
        }

        let target = match self.config.max_blocks_per_cycle {
            Some(max) => safe_block.min(last_safe_block.saturating_add(max.max(1))),
            None => safe_block,
        };
        let from = last_safe_block + 1;
        debug!(head = head, from = from, to = target, "Processing block range");

        let mut events = 0;
        for block in from..=target {
            events += self.processor.process_block(block).await?.applied;
        }

        self.ledger
            .advance_cursor(target)
            .await
            .map_err(|source| IndexerError::CursorPersist {
                block: target,
                source,
            })?;

        Ok(PollOutcome::Advanced {
            from,
            to: target,
            events,
        })
    }

    /// Run until the shutdown flag is raised.
    ///
    /// Errors never stop the loop; they are logged and the iteration is retried
    /// after the configured backoff. The flag is only observed between
    /// iterations, so a block transaction in flight always completes.
    pub async fn run(mut self) {
        info!(
            confirmations = self.config.confirmations,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "SyncLoop started"
        );

        let mut consecutive_failures: u32 = 0;
        loop {
            if self.is_shutdown() {
                break;
            }

            let wait = match self.poll_once().await {
                Ok(PollOutcome::Idle { head, safe_block }) => {
                    consecutive_failures = 0;
                    debug!(head = head, safe_block = safe_block, "No new finalized blocks");
                    Some(self.config.poll_interval)
                }
                Ok(PollOutcome::Advanced { from, to, events }) => {
                    consecutive_failures = 0;
                    info!(from = from, to = to, events = events, "Synced block range");
                    None
                }
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    let delay = self.config.retry_policy.delay(consecutive_failures);
                    error!(
                        error = %e,
                        attempt = consecutive_failures,
                        retry_in_ms = delay.as_millis() as u64,
                        "Sync cycle failed"
                    );
                    Some(delay)
                }
            };

            if let Some(delay) = wait {
                if self.sleep_or_shutdown(delay).await {
                    break;
                }
            }
        }

        info!("SyncLoop shutdown complete");
    }

    fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow() || self.shutdown_rx.has_changed().is_err()
    }

    /// Sleep for `duration`. Returns `true` if shutdown was requested meanwhile.
    async fn sleep_or_shutdown(&mut self, duration: Duration) -> bool {
        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    // A dropped sender means nobody can ask us to keep going.
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("SyncLoop shutting down");
                        return true;
                    }
                }

                _ = &mut sleep => return false,
            }
        }
    }
}
