//! The indexing pipeline.
//!
//! - `SyncLoop`: follows the chain head and hands finalized blocks over in order
//! - `BlockProcessor`: applies one block's vault logs to the ledger atomically

pub mod block_processor;
pub mod sync_loop;

pub use block_processor::{BlockOutcome, BlockProcessor};
pub use sync_loop::{PollOutcome, SyncLoop};
