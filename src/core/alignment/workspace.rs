//! Thread-local workspace for reusable allocations
//!
//! Each worker thread owns one workspace holding the lane-major transposition
//! buffers, the DP rows for both precisions and the counting-sort buffers.
//! Buffers are sized once and cleared between batches; they only grow when a
//! batch needs more rows or lanes than any earlier one.

use std::cell::RefCell;

use super::banded_swa::shared::LaneBatch;
use super::banded_swa::types::SeqPair;
use super::shared_types::DpRows;
use crate::defaults::{SORT_BLOCK_SIZE, WORKSPACE_LANES, WORKSPACE_SEQ_LEN};

// Thread-local workspace for alignment buffers
thread_local! {
    static WORKSPACE: RefCell<BswWorkspace> = RefCell::new(BswWorkspace::new());
}

/// Lane batch plus DP rows for one element type.
#[derive(Debug, Default)]
pub struct BatchScratch<T> {
    pub batch: LaneBatch<T>,
    pub dp: DpRows<T>,
}

impl<T: Copy + Default> BatchScratch<T> {
    pub fn with_capacity(seq_len: usize, lanes: usize) -> Self {
        BatchScratch {
            batch: LaneBatch::with_capacity(seq_len, lanes),
            dp: DpRows::with_capacity(seq_len + 2, lanes),
        }
    }
}

/// Reusable buffers for the scoring engine
#[derive(Debug)]
pub struct BswWorkspace {
    /// i8 lanes
    pub narrow: BatchScratch<i8>,
    /// i16 lanes
    pub wide: BatchScratch<i16>,
    /// Scratch copy for counting sort and id restore
    pub sort_tmp: Vec<SeqPair>,
    /// Counting sort histogram
    pub sort_hist: Vec<u32>,
}

impl BswWorkspace {
    pub fn new() -> Self {
        Self::with_capacity(WORKSPACE_SEQ_LEN, WORKSPACE_LANES)
    }

    /// Pre-sizes both precisions for sequences up to `seq_len` in `lanes`.
    pub fn with_capacity(seq_len: usize, lanes: usize) -> Self {
        log::trace!("allocating workspace for {seq_len} bp x {lanes} lanes");
        BswWorkspace {
            narrow: BatchScratch::with_capacity(seq_len, lanes),
            wide: BatchScratch::with_capacity(seq_len, lanes / 2),
            sort_tmp: Vec::with_capacity(SORT_BLOCK_SIZE),
            sort_hist: Vec::with_capacity(seq_len + 2),
        }
    }
}

impl Default for BswWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute a function with access to the thread-local workspace
pub fn with_workspace<F, R>(f: F) -> R
where
    F: FnOnce(&mut BswWorkspace) -> R,
{
    WORKSPACE.with(|ws| f(&mut ws.borrow_mut()))
}
