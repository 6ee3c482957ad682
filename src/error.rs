//! Error type shared by the scoring engine.
//!
//! Every check that can fail runs before the first batch is dispatched, so a
//! returned error never leaves a pair array half-populated.

use crate::core::alignment::banded_swa::precision::Precision;

#[derive(Debug, thiserror::Error)]
pub enum BswError {
    #[error("invalid scoring parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("band width must be non-negative, got {0}")]
    NegativeBandWidth(i32),

    #[error("pair {index}: {which} range {offset}+{len} lies outside a buffer of {buffer_len} bytes")]
    SequenceOutOfBounds {
        index: usize,
        which: &'static str,
        offset: usize,
        len: i32,
        buffer_len: usize,
    },

    #[error(
        "pair {index}: query {qlen} / reference {tlen} with h0 {h0} does not fit {precision} precision"
    )]
    PrecisionOverflow {
        index: usize,
        qlen: i32,
        tlen: i32,
        h0: i32,
        precision: Precision,
    },

    #[error("failed to build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, BswError>;
