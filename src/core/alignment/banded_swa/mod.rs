//! Batched banded Smith-Waterman extension scoring (bwa-mem2 bandedSWA).
//!
//! Rows of the DP matrix walk the reference and columns walk the query. The
//! scalar aligner in `scalar` is the reference for the lane kernels in
//! `kernel`; both share the row bookkeeping in `tracker`.

pub mod dispatch;
pub mod engines;
pub mod kernel;
pub mod precision;
pub mod scalar;
pub mod scatter;
pub mod scoring;
pub mod shared;
pub mod tracker;
pub mod types;

pub mod isa_sse_neon;
#[cfg(target_arch = "x86_64")]
pub mod isa_avx2;

// Re-export public items from submodules
pub use dispatch::{BandedPairWiseSW, EngineConfig, FORCE_SCALAR_ENV, KernelFn, LaneKernel, compute_alignment_scores};
pub use isa_sse_neon::*;
#[cfg(target_arch = "x86_64")]
pub use isa_avx2::*;
pub use precision::{Precision, ScoreElem, fits, select_precision};
pub use scalar::*;
pub use scoring::ScoringParameters;
pub use shared::LaneBatch;
pub use types::*;
