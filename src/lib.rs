//! Batched banded Smith-Waterman scoring for seed extension.
//!
//! ```no_run
//! use ferrous_bsw::{BandedPairWiseSW, ScoringParameters, SeqPair};
//!
//! let reference = [0u8, 1, 2, 3, 0, 1];
//! let query = [0u8, 1, 2, 3];
//! let mut pairs = vec![SeqPair::new(0, 6, 0, 4, 10)];
//! let sw = BandedPairWiseSW::new(ScoringParameters::default());
//! let stats = sw.get_scores(&mut pairs, &reference, &query, 0, 100)?;
//! assert_eq!(pairs[0].score, 14);
//! # let _ = stats;
//! # Ok::<(), ferrous_bsw::BswError>(())
//! ```

pub mod core;
pub mod defaults;
pub mod error;

pub use crate::core::alignment::banded_swa::{
    BandedPairWiseSW, BswStats, EngineConfig, OutScore, Precision, ScoringParameters, SeqPair,
    compute_alignment_scores, scalar_banded_swa,
};
pub use crate::core::compute::simd::{SimdEngineType, detect_optimal_simd_engine};
pub use crate::error::{BswError, Result};
