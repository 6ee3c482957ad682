//! Compute backend selection for the alignment kernels.

pub mod simd;
