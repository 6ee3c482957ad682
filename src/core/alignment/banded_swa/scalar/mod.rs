//! Scalar reference aligner: the exact banded recurrence in i32, one pair at a
//! time. Vector kernels are checked against it lane by lane.

pub mod implementation;

pub use implementation::{ScalarTrace, scalar_banded_swa, scalar_banded_swa_traced};
