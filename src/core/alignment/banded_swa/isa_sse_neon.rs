//! 128-bit entry points: 16 lanes of i8 and 8 lanes of i16.
//!
//! SSE2 is part of the x86_64 baseline; elsewhere the same lane counts run on
//! the portable array engine.

#[cfg(not(target_arch = "x86_64"))]
use super::engines::PortableEngine;
#[cfg(target_arch = "x86_64")]
use super::engines::{SwEngine128, SwEngine128I16};
use crate::generate_swa_entry;

generate_swa_entry!(
    name = simd_banded_swa_batch16,
    width = 16,
    engine = SwEngine128,
    elem = i8,
    cfg = cfg(target_arch = "x86_64"),
    target_feature = "sse2",
);

generate_swa_entry!(
    name = simd_banded_swa_batch8_int16,
    width = 8,
    engine = SwEngine128I16,
    elem = i16,
    cfg = cfg(target_arch = "x86_64"),
    target_feature = "sse2",
);

generate_swa_entry!(
    name = simd_banded_swa_batch16,
    width = 16,
    engine = PortableEngine<i8, 16>,
    elem = i8,
    cfg = cfg(not(target_arch = "x86_64")),
);

generate_swa_entry!(
    name = simd_banded_swa_batch8_int16,
    width = 8,
    engine = PortableEngine<i16, 8>,
    elem = i16,
    cfg = cfg(not(target_arch = "x86_64")),
);
