//! AVX2 (256-bit) entry points: 32 lanes of i8 and 16 lanes of i16.
//!
//! Callers must confirm `is_x86_feature_detected!("avx2")` first; the
//! dispatcher only selects these for `SimdEngineType::Engine256`, which
//! detection grants only on AVX2 hardware.

#![cfg(target_arch = "x86_64")]

use super::engines::{SwEngine256, SwEngine256I16};
use crate::generate_swa_entry;

generate_swa_entry!(
    name = simd_banded_swa_batch32,
    width = 32,
    engine = SwEngine256,
    elem = i8,
    cfg = cfg(target_arch = "x86_64"),
    target_feature = "avx2",
);

generate_swa_entry!(
    name = simd_banded_swa_batch16_int16,
    width = 16,
    engine = SwEngine256I16,
    elem = i16,
    cfg = cfg(target_arch = "x86_64"),
    target_feature = "avx2",
);
