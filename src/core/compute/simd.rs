//! Runtime SIMD engine detection.
//!
//! The engine is picked once per aligner and kept in a small enum; the batch
//! dispatcher switches on it to reach the matching kernel entry points.

/// Available SIMD engine types based on CPU capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimdEngineType {
    /// 128-bit SIMD (SSE2 on x86_64, portable lanes elsewhere) - always available
    Engine128,
    /// 256-bit SIMD (AVX2) - x86_64 only
    #[cfg(target_arch = "x86_64")]
    Engine256,
}

/// Environment override that pins detection to the 128-bit engine.
pub const FORCE_SSE_ENV: &str = "FERROUS_BSW_FORCE_SSE";

/// True when the environment variable `name` is set to `1`.
pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}

/// Detects the optimal SIMD engine based on CPU features
///
/// `FERROUS_BSW_FORCE_SSE=1` skips AVX2 (x86_64 only).
pub fn detect_optimal_simd_engine() -> SimdEngineType {
    #[cfg(target_arch = "x86_64")]
    {
        if env_flag(FORCE_SSE_ENV) {
            log::info!("{FORCE_SSE_ENV}=1: using SSE (128-bit) engine");
            return SimdEngineType::Engine128;
        }
        if is_x86_feature_detected!("avx2") {
            return SimdEngineType::Engine256;
        }
        SimdEngineType::Engine128
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        SimdEngineType::Engine128
    }
}

/// Whether the running CPU can execute `engine`'s kernels.
pub fn engine_supported(engine: SimdEngineType) -> bool {
    match engine {
        SimdEngineType::Engine128 => true,
        #[cfg(target_arch = "x86_64")]
        SimdEngineType::Engine256 => is_x86_feature_detected!("avx2"),
    }
}

/// Returns a human-readable description of the SIMD engine
pub fn simd_engine_description(engine: SimdEngineType) -> &'static str {
    match engine {
        SimdEngineType::Engine128 => {
            #[cfg(target_arch = "x86_64")]
            {
                "SSE2 (128-bit, 16 x i8 / 8 x i16 lanes)"
            }
            #[cfg(not(target_arch = "x86_64"))]
            {
                "portable (128-bit, 16 x i8 / 8 x i16 lanes)"
            }
        }
        #[cfg(target_arch = "x86_64")]
        SimdEngineType::Engine256 => "AVX2 (256-bit, 32 x i8 / 16 x i16 lanes)",
    }
}

/// Lanes per batch for an engine as `(narrow, wide)`: i8 lanes and i16 lanes.
pub fn get_simd_batch_sizes(engine: SimdEngineType) -> (usize, usize) {
    match engine {
        #[cfg(target_arch = "x86_64")]
        SimdEngineType::Engine256 => (32, 16),
        SimdEngineType::Engine128 => (16, 8),
    }
}
