// src/defaults.rs

// Algorithmic Constants
pub const BAND_WIDTH: i32 = 100;
pub const OFF_DIAGONAL_DROPOFF: i32 = 100;
pub const END_BONUS: i32 = 5;

// Scoring Constants
pub const MATCH_SCORE: i32 = 1;
pub const MISMATCH_PENALTY: i32 = 4;
pub const AMBIGUOUS_PENALTY: i32 = 1;
pub const GAP_OPEN_DEL: i32 = 6;
pub const GAP_EXTEND_DEL: i32 = 1;
pub const GAP_OPEN_INS: i32 = 6;
pub const GAP_EXTEND_INS: i32 = 1;

// Precision Limits
/// Longest query or reference an i8 lane holds (column indices up to
/// `len + 2` are stored in the lane type)
pub const NARROW_MAX_SEQ_LEN: i32 = i8::MAX as i32 - 2;
/// Longest query or reference an i16 lane holds
pub const WIDE_MAX_SEQ_LEN: i32 = i16::MAX as i32 - 2;

// Batching Constants
/// Working pairs per counting-sort block (bwa-mem2 SORT_BLOCK_SIZE)
pub const SORT_BLOCK_SIZE: usize = 16384;
/// Sequence length the thread-local workspace is pre-sized for
pub const WORKSPACE_SEQ_LEN: usize = 128;
/// Lane count the thread-local workspace is pre-sized for (AVX2 narrow)
pub const WORKSPACE_LANES: usize = 32;
