//! Score element widths and the per-pair precision selector.
//!
//! A pair runs in the narrowest element type for which no stored or
//! intermediate DP value can leave the type's range. Column indices are held
//! in the same element type, so lengths are capped just below its maximum.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use super::scoring::ScoringParameters;
use crate::core::alignment::workspace::{BatchScratch, BswWorkspace};
use crate::defaults::{NARROW_MAX_SEQ_LEN, WIDE_MAX_SEQ_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Precision {
    /// i8 lanes
    Narrow,
    /// i16 lanes
    Wide,
    /// i32 scalar aligner
    Scalar,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Narrow => write!(f, "8-bit"),
            Precision::Wide => write!(f, "16-bit"),
            Precision::Scalar => write!(f, "32-bit scalar"),
        }
    }
}

/// Lane element of a vector kernel instantiation.
pub trait ScoreElem:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + Send
    + Sync
    + 'static
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
{
    const MIN_SCORE: i32;
    const MAX_SCORE: i32;
    /// Longest query or reference a lane of this type can hold.
    const MAX_SEQ_LEN: i32;
    const PRECISION: Precision;

    fn from_i32(v: i32) -> Self;
    fn to_i32(self) -> i32;
    fn wrapping_add(self, other: Self) -> Self;
    fn wrapping_sub(self, other: Self) -> Self;

    /// This element type's scratch inside a thread workspace.
    fn scratch(ws: &mut BswWorkspace) -> &mut BatchScratch<Self>;
}

impl ScoreElem for i8 {
    const MIN_SCORE: i32 = i8::MIN as i32;
    const MAX_SCORE: i32 = i8::MAX as i32;
    const MAX_SEQ_LEN: i32 = NARROW_MAX_SEQ_LEN;
    const PRECISION: Precision = Precision::Narrow;

    #[inline(always)]
    fn from_i32(v: i32) -> Self {
        debug_assert!(v >= Self::MIN_SCORE && v <= Self::MAX_SCORE, "{v} does not fit i8");
        v as i8
    }
    #[inline(always)]
    fn to_i32(self) -> i32 {
        self as i32
    }
    #[inline(always)]
    fn wrapping_add(self, other: Self) -> Self {
        i8::wrapping_add(self, other)
    }
    #[inline(always)]
    fn wrapping_sub(self, other: Self) -> Self {
        i8::wrapping_sub(self, other)
    }
    fn scratch(ws: &mut BswWorkspace) -> &mut BatchScratch<Self> {
        &mut ws.narrow
    }
}

impl ScoreElem for i16 {
    const MIN_SCORE: i32 = i16::MIN as i32;
    const MAX_SCORE: i32 = i16::MAX as i32;
    const MAX_SEQ_LEN: i32 = WIDE_MAX_SEQ_LEN;
    const PRECISION: Precision = Precision::Wide;

    #[inline(always)]
    fn from_i32(v: i32) -> Self {
        debug_assert!(v >= Self::MIN_SCORE && v <= Self::MAX_SCORE, "{v} does not fit i16");
        v as i16
    }
    #[inline(always)]
    fn to_i32(self) -> i32 {
        self as i32
    }
    #[inline(always)]
    fn wrapping_add(self, other: Self) -> Self {
        i16::wrapping_add(self, other)
    }
    #[inline(always)]
    fn wrapping_sub(self, other: Self) -> Self {
        i16::wrapping_sub(self, other)
    }
    fn scratch(ws: &mut BswWorkspace) -> &mut BatchScratch<Self> {
        &mut ws.wide
    }
}

/// True when a pair can run in lanes of `T` without overflow.
///
/// Bounds checked:
/// - lengths: column indices up to `qlen + 1` and the narrowed tail
///   (`last + 2`) are stored as `T`
/// - top: no cell exceeds `h0 + qlen * max_reward`
/// - bottom: the most negative intermediate is `1 + min_reward - max(oe_del, oe_ins)`
pub fn fits<T: ScoreElem>(params: &ScoringParameters, qlen: i32, tlen: i32, h0: i32) -> bool {
    if qlen < 0 || tlen < 0 || h0 < 0 {
        return false;
    }
    let max_len = T::MAX_SEQ_LEN;
    if qlen > max_len || tlen > max_len {
        return false;
    }
    let top = h0 as i64 + qlen as i64 * params.max_reward().max(0) as i64;
    if top > T::MAX_SCORE as i64 {
        return false;
    }
    let max_open = params.oe_del().max(params.oe_ins());
    if max_open > T::MAX_SCORE {
        return false;
    }
    1 + params.min_reward() - max_open >= T::MIN_SCORE
}

/// Narrowest precision a pair fits.
pub fn select_precision(params: &ScoringParameters, qlen: i32, tlen: i32, h0: i32) -> Precision {
    if fits::<i8>(params, qlen, tlen, h0) {
        Precision::Narrow
    } else if fits::<i16>(params, qlen, tlen, h0) {
        Precision::Wide
    } else {
        Precision::Scalar
    }
}
