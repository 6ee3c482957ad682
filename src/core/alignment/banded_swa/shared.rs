//! Batch preprocessing for the vector kernels.
//!
//! Pairs are padded to a whole number of lane groups, optionally counting
//! sorted by query length and then transposed group by group into lane-major
//! buffers (`LaneBatch`).

use super::precision::{ScoreElem, fits};
use super::scoring::{ScoringParameters, base_code};
use super::types::SeqPair;
use crate::core::alignment::shared_types::LaneMatrix;
use crate::error::{BswError, Result};

/// One lane group in lane-major form plus its per-lane parameters.
///
/// Reference rows `0..max_tlen` and query rows `0..max_qlen + 2` are stored;
/// the two extra query rows are read (and discarded) by the sweep just past
/// the longest query. Positions past a lane's own length hold code 0.
#[derive(Debug, Default)]
pub struct LaneBatch<T> {
    pub ref_soa: LaneMatrix<T>,
    pub query_soa: LaneMatrix<T>,
    pub qlen: Vec<i32>,
    pub tlen: Vec<i32>,
    pub h0: Vec<i32>,
    /// Band half-width after the reach bounds
    pub band: Vec<i32>,
    lanes: usize,
    max_qlen: usize,
    max_tlen: usize,
}

impl<T: Copy + Default> LaneBatch<T> {
    pub fn with_capacity(seq_len: usize, lanes: usize) -> Self {
        LaneBatch {
            ref_soa: LaneMatrix::with_capacity(seq_len, lanes),
            query_soa: LaneMatrix::with_capacity(seq_len + 2, lanes),
            qlen: Vec::with_capacity(lanes),
            tlen: Vec::with_capacity(lanes),
            h0: Vec::with_capacity(lanes),
            band: Vec::with_capacity(lanes),
            lanes: 0,
            max_qlen: 0,
            max_tlen: 0,
        }
    }

    #[inline]
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    #[inline]
    pub fn max_qlen(&self) -> usize {
        self.max_qlen
    }

    #[inline]
    pub fn max_tlen(&self) -> usize {
        self.max_tlen
    }
}

impl<T: ScoreElem> LaneBatch<T> {
    /// Transposes up to `lanes` pairs into this batch.
    ///
    /// Missing lanes become empty pairs. A pair that does not fit `T` or
    /// whose range leaves its buffer is rejected, never truncated.
    pub fn load(
        &mut self,
        pairs: &[SeqPair],
        lanes: usize,
        ref_buf: &[u8],
        query_buf: &[u8],
        params: &ScoringParameters,
        w: i32,
    ) -> Result<()> {
        for (index, p) in pairs.iter().enumerate() {
            if !fits::<T>(params, p.query_len, p.ref_len, p.h0) {
                return Err(BswError::PrecisionOverflow {
                    index,
                    qlen: p.query_len,
                    tlen: p.ref_len,
                    h0: p.h0,
                    precision: T::PRECISION,
                });
            }
            pair_slice(ref_buf, p.ref_offset, p.ref_len, index, "reference")?;
            pair_slice(query_buf, p.query_offset, p.query_len, index, "query")?;
        }
        self.load_validated(pairs, lanes, ref_buf, query_buf, params, w);
        Ok(())
    }

    /// [`LaneBatch::load`] for pairs already checked with [`pair_slice`] and
    /// [`fits`].
    pub(crate) fn load_validated(
        &mut self,
        pairs: &[SeqPair],
        lanes: usize,
        ref_buf: &[u8],
        query_buf: &[u8],
        params: &ScoringParameters,
        w: i32,
    ) {
        debug_assert!(pairs.len() <= lanes, "{} pairs for {lanes} lanes", pairs.len());

        let mut max_q = 0usize;
        let mut max_t = 0usize;
        for p in pairs {
            debug_assert!(fits::<T>(params, p.query_len, p.ref_len, p.h0), "{p:?} does not fit {}", T::PRECISION);
            max_q = max_q.max(p.query_len as usize);
            max_t = max_t.max(p.ref_len as usize);
        }

        self.lanes = lanes;
        self.max_qlen = max_q;
        self.max_tlen = max_t;
        self.ref_soa.reshape(max_t, lanes);
        self.query_soa.reshape(max_q + 2, lanes);
        self.qlen.clear();
        self.tlen.clear();
        self.h0.clear();
        self.band.clear();

        for (lane, p) in pairs.iter().enumerate() {
            let target = &ref_buf[p.ref_offset..p.ref_offset + p.ref_len as usize];
            let query = &query_buf[p.query_offset..p.query_offset + p.query_len as usize];
            for (k, &b) in target.iter().enumerate() {
                self.ref_soa.set(k, lane, T::from_i32(base_code(b) as i32));
            }
            for (k, &b) in query.iter().enumerate() {
                self.query_soa.set(k, lane, T::from_i32(base_code(b) as i32));
            }
            self.qlen.push(p.query_len);
            self.tlen.push(p.ref_len);
            self.h0.push(p.h0);
            self.band.push(params.effective_band(p.query_len, w));
        }
        for _ in pairs.len()..lanes {
            self.qlen.push(0);
            self.tlen.push(0);
            self.h0.push(0);
            self.band.push(0);
        }
    }
}

/// Byte range of one sequence of a pair, checked against its buffer.
pub fn pair_slice<'a>(
    buf: &'a [u8],
    offset: usize,
    len: i32,
    index: usize,
    which: &'static str,
) -> Result<&'a [u8]> {
    usize::try_from(len)
        .ok()
        .and_then(|n| offset.checked_add(n))
        .and_then(|end| buf.get(offset..end))
        .ok_or(BswError::SequenceOutOfBounds {
            index,
            which,
            offset,
            len,
            buffer_len: buf.len(),
        })
}

/// Pads a working pair array to a multiple of `lanes` with empty pairs.
///
/// Padding entries carry the next positional ids, so a later restore by id
/// leaves them at the tail.
pub fn pad_pairs(pairs: &mut Vec<SeqPair>, lanes: usize) {
    let target = pairs.len().div_ceil(lanes) * lanes;
    while pairs.len() < target {
        let id = pairs.len();
        pairs.push(SeqPair::default().with_id(id));
    }
}

/// Stable counting sort of a block by query length (bwa-mem2 sortPairsLen).
///
/// `tmp` and `hist` are caller-owned scratch so the sort does not allocate
/// once they have grown to the block size.
pub fn sort_pairs_len(pairs: &mut [SeqPair], tmp: &mut Vec<SeqPair>, hist: &mut Vec<u32>) {
    if pairs.len() < 2 {
        return;
    }
    let max_len = pairs.iter().map(|p| p.query_len.max(0) as usize).max().unwrap_or(0);

    hist.clear();
    hist.resize(max_len + 1, 0);
    for p in pairs.iter() {
        hist[p.query_len.max(0) as usize] += 1;
    }
    let mut start = 0u32;
    for h in hist.iter_mut() {
        let count = *h;
        *h = start;
        start += count;
    }

    tmp.clear();
    tmp.resize(pairs.len(), SeqPair::default());
    for p in pairs.iter() {
        let slot = &mut hist[p.query_len.max(0) as usize];
        tmp[*slot as usize] = *p;
        *slot += 1;
    }
    pairs.copy_from_slice(tmp);
}

/// Emits a kernel entry point for one engine and lane count.
///
/// The `target_feature` arm compiles the generic kernel with that ISA enabled;
/// callers must check the feature at runtime before calling the result.
#[macro_export]
macro_rules! generate_swa_entry {
    (
        name = $name:ident,
        width = $W:expr,
        engine = $E:ty,
        elem = $T:ty,
        cfg = $cfg:meta,
        target_feature = $tf:literal,
    ) => {
        #[$cfg]
        #[target_feature(enable = $tf)]
        pub unsafe fn $name(
            batch: &$crate::core::alignment::banded_swa::shared::LaneBatch<$T>,
            params: &$crate::core::alignment::banded_swa::scoring::ScoringParameters,
            dp: &mut $crate::core::alignment::shared_types::DpRows<$T>,
        ) -> Vec<$crate::core::alignment::banded_swa::types::LaneOutcome> {
            unsafe { $crate::core::alignment::banded_swa::kernel::sw_kernel::<{ $W }, $E>(batch, params, dp) }
        }
    };
    (
        name = $name:ident,
        width = $W:expr,
        engine = $E:ty,
        elem = $T:ty,
        cfg = $cfg:meta,
    ) => {
        #[$cfg]
        pub unsafe fn $name(
            batch: &$crate::core::alignment::banded_swa::shared::LaneBatch<$T>,
            params: &$crate::core::alignment::banded_swa::scoring::ScoringParameters,
            dp: &mut $crate::core::alignment::shared_types::DpRows<$T>,
        ) -> Vec<$crate::core::alignment::banded_swa::types::LaneOutcome> {
            unsafe { $crate::core::alignment::banded_swa::kernel::sw_kernel::<{ $W }, $E>(batch, params, dp) }
        }
    };
}
