//! Batch dispatcher.
//!
//! Every call classifies each pair by precision, batches each class in
//! lanes of the selected engine, scores the batches on rayon workers and
//! writes the outputs back into the caller's records in their original order.

use std::time::Instant;

use rayon::prelude::*;

#[cfg(target_arch = "x86_64")]
use super::isa_avx2::{simd_banded_swa_batch16_int16, simd_banded_swa_batch32};
use super::isa_sse_neon::{simd_banded_swa_batch8_int16, simd_banded_swa_batch16};
use super::precision::{Precision, ScoreElem, fits, select_precision};
use super::scalar::{scalar_banded_swa, scalar_banded_swa_traced};
use super::scatter::{scatter_lane_outcomes, scatter_outputs, sort_pairs_id};
use super::scoring::ScoringParameters;
use super::shared::{LaneBatch, pad_pairs, pair_slice, sort_pairs_len};
use super::types::{BswStats, LaneOutcome, OutScore, SeqPair};
use crate::core::alignment::shared_types::DpRows;
use crate::core::alignment::workspace::{BatchScratch, with_workspace};
use crate::core::compute::simd::{
    SimdEngineType, detect_optimal_simd_engine, engine_supported, env_flag, get_simd_batch_sizes,
    simd_engine_description,
};
use crate::defaults::SORT_BLOCK_SIZE;
use crate::error::{BswError, Result};

/// Environment override that routes every pair through the scalar aligner.
pub const FORCE_SCALAR_ENV: &str = "FERROUS_BSW_FORCE_SCALAR";

/// Signature shared by all generated kernel entry points.
pub type KernelFn<T> = unsafe fn(&LaneBatch<T>, &ScoringParameters, &mut DpRows<T>) -> Vec<LaneOutcome>;

/// Element types with kernel entry points for every engine.
pub trait LaneKernel: ScoreElem {
    fn lanes(engine: SimdEngineType) -> usize;
    fn kernel(engine: SimdEngineType) -> KernelFn<Self>;
}

impl LaneKernel for i8 {
    fn lanes(engine: SimdEngineType) -> usize {
        get_simd_batch_sizes(engine).0
    }

    fn kernel(engine: SimdEngineType) -> KernelFn<i8> {
        match engine {
            #[cfg(target_arch = "x86_64")]
            SimdEngineType::Engine256 => simd_banded_swa_batch32 as KernelFn<i8>,
            SimdEngineType::Engine128 => simd_banded_swa_batch16 as KernelFn<i8>,
        }
    }
}

impl LaneKernel for i16 {
    fn lanes(engine: SimdEngineType) -> usize {
        get_simd_batch_sizes(engine).1
    }

    fn kernel(engine: SimdEngineType) -> KernelFn<i16> {
        match engine {
            #[cfg(target_arch = "x86_64")]
            SimdEngineType::Engine256 => simd_banded_swa_batch16_int16 as KernelFn<i16>,
            SimdEngineType::Engine128 => simd_banded_swa_batch8_int16 as KernelFn<i16>,
        }
    }
}

/// Engine knobs that do not change results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Counting-sort pairs by query length within each block before batching
    pub sort_pairs: bool,
    /// Pin the SIMD engine; `None` detects at construction
    pub engine: Option<SimdEngineType>,
    /// Route every pair through the scalar aligner
    pub scalar_only: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sort_pairs: true,
            engine: None,
            scalar_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Routing {
    Auto,
    Forced(Precision),
}

/// Banded pairwise Smith-Waterman engine bound to one scoring scheme.
///
/// Immutable after construction and shareable across threads.
#[derive(Debug, Clone)]
pub struct BandedPairWiseSW {
    params: ScoringParameters,
    engine: SimdEngineType,
    sort_pairs: bool,
    scalar_only: bool,
}

impl BandedPairWiseSW {
    pub fn new(params: ScoringParameters) -> Self {
        Self::with_config(params, EngineConfig::default())
    }

    pub fn with_config(params: ScoringParameters, config: EngineConfig) -> Self {
        let mut engine = config.engine.unwrap_or_else(detect_optimal_simd_engine);
        if !engine_supported(engine) {
            log::warn!(
                "{} is not supported on this CPU; using 128-bit lanes",
                simd_engine_description(engine)
            );
            engine = SimdEngineType::Engine128;
        }
        let scalar_only = config.scalar_only || env_flag(FORCE_SCALAR_ENV);
        if scalar_only {
            log::info!("Banded SW: scalar aligner only");
        } else {
            log::info!("Banded SW engine: {}", simd_engine_description(engine));
        }
        BandedPairWiseSW {
            params,
            engine,
            sort_pairs: config.sort_pairs,
            scalar_only,
        }
    }

    pub fn params(&self) -> &ScoringParameters {
        &self.params
    }

    pub fn engine(&self) -> SimdEngineType {
        self.engine
    }

    pub fn is_scalar_only(&self) -> bool {
        self.scalar_only
    }

    /// Scores one pair with the scalar aligner.
    pub fn scalar_banded_swa(&self, qlen: i32, query: &[u8], tlen: i32, target: &[u8], w: i32, h0: i32) -> OutScore {
        scalar_banded_swa(&self.params, qlen, query, tlen, target, w, h0)
    }

    /// Scores every pair in place, each at the narrowest precision it fits.
    ///
    /// `num_threads`: 1 runs on the calling thread, 0 uses the current rayon
    /// pool, anything else a pool of that size. Inputs are validated before
    /// any pair is scored, so an `Err` leaves every output field untouched.
    pub fn get_scores(
        &self,
        pairs: &mut [SeqPair],
        ref_buf: &[u8],
        query_buf: &[u8],
        num_threads: usize,
        w: i32,
    ) -> Result<BswStats> {
        self.run(pairs, ref_buf, query_buf, num_threads, w, Routing::Auto)
    }

    /// Scores every pair in 8-bit lanes; a pair that does not fit is an error.
    pub fn get_scores8(
        &self,
        pairs: &mut [SeqPair],
        ref_buf: &[u8],
        query_buf: &[u8],
        num_threads: usize,
        w: i32,
    ) -> Result<BswStats> {
        self.run(pairs, ref_buf, query_buf, num_threads, w, Routing::Forced(Precision::Narrow))
    }

    /// Scores every pair in 16-bit lanes; a pair that does not fit is an error.
    pub fn get_scores16(
        &self,
        pairs: &mut [SeqPair],
        ref_buf: &[u8],
        query_buf: &[u8],
        num_threads: usize,
        w: i32,
    ) -> Result<BswStats> {
        self.run(pairs, ref_buf, query_buf, num_threads, w, Routing::Forced(Precision::Wide))
    }

    /// Scores every pair with the scalar aligner, in parallel by pair.
    pub fn scalar_banded_swa_wrapper(
        &self,
        pairs: &mut [SeqPair],
        ref_buf: &[u8],
        query_buf: &[u8],
        num_threads: usize,
        w: i32,
    ) -> Result<BswStats> {
        self.run(pairs, ref_buf, query_buf, num_threads, w, Routing::Forced(Precision::Scalar))
    }

    fn run(
        &self,
        pairs: &mut [SeqPair],
        ref_buf: &[u8],
        query_buf: &[u8],
        num_threads: usize,
        w: i32,
        routing: Routing,
    ) -> Result<BswStats> {
        let setup = Instant::now();
        if w < 0 {
            return Err(BswError::NegativeBandWidth(w));
        }

        let mut classes: [Vec<usize>; 3] = Default::default();
        for (index, p) in pairs.iter().enumerate() {
            pair_slice(ref_buf, p.ref_offset, p.ref_len, index, "reference")?;
            pair_slice(query_buf, p.query_offset, p.query_len, index, "query")?;
            let precision = self.classify(index, p, routing)?;
            classes[precision as usize].push(index);
        }
        let [narrow, wide, scalar] = classes;

        if matches!(routing, Routing::Auto) && !self.scalar_only && !scalar.is_empty() {
            log::warn!(
                "{} of {} pairs exceed the 16-bit lane range; scoring them with the scalar aligner",
                scalar.len(),
                pairs.len()
            );
        }

        let mut stats = BswStats {
            narrow_pairs: narrow.len(),
            wide_pairs: wide.len(),
            scalar_pairs: scalar.len(),
            ..BswStats::default()
        };
        let parallel = num_threads != 1;
        let pool = thread_pool(num_threads)?;
        stats.setup += setup.elapsed();

        let classes = (narrow.as_slice(), wide.as_slice(), scalar.as_slice());
        match pool {
            Some(pool) => pool.install(|| self.run_classes(pairs, classes, ref_buf, query_buf, w, parallel, &mut stats))?,
            None => self.run_classes(pairs, classes, ref_buf, query_buf, w, parallel, &mut stats)?,
        }

        log::debug!(
            "Banded SW: {} pairs ({} i8, {} i16, {} scalar); setup {:?}, sort {:?}, sw {:?}, restore {:?}; {} cells",
            stats.total_pairs(),
            stats.narrow_pairs,
            stats.wide_pairs,
            stats.scalar_pairs,
            stats.setup,
            stats.sort,
            stats.kernel,
            stats.restore,
            stats.cells
        );
        Ok(stats)
    }

    fn classify(&self, index: usize, p: &SeqPair, routing: Routing) -> Result<Precision> {
        let precision = match routing {
            Routing::Auto => select_precision(&self.params, p.query_len, p.ref_len, p.h0),
            Routing::Forced(precision) => {
                let ok = match precision {
                    Precision::Narrow => fits::<i8>(&self.params, p.query_len, p.ref_len, p.h0),
                    Precision::Wide => fits::<i16>(&self.params, p.query_len, p.ref_len, p.h0),
                    Precision::Scalar => true,
                };
                if !ok {
                    return Err(BswError::PrecisionOverflow {
                        index,
                        qlen: p.query_len,
                        tlen: p.ref_len,
                        h0: p.h0,
                        precision,
                    });
                }
                precision
            }
        };
        Ok(if self.scalar_only { Precision::Scalar } else { precision })
    }

    #[allow(clippy::too_many_arguments)]
    fn run_classes(
        &self,
        pairs: &mut [SeqPair],
        (narrow, wide, scalar): (&[usize], &[usize], &[usize]),
        ref_buf: &[u8],
        query_buf: &[u8],
        w: i32,
        parallel: bool,
        stats: &mut BswStats,
    ) -> Result<()> {
        self.run_lanes::<i8>(pairs, narrow, ref_buf, query_buf, w, parallel, stats)?;
        self.run_lanes::<i16>(pairs, wide, ref_buf, query_buf, w, parallel, stats)?;
        self.run_scalar(pairs, scalar, ref_buf, query_buf, w, parallel, stats)
    }

    /// Pads, sorts, scores and restores one precision class.
    #[allow(clippy::too_many_arguments)]
    fn run_lanes<T: LaneKernel>(
        &self,
        pairs: &mut [SeqPair],
        members: &[usize],
        ref_buf: &[u8],
        query_buf: &[u8],
        w: i32,
        parallel: bool,
        stats: &mut BswStats,
    ) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let lanes = T::lanes(self.engine);
        let kernel = T::kernel(self.engine);

        let setup = Instant::now();
        let mut work: Vec<SeqPair> = members
            .iter()
            .enumerate()
            .map(|(pos, &idx)| pairs[idx].with_id(pos))
            .collect();
        pad_pairs(&mut work, lanes);
        stats.setup += setup.elapsed();

        if self.sort_pairs {
            let sort = Instant::now();
            for_each_block(&mut work, parallel, |_, block| {
                with_workspace(|ws| sort_pairs_len(block, &mut ws.sort_tmp, &mut ws.sort_hist))
            });
            stats.sort += sort.elapsed();
        }

        let sw = Instant::now();
        stats.cells += score_batches(&mut work, lanes, kernel, ref_buf, query_buf, &self.params, w, parallel);
        stats.kernel += sw.elapsed();

        let restore = Instant::now();
        if self.sort_pairs {
            for_each_block(&mut work, parallel, |first, block| {
                with_workspace(|ws| sort_pairs_id(block, first, &mut ws.sort_tmp))
            });
        }
        scatter_outputs(&work, members, pairs);
        stats.restore += restore.elapsed();
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_scalar(
        &self,
        pairs: &mut [SeqPair],
        members: &[usize],
        ref_buf: &[u8],
        query_buf: &[u8],
        w: i32,
        parallel: bool,
        stats: &mut BswStats,
    ) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let sw = Instant::now();
        let view: &[SeqPair] = pairs;
        let score_one = |&idx: &usize| -> Result<(OutScore, u64)> {
            let p = &view[idx];
            let target = pair_slice(ref_buf, p.ref_offset, p.ref_len, idx, "reference")?;
            let query = pair_slice(query_buf, p.query_offset, p.query_len, idx, "query")?;
            let (out, trace) =
                scalar_banded_swa_traced(&self.params, p.query_len, query, p.ref_len, target, w, p.h0);
            Ok((out, trace.cells))
        };
        let results: Vec<(OutScore, u64)> = if parallel {
            members.par_iter().map(score_one).collect::<Result<_>>()?
        } else {
            members.iter().map(score_one).collect::<Result<_>>()?
        };
        stats.kernel += sw.elapsed();

        let restore = Instant::now();
        for (&idx, (out, cells)) in members.iter().zip(results) {
            pairs[idx].set_outputs(&out);
            stats.cells += cells;
        }
        stats.restore += restore.elapsed();
        Ok(())
    }
}

/// Scores `pairs` in place with a fresh engine for `params`.
pub fn compute_alignment_scores(
    params: &ScoringParameters,
    pairs: &mut [SeqPair],
    ref_buf: &[u8],
    query_buf: &[u8],
    num_threads: usize,
    w: i32,
) -> Result<BswStats> {
    BandedPairWiseSW::new(params.clone()).get_scores(pairs, ref_buf, query_buf, num_threads, w)
}

fn thread_pool(num_threads: usize) -> Result<Option<rayon::ThreadPool>> {
    if num_threads <= 1 || num_threads == rayon::current_num_threads() {
        return Ok(None);
    }
    log::debug!("Building a {num_threads}-thread pool for banded SW");
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("bsw-worker-{i}"))
        .build()?;
    Ok(Some(pool))
}

/// Runs `f(first_id, block)` over `SORT_BLOCK_SIZE` blocks of a working array.
fn for_each_block<F>(work: &mut [SeqPair], parallel: bool, f: F)
where
    F: Fn(usize, &mut [SeqPair]) + Sync + Send,
{
    if parallel {
        work.par_chunks_mut(SORT_BLOCK_SIZE)
            .enumerate()
            .for_each(|(b, block)| f(b * SORT_BLOCK_SIZE, block));
    } else {
        work.chunks_mut(SORT_BLOCK_SIZE)
            .enumerate()
            .for_each(|(b, block)| f(b * SORT_BLOCK_SIZE, block));
    }
}

/// Scores a padded working array lane group by lane group; returns cells.
///
/// Every real pair must already have passed `pair_slice` and `fits::<T>`.
#[allow(clippy::too_many_arguments)]
fn score_batches<T: ScoreElem>(
    work: &mut [SeqPair],
    lanes: usize,
    kernel: KernelFn<T>,
    ref_buf: &[u8],
    query_buf: &[u8],
    params: &ScoringParameters,
    w: i32,
    parallel: bool,
) -> u64 {
    let score_chunk = |chunk: &mut [SeqPair]| -> u64 {
        with_workspace(|ws| {
            let BatchScratch { batch, dp } = T::scratch(ws);
            batch.load_validated(chunk, lanes, ref_buf, query_buf, params, w);
            log::trace!(
                "{} batch: {lanes} lanes, max qlen {}, max tlen {}",
                T::PRECISION,
                batch.max_qlen(),
                batch.max_tlen()
            );
            // SAFETY: `kernel` belongs to an engine the CPU supports and the
            // batch was loaded with that engine's lane count.
            let outcomes = unsafe { kernel(batch, params, dp) };
            scatter_lane_outcomes(chunk, &outcomes)
        })
    };

    if parallel {
        work.par_chunks_mut(lanes).map(score_chunk).sum()
    } else {
        work.chunks_mut(lanes).map(score_chunk).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(config: EngineConfig) -> BandedPairWiseSW {
        BandedPairWiseSW::with_config(ScoringParameters::default(), config)
    }

    #[test]
    fn negative_band_is_rejected_before_scoring() {
        let sw = engine(EngineConfig::default());
        let seq = [0u8, 1, 2, 3];
        let mut pairs = vec![SeqPair::new(0, 4, 0, 4, 10)];
        let err = sw.get_scores(&mut pairs, &seq, &seq, 1, -1).unwrap_err();
        assert!(matches!(err, BswError::NegativeBandWidth(-1)));
        assert_eq!(pairs[0].score, 0);
    }

    #[test]
    fn out_of_range_pair_leaves_outputs_untouched() {
        let sw = engine(EngineConfig::default());
        let seq = [0u8, 1, 2, 3];
        let mut pairs = vec![SeqPair::new(0, 4, 0, 4, 10), SeqPair::new(2, 4, 0, 4, 10)];
        let err = sw.get_scores(&mut pairs, &seq, &seq, 1, 100).unwrap_err();
        assert!(matches!(err, BswError::SequenceOutOfBounds { index: 1, which: "reference", .. }));
        assert_eq!(pairs[0].score, 0, "no pair is scored when validation fails");
    }

    #[test]
    fn forced_precision_rejects_misfits() {
        let sw = engine(EngineConfig::default());
        let seq = vec![1u8; 300];
        let mut pairs = vec![SeqPair::new(0, 10, 0, 10, 10), SeqPair::new(0, 200, 0, 200, 10)];
        let err = sw.get_scores8(&mut pairs, &seq, &seq, 1, 100).unwrap_err();
        assert!(matches!(
            err,
            BswError::PrecisionOverflow {
                index: 1,
                precision: Precision::Narrow,
                ..
            }
        ));
        let stats = sw.get_scores16(&mut pairs, &seq, &seq, 1, 100).unwrap();
        assert_eq!(stats.wide_pairs, 2);
        assert_eq!(pairs[1].score, 210);
    }

    #[test]
    fn scalar_only_routes_everything_to_scalar() {
        let sw = engine(EngineConfig {
            scalar_only: true,
            ..EngineConfig::default()
        });
        let seq = [2u8; 16];
        let mut pairs = vec![SeqPair::new(0, 16, 0, 16, 4); 3];
        let stats = sw.get_scores(&mut pairs, &seq, &seq, 1, 100).unwrap();
        assert_eq!((stats.narrow_pairs, stats.wide_pairs, stats.scalar_pairs), (0, 0, 3));
        assert!(pairs.iter().all(|p| p.score == 20));
    }

    #[test]
    fn lane_counts_match_entry_widths() {
        assert_eq!(<i8 as LaneKernel>::lanes(SimdEngineType::Engine128), 16);
        assert_eq!(<i16 as LaneKernel>::lanes(SimdEngineType::Engine128), 8);
    }
}
