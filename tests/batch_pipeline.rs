// tests/batch_pipeline.rs
// Full get_scores pipeline: precision routing, sorting, threading and order
// restoration must never change a pair's result.
use ferrous_bsw::{
    BandedPairWiseSW, BswError, EngineConfig, OutScore, Precision, ScoringParameters, SeqPair, SimdEngineType,
    scalar_banded_swa,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

struct Workload {
    pairs: Vec<SeqPair>,
    ref_buf: Vec<u8>,
    query_buf: Vec<u8>,
}

impl Workload {
    fn push(&mut self, target: &[u8], query: &[u8], h0: i32) {
        self.pairs.push(SeqPair::new(
            self.ref_buf.len(),
            target.len() as i32,
            self.query_buf.len(),
            query.len() as i32,
            h0,
        ));
        self.ref_buf.extend_from_slice(target);
        self.query_buf.extend_from_slice(query);
    }

    /// Scalar answer for every pair, in order.
    fn expected(&self, params: &ScoringParameters, w: i32) -> Vec<OutScore> {
        self.pairs
            .iter()
            .map(|p| {
                let t = &self.ref_buf[p.ref_offset..p.ref_offset + p.ref_len as usize];
                let q = &self.query_buf[p.query_offset..p.query_offset + p.query_len as usize];
                scalar_banded_swa(params, p.query_len, q, p.ref_len, t, w, p.h0)
            })
            .collect()
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pairs of wildly different lengths covering all three precision classes.
fn mixed_workload(seed: u64, n: usize) -> Workload {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut wl = Workload {
        pairs: Vec::with_capacity(n),
        ref_buf: Vec::new(),
        query_buf: Vec::new(),
    };
    for i in 0..n {
        let (len, h0) = match i % 8 {
            0..=3 => (rng.gen_range(0..60), rng.gen_range(1..40)),
            4..=5 => (rng.gen_range(100..400), rng.gen_range(1..200)),
            6 => (rng.gen_range(1..12), rng.gen_range(1..5)),
            _ => (rng.gen_range(20..80), 40_000),
        };
        let target: Vec<u8> = (0..len).map(|_| rng.gen_range(0..4)).collect();
        let mut query = target.clone();
        for b in query.iter_mut() {
            if rng.gen_bool(0.08) {
                *b = rng.gen_range(0..5);
            }
        }
        if len > 10 && rng.gen_bool(0.3) {
            let at = rng.gen_range(0..len - 5);
            query.drain(at..at + rng.gen_range(1..5));
        }
        wl.push(&target, &query, h0);
    }
    wl
}

fn outputs(pairs: &[SeqPair]) -> Vec<OutScore> {
    pairs.iter().map(SeqPair::outputs).collect()
}

#[test]
fn routed_pipeline_matches_scalar_per_pair() {
    init_logging();
    let params = ScoringParameters::default();
    let mut wl = mixed_workload(1, 200);
    let want = wl.expected(&params, 100);

    let sw = BandedPairWiseSW::new(params);
    let stats = sw.get_scores(&mut wl.pairs, &wl.ref_buf, &wl.query_buf, 1, 100).unwrap();

    assert_eq!(outputs(&wl.pairs), want);
    assert_eq!(stats.total_pairs(), 200);
    assert!(stats.narrow_pairs > 0 && stats.wide_pairs > 0 && stats.scalar_pairs > 0, "{stats:?}");
}

#[test]
fn sorting_does_not_change_results() {
    let params = ScoringParameters::default();
    let wl = mixed_workload(2, 64);

    let mut runs = Vec::new();
    for sort_pairs in [true, false] {
        let sw = BandedPairWiseSW::with_config(
            params.clone(),
            EngineConfig {
                sort_pairs,
                ..EngineConfig::default()
            },
        );
        let mut pairs = wl.pairs.clone();
        sw.get_scores(&mut pairs, &wl.ref_buf, &wl.query_buf, 1, 100).unwrap();
        runs.push(outputs(&pairs));
    }
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0], wl.expected(&params, 100));
}

#[test]
fn thread_count_does_not_change_results() {
    let params = ScoringParameters::default();
    let wl = mixed_workload(3, 300);
    let sw = BandedPairWiseSW::new(params.clone());
    let want = wl.expected(&params, 60);

    for threads in [1usize, 0, 3] {
        let mut pairs = wl.pairs.clone();
        sw.get_scores(&mut pairs, &wl.ref_buf, &wl.query_buf, threads, 60).unwrap();
        assert_eq!(outputs(&pairs), want, "{threads} threads");
    }
}

#[test]
fn batch_neighbours_do_not_leak_into_results() {
    let params = ScoringParameters::default();
    let wl = mixed_workload(4, 96);
    let sw = BandedPairWiseSW::new(params.clone());

    let mut baseline = wl.pairs.clone();
    sw.get_scores(&mut baseline, &wl.ref_buf, &wl.query_buf, 1, 100).unwrap();

    let mut rng = StdRng::seed_from_u64(40);
    let mut order: Vec<usize> = (0..wl.pairs.len()).collect();
    order.shuffle(&mut rng);
    let mut shuffled: Vec<SeqPair> = order.iter().map(|&i| wl.pairs[i]).collect();
    sw.get_scores(&mut shuffled, &wl.ref_buf, &wl.query_buf, 0, 100).unwrap();

    for (k, &i) in order.iter().enumerate() {
        assert_eq!(shuffled[k].outputs(), baseline[i].outputs(), "pair {i} moved to slot {k}");
    }
}

#[test]
fn caller_ids_are_preserved() {
    let params = ScoringParameters::default();
    let mut wl = mixed_workload(5, 40);
    for (i, p) in wl.pairs.iter_mut().enumerate() {
        p.id = 1000 + 7 * i;
    }
    let sw = BandedPairWiseSW::new(params);
    sw.get_scores(&mut wl.pairs, &wl.ref_buf, &wl.query_buf, 1, 100).unwrap();
    assert!(wl.pairs.iter().enumerate().all(|(i, p)| p.id == 1000 + 7 * i));
}

#[test]
fn scalar_only_engine_agrees_including_cell_counts() {
    let params = ScoringParameters::default();
    let wl = mixed_workload(6, 120);

    let vector = BandedPairWiseSW::new(params.clone());
    let scalar = BandedPairWiseSW::with_config(
        params,
        EngineConfig {
            scalar_only: true,
            ..EngineConfig::default()
        },
    );

    let mut a = wl.pairs.clone();
    let mut b = wl.pairs.clone();
    let sa = vector.get_scores(&mut a, &wl.ref_buf, &wl.query_buf, 1, 100).unwrap();
    let sb = scalar.get_scores(&mut b, &wl.ref_buf, &wl.query_buf, 1, 100).unwrap();
    assert_eq!(outputs(&a), outputs(&b));
    assert_eq!(sa.cells, sb.cells);
    assert!(sa.cells > 0);
    assert_eq!(sb.scalar_pairs, 120);

    let mut c = wl.pairs.clone();
    let sc = vector
        .scalar_banded_swa_wrapper(&mut c, &wl.ref_buf, &wl.query_buf, 2, 100)
        .unwrap();
    assert_eq!(outputs(&c), outputs(&a));
    assert_eq!(sc.cells, sa.cells);
}

#[test]
fn pinned_128_bit_engine_agrees_with_detected() {
    let params = ScoringParameters::default();
    let wl = mixed_workload(7, 100);

    let detected = BandedPairWiseSW::new(params.clone());
    let pinned = BandedPairWiseSW::with_config(
        params,
        EngineConfig {
            engine: Some(SimdEngineType::Engine128),
            ..EngineConfig::default()
        },
    );
    assert_eq!(pinned.engine(), SimdEngineType::Engine128);

    let mut a = wl.pairs.clone();
    let mut b = wl.pairs.clone();
    detected.get_scores(&mut a, &wl.ref_buf, &wl.query_buf, 1, 100).unwrap();
    pinned.get_scores(&mut b, &wl.ref_buf, &wl.query_buf, 1, 100).unwrap();
    assert_eq!(outputs(&a), outputs(&b));
}

#[test]
fn forced_precision_entry_points() {
    let params = ScoringParameters::default();
    let mut rng = StdRng::seed_from_u64(8);
    let mut wl = Workload {
        pairs: Vec::new(),
        ref_buf: Vec::new(),
        query_buf: Vec::new(),
    };
    for _ in 0..20 {
        let seq: Vec<u8> = (0..rng.gen_range(5..50)).map(|_| rng.gen_range(0..4)).collect();
        wl.push(&seq, &seq, 10);
    }
    let want = wl.expected(&params, 100);
    let sw = BandedPairWiseSW::new(params.clone());

    let mut p8 = wl.pairs.clone();
    let s8 = sw.get_scores8(&mut p8, &wl.ref_buf, &wl.query_buf, 1, 100).unwrap();
    assert_eq!(s8.narrow_pairs, 20);
    assert_eq!(outputs(&p8), want);

    let mut p16 = wl.pairs.clone();
    let s16 = sw.get_scores16(&mut p16, &wl.ref_buf, &wl.query_buf, 1, 100).unwrap();
    assert_eq!(s16.wide_pairs, 20);
    assert_eq!(outputs(&p16), want);

    let long: Vec<u8> = (0..200).map(|_| rng.gen_range(0..4)).collect();
    wl.push(&long, &long, 10);
    let mut pairs = wl.pairs.clone();
    match sw.get_scores8(&mut pairs, &wl.ref_buf, &wl.query_buf, 1, 100) {
        Err(BswError::PrecisionOverflow { index, precision, .. }) => {
            assert_eq!(index, 20);
            assert_eq!(precision, Precision::Narrow);
        }
        other => panic!("expected a precision error, got {other:?}"),
    }
    assert!(pairs.iter().all(|p| p.outputs() == OutScore::default()));
}

#[test]
fn empty_input_is_a_no_op() {
    let sw = BandedPairWiseSW::new(ScoringParameters::default());
    let stats = sw.get_scores(&mut [], &[], &[], 0, 100).unwrap();
    assert_eq!(stats.total_pairs(), 0);
    assert_eq!(stats.cells, 0);
}

#[test]
fn large_batch_spans_several_sort_blocks() {
    let params = ScoringParameters::default();
    let mut rng = StdRng::seed_from_u64(9);
    let mut wl = Workload {
        pairs: Vec::new(),
        ref_buf: Vec::new(),
        query_buf: Vec::new(),
    };
    let pool: Vec<u8> = (0..4096).map(|_| rng.gen_range(0..4)).collect();
    wl.ref_buf = pool.clone();
    wl.query_buf = pool;
    for _ in 0..40_000 {
        let len = rng.gen_range(0..24usize);
        let off = rng.gen_range(0..4096 - 24);
        let qoff = if rng.gen_bool(0.5) { off } else { rng.gen_range(0..4096 - 24) };
        wl.pairs.push(SeqPair::new(off, len as i32, qoff, len as i32, rng.gen_range(1..20)));
    }
    let want = wl.expected(&params, 100);

    let sw = BandedPairWiseSW::new(params);
    let stats = sw.get_scores(&mut wl.pairs, &wl.ref_buf, &wl.query_buf, 0, 100).unwrap();
    assert_eq!(stats.narrow_pairs, 40_000);
    assert_eq!(outputs(&wl.pairs), want);
}
