// tests/kernel_parity.rs
// Lane kernels against the scalar aligner: every output field, the row the
// extension stopped on and the number of cells evaluated must agree.
use ferrous_bsw::core::alignment::banded_swa::engines::PortableEngine;
use ferrous_bsw::core::alignment::banded_swa::kernel::{SwSimd, sw_kernel};
use ferrous_bsw::core::alignment::banded_swa::precision::{ScoreElem, fits};
use ferrous_bsw::core::alignment::banded_swa::scalar::scalar_banded_swa_traced;
use ferrous_bsw::core::alignment::banded_swa::shared::LaneBatch;
use ferrous_bsw::core::alignment::banded_swa::types::{LaneOutcome, SeqPair};
use ferrous_bsw::core::alignment::shared_types::DpRows;
use ferrous_bsw::ScoringParameters;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(target_arch = "x86_64")]
use std::is_x86_feature_detected;

/// Buffers plus pair records for one lane group.
struct Fixture {
    pairs: Vec<SeqPair>,
    ref_buf: Vec<u8>,
    query_buf: Vec<u8>,
}

/// Mutates `src`: substitutions, short indels and the odd ambiguous base.
fn mutate(rng: &mut StdRng, src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len() + 8);
    for &b in src {
        match rng.gen_range(0..100) {
            0..=5 => out.push((b + rng.gen_range(1..4)) % 4),
            6..=7 => {}
            8..=9 => {
                out.push(b);
                out.push(rng.gen_range(0..4));
            }
            10 => out.push(rng.gen_range(4..8)),
            _ => out.push(b),
        }
    }
    out
}

/// `lanes` random pairs that all fit `T` under `params`.
fn fixture<T: ScoreElem>(rng: &mut StdRng, params: &ScoringParameters, lanes: usize, max_len: usize) -> Fixture {
    let mut fx = Fixture {
        pairs: Vec::with_capacity(lanes),
        ref_buf: Vec::new(),
        query_buf: Vec::new(),
    };
    while fx.pairs.len() < lanes {
        let tlen = rng.gen_range(0..=max_len);
        let target: Vec<u8> = (0..tlen).map(|_| rng.gen_range(0..4)).collect();
        let mut query = if rng.gen_bool(0.8) {
            mutate(rng, &target)
        } else {
            (0..rng.gen_range(0..=max_len)).map(|_| rng.gen_range(0..4)).collect()
        };
        query.truncate(max_len);
        let h0 = rng.gen_range(0..=40);
        if !fits::<T>(params, query.len() as i32, target.len() as i32, h0) {
            continue;
        }
        fx.pairs.push(SeqPair::new(
            fx.ref_buf.len(),
            target.len() as i32,
            fx.query_buf.len(),
            query.len() as i32,
            h0,
        ));
        fx.ref_buf.extend_from_slice(&target);
        fx.query_buf.extend_from_slice(&query);
    }
    fx
}

fn run_kernel<const W: usize, E: SwSimd>(
    fx: &Fixture,
    params: &ScoringParameters,
    w: i32,
    entry: unsafe fn(&LaneBatch<E::Elem>, &ScoringParameters, &mut DpRows<E::Elem>) -> Vec<LaneOutcome>,
) -> Vec<LaneOutcome> {
    let mut batch = LaneBatch::<E::Elem>::default();
    batch
        .load(&fx.pairs, W, &fx.ref_buf, &fx.query_buf, params, w)
        .unwrap();
    let mut dp = DpRows::new();
    unsafe { entry(&batch, params, &mut dp) }
}

fn assert_matches_scalar(fx: &Fixture, params: &ScoringParameters, w: i32, got: &[LaneOutcome], label: &str) {
    for (lane, p) in fx.pairs.iter().enumerate() {
        let target = &fx.ref_buf[p.ref_offset..p.ref_offset + p.ref_len as usize];
        let query = &fx.query_buf[p.query_offset..p.query_offset + p.query_len as usize];
        let (want, trace) = scalar_banded_swa_traced(params, p.query_len, query, p.ref_len, target, w, p.h0);
        assert_eq!(
            got[lane].score, want,
            "{label} lane {lane}: qlen {} tlen {} h0 {} w {w}",
            p.query_len, p.ref_len, p.h0
        );
        assert_eq!(got[lane].rows, trace.rows, "{label} lane {lane}: stop row");
        assert_eq!(got[lane].cells, trace.cells, "{label} lane {lane}: cells");
    }
    for (lane, out) in got.iter().enumerate().skip(fx.pairs.len()) {
        assert_eq!(out.rows, 0, "{label} padding lane {lane} must not run");
    }
}

fn scoring_schemes() -> Vec<ScoringParameters> {
    vec![
        ScoringParameters::default(),
        ScoringParameters::new(2, 3, 5, 2, 4, 1, 1, 0, 20).unwrap(),
        ScoringParameters::new(1, 2, 3, 1, 3, 1, 2, 5, 3).unwrap(),
        ScoringParameters::new(1, 4, 6, 1, 6, 1, 1, 5, 0).unwrap(),
    ]
}

const BANDS: [i32; 5] = [0, 2, 7, 30, 100];

fn check_engine<const W: usize, E: SwSimd>(
    seed: u64,
    max_len: usize,
    label: &str,
    entry: unsafe fn(&LaneBatch<E::Elem>, &ScoringParameters, &mut DpRows<E::Elem>) -> Vec<LaneOutcome>,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    for params in scoring_schemes() {
        for &w in &BANDS {
            for round in 0..6 {
                // some groups leave lanes empty
                let lanes = if round % 3 == 2 { rng.gen_range(1..W) } else { W };
                let fx = fixture::<E::Elem>(&mut rng, &params, lanes, max_len);
                let got = run_kernel::<W, E>(&fx, &params, w, entry);
                assert_matches_scalar(&fx, &params, w, &got, label);
            }
        }
    }
}

unsafe fn portable16(b: &LaneBatch<i8>, p: &ScoringParameters, dp: &mut DpRows<i8>) -> Vec<LaneOutcome> {
    unsafe { sw_kernel::<16, PortableEngine<i8, 16>>(b, p, dp) }
}

unsafe fn portable8_i16(b: &LaneBatch<i16>, p: &ScoringParameters, dp: &mut DpRows<i16>) -> Vec<LaneOutcome> {
    unsafe { sw_kernel::<8, PortableEngine<i16, 8>>(b, p, dp) }
}

#[test]
fn portable_i8_matches_scalar() {
    check_engine::<16, PortableEngine<i8, 16>>(11, 90, "portable i8x16", portable16);
}

#[test]
fn portable_i16_matches_scalar() {
    check_engine::<8, PortableEngine<i16, 8>>(12, 300, "portable i16x8", portable8_i16);
}

#[cfg(target_arch = "x86_64")]
#[test]
fn sse2_kernels_match_scalar() {
    use ferrous_bsw::core::alignment::banded_swa::engines::{SwEngine128, SwEngine128I16};
    use ferrous_bsw::core::alignment::banded_swa::isa_sse_neon::{
        simd_banded_swa_batch8_int16, simd_banded_swa_batch16,
    };

    check_engine::<16, SwEngine128>(21, 90, "sse2 i8x16", simd_banded_swa_batch16);
    check_engine::<8, SwEngine128I16>(22, 300, "sse2 i16x8", simd_banded_swa_batch8_int16);
}

#[cfg(target_arch = "x86_64")]
#[test]
fn avx2_kernels_match_scalar() {
    use ferrous_bsw::core::alignment::banded_swa::engines::{SwEngine256, SwEngine256I16};
    use ferrous_bsw::core::alignment::banded_swa::isa_avx2::{
        simd_banded_swa_batch16_int16, simd_banded_swa_batch32,
    };

    if !is_x86_feature_detected!("avx2") {
        eprintln!("Skipping AVX2 parity test: CPU lacks avx2");
        return;
    }
    check_engine::<32, SwEngine256>(31, 90, "avx2 i8x32", simd_banded_swa_batch32);
    check_engine::<16, SwEngine256I16>(32, 300, "avx2 i16x16", simd_banded_swa_batch16_int16);
}

#[test]
fn narrow_lanes_at_the_range_limit() {
    // h0 + qlen * match lands exactly on i8::MAX
    let params = ScoringParameters::default();
    let len = 100usize;
    let mut rng = StdRng::seed_from_u64(41);
    let target: Vec<u8> = (0..len).map(|_| rng.gen_range(0..4)).collect();
    let h0 = i8::MAX as i32 - len as i32;
    assert!(fits::<i8>(&params, len as i32, len as i32, h0));
    assert!(!fits::<i8>(&params, len as i32, len as i32, h0 + 1));

    let fx = Fixture {
        pairs: vec![SeqPair::new(0, len as i32, 0, len as i32, h0); 3],
        ref_buf: target.clone(),
        query_buf: target,
    };
    let got = run_kernel::<16, PortableEngine<i8, 16>>(&fx, &params, 100, portable16);
    assert_matches_scalar(&fx, &params, 100, &got, "portable i8 limit");
    assert_eq!(got[0].score.score, i8::MAX as i32);
}

#[test]
fn lanes_stop_on_different_rows() {
    // one lane z-drops early, the others run to the end of their reference
    let params = ScoringParameters::new(1, 4, 6, 1, 6, 1, 1, 5, 5).unwrap();
    let mut rng = StdRng::seed_from_u64(51);
    let head: Vec<u8> = (0..20).map(|_| rng.gen_range(2..4)).collect();

    let mut fx = Fixture {
        pairs: Vec::new(),
        ref_buf: Vec::new(),
        query_buf: Vec::new(),
    };
    let push = |fx: &mut Fixture, target: Vec<u8>, query: Vec<u8>| {
        fx.pairs.push(SeqPair::new(
            fx.ref_buf.len(),
            target.len() as i32,
            fx.query_buf.len(),
            query.len() as i32,
            10,
        ));
        fx.ref_buf.extend(target);
        fx.query_buf.extend(query);
    };
    let mut q = head.clone();
    q.extend([0u8; 30]);
    let mut t = head.clone();
    t.extend([1u8; 30]);
    push(&mut fx, t, q);
    for k in 0..5 {
        let seq: Vec<u8> = (0..40 + k).map(|_| rng.gen_range(0..4)).collect();
        push(&mut fx, seq.clone(), seq);
    }

    let got = run_kernel::<16, PortableEngine<i8, 16>>(&fx, &params, 100, portable16);
    assert_matches_scalar(&fx, &params, 100, &got, "mixed stop rows");
    assert_eq!(got[0].rows, 22);
    assert!(got[1..6].iter().all(|o| o.rows >= 40));
}
