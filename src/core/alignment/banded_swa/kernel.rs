//! Generic lane-parallel banded Smith-Waterman kernel.
//!
//! One DP row is swept across all lanes per step. Each lane keeps its own band
//! `[head, tail)`; cells outside a lane's band are written back as zero, so
//! the next row never reads stale data. Row bookkeeping (best score, global
//! score, z-drop) runs per lane through [`ExtensionTracker`], the same code the
//! scalar aligner uses.
//!
//! The kernel is instantiated per engine (`SwSimd` impl) and lane count `W`;
//! the entry points in `isa_sse_neon.rs` and `isa_avx2.rs` wrap it in
//! `#[target_feature]` functions.

use super::precision::ScoreElem;
use super::scoring::{ScoringParameters, clamp_band};
use super::shared::LaneBatch;
use super::tracker::{ExtensionTracker, RowSummary, RowVerdict};
use super::types::LaneOutcome;
use crate::core::alignment::shared_types::DpRows;

/// Vector operations the kernel is written against.
///
/// Comparisons return all-ones / all-zeros lanes; `blendv` picks `b` where the
/// mask is set. `add`/`sub` wrap.
pub trait SwSimd: Copy {
    type Elem: ScoreElem;
    type V: Copy;
    const LANES: usize;

    unsafe fn setzero() -> Self::V;
    unsafe fn set1(x: Self::Elem) -> Self::V;
    unsafe fn loadu(ptr: *const Self::Elem) -> Self::V;
    unsafe fn storeu(ptr: *mut Self::Elem, v: Self::V);
    unsafe fn add(a: Self::V, b: Self::V) -> Self::V;
    unsafe fn sub(a: Self::V, b: Self::V) -> Self::V;
    unsafe fn max(a: Self::V, b: Self::V) -> Self::V;
    unsafe fn min(a: Self::V, b: Self::V) -> Self::V;
    unsafe fn cmpeq(a: Self::V, b: Self::V) -> Self::V;
    unsafe fn cmpgt(a: Self::V, b: Self::V) -> Self::V;
    unsafe fn blendv(a: Self::V, b: Self::V, mask: Self::V) -> Self::V;
    unsafe fn and(a: Self::V, b: Self::V) -> Self::V;
    unsafe fn or(a: Self::V, b: Self::V) -> Self::V;
    /// `!a & b`
    unsafe fn andnot(a: Self::V, b: Self::V) -> Self::V;
    /// Any lane of a mask set
    unsafe fn any(mask: Self::V) -> bool;
    /// Every lane of a mask set
    unsafe fn all(mask: Self::V) -> bool;

    #[inline(always)]
    unsafe fn not(a: Self::V) -> Self::V {
        unsafe { Self::andnot(a, Self::set1(Self::Elem::from_i32(-1))) }
    }
}

/// Lane predicates built from a lane's `[head, tail)` window.
struct Window<E: SwSimd> {
    head: E::V,
    tail: E::V,
}

impl<E: SwSimd> Window<E> {
    /// `head <= j < tail`
    #[inline(always)]
    unsafe fn inside(&self, j: E::V) -> E::V {
        unsafe { E::andnot(E::cmpgt(self.head, j), E::cmpgt(self.tail, j)) }
    }

    /// `head <= j <= tail`
    #[inline(always)]
    unsafe fn inside_closed(&self, j: E::V) -> E::V {
        unsafe { E::andnot(E::or(E::cmpgt(self.head, j), E::cmpgt(j, self.tail)), E::set1(E::Elem::from_i32(-1))) }
    }
}

#[inline(always)]
unsafe fn load_lanes<const W: usize, E: SwSimd>(vals: &[E::Elem; W]) -> E::V {
    unsafe { E::loadu(vals.as_ptr()) }
}

#[inline(always)]
unsafe fn store_lanes<const W: usize, E: SwSimd>(v: E::V) -> [E::Elem; W] {
    let mut out = [E::Elem::default(); W];
    unsafe { E::storeu(out.as_mut_ptr(), v) };
    out
}

/// Scores one lane group.
///
/// # Safety
/// The engine's instruction set must be available on the running CPU and
/// `W == E::LANES`.
#[inline(always)]
pub unsafe fn sw_kernel<const W: usize, E: SwSimd>(
    batch: &LaneBatch<E::Elem>,
    params: &ScoringParameters,
    dp: &mut DpRows<E::Elem>,
) -> Vec<LaneOutcome> {
    debug_assert_eq!(W, E::LANES, "lane count must match the engine");
    assert_eq!(batch.lanes(), W, "lane batch width does not match the engine");

    let t = |v: i32| E::Elem::from_i32(v);
    let qmax = batch.max_qlen();
    let tmax = batch.max_tlen();
    let cols = qmax + 2;
    dp.reshape(cols, W);

    let h_ptr = dp.h.as_mut_ptr();
    let e_ptr = dp.e.as_mut_ptr();

    let mut qlen = [0i32; W];
    let mut tlen = [0i32; W];
    let mut h0 = [0i32; W];
    let mut band = [0i32; W];
    qlen.copy_from_slice(&batch.qlen[..W]);
    tlen.copy_from_slice(&batch.tlen[..W]);
    h0.copy_from_slice(&batch.h0[..W]);
    band.copy_from_slice(&batch.band[..W]);

    let mut trackers = [ExtensionTracker::new(0); W];
    for l in 0..W {
        trackers[l] = ExtensionTracker::new(h0[l]);
    }
    let mut cells = [0u64; W];

    unsafe {
        let zero = E::setzero();
        let match_v = E::set1(t(params.match_score()));
        let mismatch_v = E::set1(t(params.mismatch_score()));
        let ambig_v = E::set1(t(params.ambig_score()));
        let three_v = E::set1(t(3));
        let oe_del_v = E::set1(t(params.oe_del()));
        let e_del_v = E::set1(t(params.e_del()));
        let oe_ins_v = E::set1(t(params.oe_ins()));
        let e_ins_v = E::set1(t(params.e_ins()));
        let one_v = E::set1(t(1));
        let two_v = E::set1(t(2));
        let neg1_v = E::set1(t(-1));
        let qlen_v = load_lanes::<W, E>(&qlen.map(t));

        // Virtual row above the matrix
        let mut h = load_lanes::<W, E>(&h0.map(t));
        E::storeu(h_ptr, h);
        E::storeu(e_ptr, zero);
        for j in 1..cols {
            let decay = if j == 1 { oe_ins_v } else { e_ins_v };
            h = E::max(E::sub(h, decay), zero);
            E::storeu(h_ptr.add(j * W), h);
            E::storeu(e_ptr.add(j * W), zero);
        }

        let mut beg = [0i32; W];
        let mut end = qlen;
        let mut active = [true; W];

        for i in 0..tmax {
            let row = i as i32;

            // Band update
            let mut head_a = [E::Elem::default(); W];
            let mut tail_a = [E::Elem::default(); W];
            let mut h1_a = [E::Elem::default(); W];
            let mut live_a = [E::Elem::default(); W];
            let mut any_active = false;
            let mut lo = usize::MAX;
            let mut hi = 0usize;
            for l in 0..W {
                if !active[l] {
                    continue;
                }
                if row >= tlen[l] {
                    active[l] = false;
                    continue;
                }
                any_active = true;
                let (b, e) = clamp_band(beg[l], end[l], row, band[l], qlen[l]);
                beg[l] = b;
                end[l] = e;
                h1_a[l] = t(params.first_column_score(h0[l], row, b));
                if b < e {
                    cells[l] += (e - b) as u64;
                    live_a[l] = t(-1);
                    head_a[l] = t(b);
                    tail_a[l] = t(e);
                    lo = lo.min(b as usize);
                    hi = hi.max((e + 1).min(qlen[l]) as usize);
                }
            }
            if !any_active {
                break;
            }

            let win = Window::<E> {
                head: load_lanes::<W, E>(&head_a),
                tail: load_lanes::<W, E>(&tail_a),
            };
            let live = load_lanes::<W, E>(&live_a);
            let h1_v = load_lanes::<W, E>(&h1_a);

            let mut row_max = zero;
            let mut row_max_j = neg1_v;
            let mut h_end = zero;

            // Row sweep
            if lo <= hi {
                let s_ref = E::loadu(batch.ref_soa.row_ptr(i));
                let mut h_left = h1_v;
                let mut f = zero;
                for j in lo..=hi {
                    let j_v = E::set1(t(j as i32));
                    let h_cell = h_ptr.add(j * W);
                    let e_cell = e_ptr.add(j * W);
                    let h_diag = E::loadu(h_cell);
                    let e_cur = E::loadu(e_cell);
                    let s_qry = E::loadu(batch.query_soa.row_ptr(j));

                    let at_head = E::cmpeq(j_v, win.head);
                    h_left = E::blendv(h_left, h1_v, at_head);
                    f = E::blendv(f, zero, at_head);

                    let sc = E::blendv(mismatch_v, match_v, E::cmpeq(s_ref, s_qry));
                    let sc = E::blendv(sc, ambig_v, E::cmpgt(E::max(s_ref, s_qry), three_v));
                    let m = E::andnot(E::cmpeq(h_diag, zero), E::add(h_diag, sc));
                    let h_new = E::max(E::max(m, e_cur), f);
                    let e_next = E::max(E::sub(e_cur, e_del_v), E::max(E::sub(m, oe_del_v), zero));
                    let f_next = E::max(E::sub(f, e_ins_v), E::max(E::sub(m, oe_ins_v), zero));

                    let in_band = E::and(win.inside(j_v), live);
                    let in_store = E::and(win.inside_closed(j_v), live);
                    E::storeu(h_cell, E::and(h_left, in_store));
                    E::storeu(e_cell, E::and(e_next, in_band));

                    let take = E::andnot(E::cmpgt(row_max, h_new), in_band);
                    row_max = E::blendv(row_max, h_new, take);
                    row_max_j = E::blendv(row_max_j, j_v, take);
                    h_end = E::blendv(h_end, h_left, E::and(E::cmpeq(j_v, win.tail), live));

                    h_left = h_new;
                    f = f_next;
                }
            }

            // Row bookkeeping and termination
            let row_max_a = store_lanes::<W, E>(row_max);
            let row_max_j_a = store_lanes::<W, E>(row_max_j);
            let h_end_a = store_lanes::<W, E>(h_end);
            let mut narrow_a = [E::Elem::default(); W];
            let mut any_narrow = false;
            for l in 0..W {
                if !active[l] {
                    continue;
                }
                let (last_col, h_last) = if beg[l] < end[l] {
                    (end[l], h_end_a[l].to_i32())
                } else {
                    (beg[l], h1_a[l].to_i32())
                };
                let summary = RowSummary {
                    row,
                    last_col,
                    h_last,
                    row_max: row_max_a[l].to_i32(),
                    row_max_col: row_max_j_a[l].to_i32(),
                };
                if trackers[l].finish_row(summary, qlen[l], params) == RowVerdict::Stop {
                    active[l] = false;
                } else {
                    narrow_a[l] = t(-1);
                    any_narrow = true;
                }
            }

            #[cfg(debug_assertions)]
            check_row::<W, E>(dp, &beg, &end, &live_a, qlen);

            if !any_narrow {
                continue;
            }

            // Band narrowing: first nonzero column from the head, last nonzero
            // column from the tail, plus lookahead
            let narrow = load_lanes::<W, E>(&narrow_a);
            let mut new_head = win.tail;
            let mut done = E::not(narrow);
            let mut j = lo;
            while j < hi {
                let j_v = E::set1(t(j as i32));
                let nz = E::not(E::cmpeq(E::or(E::loadu(h_ptr.add(j * W)), E::loadu(e_ptr.add(j * W))), zero));
                let hit = E::andnot(done, E::and(nz, win.inside(j_v)));
                new_head = E::blendv(new_head, j_v, hit);
                done = E::or(done, hit);
                done = E::or(done, E::not(E::cmpgt(win.tail, E::add(j_v, one_v))));
                if E::all(done) {
                    break;
                }
                j += 1;
            }

            let settled = Window::<E> {
                head: new_head,
                tail: win.tail,
            };
            let mut new_last = E::sub(new_head, one_v);
            let mut done = E::not(narrow);
            let mut j = hi;
            loop {
                let j_v = E::set1(t(j as i32));
                let nz = E::not(E::cmpeq(E::or(E::loadu(h_ptr.add(j * W)), E::loadu(e_ptr.add(j * W))), zero));
                let hit = E::andnot(done, E::and(nz, settled.inside_closed(j_v)));
                new_last = E::blendv(new_last, j_v, hit);
                done = E::or(done, hit);
                done = E::or(done, E::not(E::cmpgt(j_v, new_head)));
                if j == 0 || E::all(done) {
                    break;
                }
                j -= 1;
            }
            let new_tail = E::min(E::add(new_last, two_v), qlen_v);

            let new_head_a = store_lanes::<W, E>(new_head);
            let new_tail_a = store_lanes::<W, E>(new_tail);
            for l in 0..W {
                if narrow_a[l] != E::Elem::default() {
                    debug_assert!(new_head_a[l].to_i32() >= beg[l], "band head moved backwards");
                    beg[l] = new_head_a[l].to_i32();
                    end[l] = new_tail_a[l].to_i32();
                    debug_assert!(0 <= beg[l] && beg[l] <= end[l] && end[l] <= qlen[l]);
                }
            }

            #[cfg(feature = "debug-logging")]
            log::trace!("row {row}: beg={beg:?} end={end:?} active={active:?}");
        }
    }

    trackers
        .iter()
        .zip(cells)
        .map(|(tr, cells)| LaneOutcome {
            score: tr.out_score(),
            rows: tr.rows(),
            cells,
        })
        .collect()
}

/// Every stored cell of a live lane is non-negative and the band sits inside
/// the query.
#[cfg(debug_assertions)]
fn check_row<const W: usize, E: SwSimd>(
    dp: &DpRows<E::Elem>,
    beg: &[i32; W],
    end: &[i32; W],
    live: &[E::Elem; W],
    qlen: [i32; W],
) {
    for l in 0..W {
        if live[l] == E::Elem::default() {
            continue;
        }
        debug_assert!(0 <= beg[l] && beg[l] < end[l] && end[l] <= qlen[l]);
        for j in beg[l] as usize..=end[l] as usize {
            let h = dp.h.get(j, l).to_i32();
            let e = dp.e.get(j, l).to_i32();
            debug_assert!(h >= 0 && e >= 0, "negative cell at lane {l} column {j}: H={h} E={e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::banded_swa::engines::PortableEngine;
    use crate::core::alignment::banded_swa::scalar::scalar_banded_swa_traced;
    use crate::core::alignment::banded_swa::types::SeqPair;

    #[test]
    fn lane_cell_counts_match_scalar() {
        let params = ScoringParameters::default();
        let refs: Vec<u8> = (0..60u32).map(|i| (i * 5 % 4) as u8).collect();
        let mut qrys = refs.clone();
        qrys[17] = (qrys[17] + 1) % 4;
        qrys.remove(40);
        let pairs = [
            SeqPair::new(0, 60, 0, 59, 12),
            SeqPair::new(10, 20, 10, 25, 4),
            SeqPair::new(0, 0, 0, 8, 3),
        ];

        let mut batch = LaneBatch::<i8>::default();
        batch.load(&pairs, 4, &refs, &qrys, &params, 7).unwrap();
        let mut dp = DpRows::new();
        let got = unsafe { sw_kernel::<4, PortableEngine<i8, 4>>(&batch, &params, &mut dp) };

        for (lane, p) in pairs.iter().enumerate() {
            let t = &refs[p.ref_offset..p.ref_offset + p.ref_len as usize];
            let q = &qrys[p.query_offset..p.query_offset + p.query_len as usize];
            let (out, trace) = scalar_banded_swa_traced(&params, p.query_len, q, p.ref_len, t, 7, p.h0);
            assert_eq!(got[lane].score, out, "lane {lane}");
            assert_eq!(got[lane].cells, trace.cells, "lane {lane} cells");
        }
        assert!(got[0].cells > 0);
        assert_eq!(got[2].cells, 0);
        assert_eq!(got[3].cells, 0, "padding lane");
    }
}
