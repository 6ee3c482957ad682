use crate::core::alignment::banded_swa::scoring::{ALPHABET_SIZE, ScoringParameters, base_code, clamp_band};
use crate::core::alignment::banded_swa::tracker::{ExtensionTracker, RowSummary, RowVerdict};
use crate::core::alignment::banded_swa::types::{EhT, OutScore};

/// Counters from one scalar extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScalarTrace {
    /// DP rows evaluated before termination
    pub rows: i32,
    /// In-band cells evaluated
    pub cells: u64,
}

/// Banded extension of one pair; rows walk `target`, columns walk `query`.
///
/// `qlen`/`tlen` are clamped to the slice lengths.
pub fn scalar_banded_swa(
    sw_params: &ScoringParameters,
    qlen: i32,
    query: &[u8],
    tlen: i32,
    target: &[u8],
    w: i32,
    h0: i32,
) -> OutScore {
    scalar_banded_swa_traced(sw_params, qlen, query, tlen, target, w, h0).0
}

pub fn scalar_banded_swa_traced(
    sw_params: &ScoringParameters,
    qlen: i32,
    query: &[u8],
    tlen: i32,
    target: &[u8],
    w: i32,
    h0: i32,
) -> (OutScore, ScalarTrace) {
    let qlen = (qlen.max(0) as usize).min(query.len());
    let tlen = (tlen.max(0) as usize).min(target.len());
    let q = qlen as i32;

    let oe_del = sw_params.oe_del();
    let oe_ins = sw_params.oe_ins();
    let e_del = sw_params.e_del();
    let e_ins = sw_params.e_ins();
    let w = sw_params.effective_band(q, w);

    // Query profile: one row of substitution scores per target symbol
    let mut qp = vec![0i32; qlen * ALPHABET_SIZE];
    for k in 0..ALPHABET_SIZE {
        let row = &mut qp[k * qlen..(k + 1) * qlen];
        for (j, slot) in row.iter_mut().enumerate() {
            *slot = sw_params.score(k as u8, query[j]);
        }
    }

    // eh[j]: H of the previous row at column j-1 and E entering column j.
    // One spare slot past qlen keeps the lookahead column addressable.
    let mut eh = vec![EhT::default(); qlen + 2];
    for (j, cell) in eh.iter_mut().enumerate().take(qlen + 1) {
        cell.h = sw_params.initial_row_score(h0, j as i32);
    }

    let mut tracker = ExtensionTracker::new(h0);
    let mut cells = 0u64;
    let (mut beg, mut end) = (0i32, q);

    for i in 0..tlen {
        let row = i as i32;
        let prev_beg = beg;
        (beg, end) = clamp_band(beg, end, row, w, q);

        let mut h1 = sw_params.first_column_score(h0, row, beg);
        let mut f = 0;
        let mut m = 0;
        let mut mj = -1;
        let prof = &qp[base_code(target[i]) as usize * qlen..];

        if beg < end {
            cells += (end - beg) as u64;
            for j in beg as usize..end as usize {
                let p = &mut eh[j];
                let diag = p.h;
                let e = p.e;
                p.h = h1;

                let mm = if diag != 0 { diag + prof[j] } else { 0 };
                let h = mm.max(e).max(f);
                h1 = h;
                if h >= m {
                    mj = j as i32;
                    m = h;
                }
                p.e = (e - e_del).max((mm - oe_del).max(0));
                f = (f - e_ins).max((mm - oe_ins).max(0));
            }
        }
        let last_col = if beg < end { end } else { beg };
        if end >= 0 {
            let e = end as usize;
            eh[e] = EhT { h: h1, e: 0 };
            eh[e + 1] = EhT::default();
        }

        let summary = RowSummary {
            row,
            last_col,
            h_last: h1,
            row_max: m,
            row_max_col: mj,
        };
        if tracker.finish_row(summary, q, sw_params) == RowVerdict::Stop {
            break;
        }

        #[cfg(debug_assertions)]
        for cell in &eh[beg as usize..=end as usize] {
            debug_assert!(cell.h >= 0 && cell.e >= 0, "negative DP cell in row {row}: {cell:?}");
        }

        // Narrow the band to the nonzero region plus lookahead
        let mut j = beg;
        while j < end && eh[j as usize].is_zero() {
            j += 1;
        }
        beg = j;
        debug_assert!(beg >= prev_beg, "band head moved backwards");
        let mut j = end;
        while j >= beg && eh[j as usize].is_zero() {
            j -= 1;
        }
        end = (j + 2).min(q);
        debug_assert!(0 <= beg && beg <= end && end <= q);
    }

    let trace = ScalarTrace {
        rows: tracker.rows(),
        cells,
    };
    (tracker.out_score(), trace)
}
