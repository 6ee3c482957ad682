//! Per-pair extension bookkeeping applied once per DP row.
//!
//! The scalar aligner and every vector lane feed the same row summary through
//! [`ExtensionTracker::finish_row`], so best-score updates, global-score ties
//! and z-drop termination are decided by one piece of code.

use super::scoring::ScoringParameters;
use super::types::OutScore;

/// What a row contributed, as seen by one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSummary {
    pub row: i32,
    /// Column index the row's sweep finished on (`end` for a non-empty band,
    /// `beg` otherwise)
    pub last_col: i32,
    /// H value left in the carry after the sweep
    pub h_last: i32,
    /// Best H in the row (0 when the band is empty)
    pub row_max: i32,
    /// Latest column attaining `row_max`
    pub row_max_col: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowVerdict {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionTracker {
    max: i32,
    max_i: i32,
    max_j: i32,
    max_ie: i32,
    gscore: i32,
    max_off: i32,
    rows: i32,
}

impl ExtensionTracker {
    pub fn new(h0: i32) -> Self {
        ExtensionTracker {
            max: h0,
            max_i: -1,
            max_j: -1,
            max_ie: -1,
            gscore: -1,
            max_off: 0,
            rows: 0,
        }
    }

    #[inline]
    pub fn finish_row(&mut self, s: RowSummary, qlen: i32, params: &ScoringParameters) -> RowVerdict {
        self.rows = s.row + 1;

        if s.last_col == qlen && self.gscore <= s.h_last {
            self.max_ie = s.row;
            self.gscore = s.h_last;
        }

        if s.row_max == 0 {
            return RowVerdict::Stop;
        }

        if s.row_max > self.max {
            self.max = s.row_max;
            self.max_i = s.row;
            self.max_j = s.row_max_col;
            self.max_off = self.max_off.max((s.row_max_col - s.row).abs());
        } else if params.zdrop() > 0 && self.zdrop_exceeded(s, params) {
            return RowVerdict::Stop;
        }

        RowVerdict::Continue
    }

    #[inline(always)]
    fn zdrop_exceeded(&self, s: RowSummary, params: &ScoringParameters) -> bool {
        let di = s.row - self.max_i;
        let dj = s.row_max_col - self.max_j;
        let gap = if di > dj {
            (di - dj) * params.e_del()
        } else {
            (dj - di) * params.e_ins()
        };
        self.max - s.row_max - gap > params.zdrop()
    }

    /// Rows evaluated so far.
    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn best(&self) -> i32 {
        self.max
    }

    pub fn out_score(&self) -> OutScore {
        OutScore {
            score: self.max,
            target_end_pos: self.max_i + 1,
            gtarget_end_pos: self.max_ie + 1,
            query_end_pos: self.max_j + 1,
            global_score: self.gscore,
            max_offset: self.max_off,
        }
    }
}
