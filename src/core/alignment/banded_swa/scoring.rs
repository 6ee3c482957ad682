use crate::defaults;
use crate::error::{BswError, Result};

/// Number of symbols in the scoring alphabet (A, C, G, T, ambiguous)
pub const ALPHABET_SIZE: usize = 5;
/// Code every base ≥ 4 collapses to
pub const AMBIG_CODE: u8 = 4;

// Helper function to create scoring matrix (similar to bwa_fill_scmat in main_banded.cpp)
pub fn bwa_fill_scmat(match_score: i8, mismatch_penalty: i8, ambig_penalty: i8) -> [i8; 25] {
    let mut mat = [0i8; 25];
    let mut k = 0;

    // Fill 5x5 matrix for A, C, G, T, N
    for i in 0..4 {
        for j in 0..4 {
            mat[k] = if i == j {
                match_score
            } else {
                -mismatch_penalty
            };
            k += 1;
        }
        mat[k] = ambig_penalty; // ambiguous base (N)
        k += 1;
    }

    // Last row for N
    for _ in 0..5 {
        mat[k] = ambig_penalty;
        k += 1;
    }

    mat
}

/// Collapses a raw sequence byte to a scoring-alphabet index.
#[inline(always)]
pub fn base_code(b: u8) -> u8 {
    b.min(AMBIG_CODE)
}

/// Immutable affine-gap scoring scheme shared by every engine path.
///
/// Deletions consume reference rows (vertical moves), insertions consume query
/// columns (horizontal moves).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringParameters {
    match_score: i32,
    mismatch_score: i32,
    ambig_score: i32,
    o_del: i32,
    e_del: i32,
    o_ins: i32,
    e_ins: i32,
    end_bonus: i32,
    zdrop: i32,
    mat: [i8; 25],
}

impl Default for ScoringParameters {
    fn default() -> Self {
        let mat = bwa_fill_scmat(
            defaults::MATCH_SCORE as i8,
            defaults::MISMATCH_PENALTY as i8,
            -(defaults::AMBIGUOUS_PENALTY as i8),
        );
        ScoringParameters {
            match_score: defaults::MATCH_SCORE,
            mismatch_score: -defaults::MISMATCH_PENALTY,
            ambig_score: -defaults::AMBIGUOUS_PENALTY,
            o_del: defaults::GAP_OPEN_DEL,
            e_del: defaults::GAP_EXTEND_DEL,
            o_ins: defaults::GAP_OPEN_INS,
            e_ins: defaults::GAP_EXTEND_INS,
            end_bonus: defaults::END_BONUS,
            zdrop: defaults::OFF_DIAGONAL_DROPOFF,
            mat,
        }
    }
}

fn check(name: &'static str, ok: bool, reason: impl FnOnce() -> String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(BswError::InvalidParameter {
            name,
            reason: reason(),
        })
    }
}

impl ScoringParameters {
    /// Builds a validated scheme. Penalties are given as positive costs;
    /// `ambig_penalty` is the cost applied when either base is ambiguous.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        match_score: i32,
        mismatch_penalty: i32,
        o_del: i32,
        e_del: i32,
        o_ins: i32,
        e_ins: i32,
        ambig_penalty: i32,
        end_bonus: i32,
        zdrop: i32,
    ) -> Result<Self> {
        let byte = |v: i32| (0..=i8::MAX as i32).contains(&v);
        check("match_score", byte(match_score), || {
            format!("{match_score} is outside 0..=127")
        })?;
        check("mismatch_penalty", byte(mismatch_penalty), || {
            format!("{mismatch_penalty} is outside 0..=127")
        })?;
        check("ambig_penalty", byte(ambig_penalty), || {
            format!("{ambig_penalty} is outside 0..=127")
        })?;
        check("o_del", o_del >= 0, || format!("{o_del} is negative"))?;
        check("o_ins", o_ins >= 0, || format!("{o_ins} is negative"))?;
        check("e_del", e_del > 0, || format!("{e_del} must be at least 1"))?;
        check("e_ins", e_ins > 0, || format!("{e_ins} must be at least 1"))?;
        check("end_bonus", end_bonus >= 0, || format!("{end_bonus} is negative"))?;

        Ok(ScoringParameters {
            match_score,
            mismatch_score: -mismatch_penalty,
            ambig_score: -ambig_penalty,
            o_del,
            e_del,
            o_ins,
            e_ins,
            end_bonus,
            zdrop,
            mat: bwa_fill_scmat(match_score as i8, mismatch_penalty as i8, -(ambig_penalty as i8)),
        })
    }

    pub fn match_score(&self) -> i32 {
        self.match_score
    }

    /// Score of a mismatch (≤ 0)
    pub fn mismatch_score(&self) -> i32 {
        self.mismatch_score
    }

    /// Score when either base is ambiguous (≤ 0)
    pub fn ambig_score(&self) -> i32 {
        self.ambig_score
    }

    pub fn o_del(&self) -> i32 {
        self.o_del
    }

    pub fn e_del(&self) -> i32 {
        self.e_del
    }

    pub fn o_ins(&self) -> i32 {
        self.o_ins
    }

    pub fn e_ins(&self) -> i32 {
        self.e_ins
    }

    pub fn oe_del(&self) -> i32 {
        self.o_del + self.e_del
    }

    pub fn oe_ins(&self) -> i32 {
        self.o_ins + self.e_ins
    }

    pub fn end_bonus(&self) -> i32 {
        self.end_bonus
    }

    /// Z-drop threshold; values ≤ 0 disable the test
    pub fn zdrop(&self) -> i32 {
        self.zdrop
    }

    pub fn scoring_matrix(&self) -> &[i8; 25] {
        &self.mat
    }

    /// Largest entry of the scoring matrix.
    pub fn max_reward(&self) -> i32 {
        self.mat.iter().copied().max().unwrap_or(0) as i32
    }

    /// Smallest entry of the scoring matrix.
    pub fn min_reward(&self) -> i32 {
        self.mat.iter().copied().min().unwrap_or(0) as i32
    }

    /// Substitution score for two raw codes.
    #[inline(always)]
    pub fn score(&self, target: u8, query: u8) -> i32 {
        self.mat[base_code(target) as usize * ALPHABET_SIZE + base_code(query) as usize] as i32
    }

    /// Band half-width after the `max_ins`/`max_del` reach bounds.
    ///
    /// A negative request is treated as 0.
    pub fn effective_band(&self, qlen: i32, w: i32) -> i32 {
        let max = self.max_reward() as f64;
        let reach = |o: i32, e: i32| -> i32 {
            let r = ((qlen as f64 * max + self.end_bonus as f64 - o as f64) / e as f64 + 1.0) as i32;
            r.max(1)
        };
        let max_ins = reach(self.o_ins, self.e_ins);
        let max_del = reach(self.o_del, self.e_del);
        w.min(max_ins).min(max_del).max(0)
    }

    /// Value carried into the first in-band column of row `i`: the seed
    /// decayed by one deletion run when the band still touches column 0.
    #[inline(always)]
    pub fn first_column_score(&self, h0: i32, i: i32, beg: i32) -> i32 {
        if beg == 0 {
            (h0 - (self.o_del + self.e_del * (i + 1))).max(0)
        } else {
            0
        }
    }

    /// Score of the virtual row above the matrix at column `j`.
    #[inline(always)]
    pub fn initial_row_score(&self, h0: i32, j: i32) -> i32 {
        match j {
            0 => h0,
            _ => (h0 - self.oe_ins() - self.e_ins * (j - 1)).max(0),
        }
    }
}

/// Clamps a row's band to the diagonal window and the query.
#[inline(always)]
pub fn clamp_band(beg: i32, end: i32, i: i32, w: i32, qlen: i32) -> (i32, i32) {
    (beg.max(i - w), end.min(i + w + 1).min(qlen))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matrix_matches_bwa() {
        let p = ScoringParameters::default();
        assert_eq!(p.score(0, 0), 1);
        assert_eq!(p.score(0, 3), -4);
        assert_eq!(p.score(4, 4), -1);
        assert_eq!(p.score(2, 9), -1, "codes above 4 are ambiguous");
        assert_eq!(p.max_reward(), 1);
        assert_eq!(p.min_reward(), -4);
    }

    #[test]
    fn rejects_zero_gap_extension() {
        let err = ScoringParameters::new(1, 4, 6, 0, 6, 1, 1, 5, 100).unwrap_err();
        assert!(matches!(err, BswError::InvalidParameter { name: "e_del", .. }));
    }

    #[test]
    fn effective_band_is_bounded_by_reach() {
        let p = ScoringParameters::default();
        // (20*1 + 5 - 6)/1 + 1 = 20
        assert_eq!(p.effective_band(20, 100), 20);
        assert_eq!(p.effective_band(20, 7), 7);
        assert_eq!(p.effective_band(0, 100), 1);
        assert_eq!(p.effective_band(50, -3), 0);
    }

    #[test]
    fn initial_row_decays_by_insertion_costs() {
        let p = ScoringParameters::default();
        let row: Vec<i32> = (0..6).map(|j| p.initial_row_score(10, j)).collect();
        assert_eq!(row, vec![10, 3, 2, 1, 0, 0]);
        assert_eq!(p.first_column_score(10, 0, 0), 3);
        assert_eq!(p.first_column_score(10, 2, 0), 1);
        assert_eq!(p.first_column_score(10, 2, 1), 0);
    }
}
