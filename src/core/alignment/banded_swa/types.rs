use std::time::Duration;

// Rust equivalent of eh_t
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EhT {
    pub h: i32, // H score (match/mismatch)
    pub e: i32, // E score (gap in query, i.e. deletion)
}

impl EhT {
    #[inline(always)]
    pub fn is_zero(&self) -> bool {
        self.h == 0 && self.e == 0
    }
}

// Rust equivalent of dnaOutScore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutScore {
    pub score: i32,
    pub target_end_pos: i32,
    pub gtarget_end_pos: i32,
    pub query_end_pos: i32,
    pub global_score: i32,
    pub max_offset: i32,
}

/// Kernel output for one lane: the scores plus the number of DP rows the
/// lane evaluated before it stopped (0 for an empty reference).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneOutcome {
    pub score: OutScore,
    pub rows: i32,
    /// In-band cells evaluated
    pub cells: u64,
}

/// One extension job. Offsets index into the caller's reference and query
/// buffers; the engine fills the output block and never keeps the record.
///
/// Sequence bytes are nucleotide codes 0=A, 1=C, 2=G, 3=T; any code ≥ 4 is
/// treated as ambiguous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeqPair {
    /// Offset of the reference (target) sequence in the reference buffer
    pub ref_offset: usize,
    /// Offset of the query sequence in the query buffer
    pub query_offset: usize,
    /// Caller identifier; untouched by the engine
    pub id: usize,
    pub ref_len: i32,
    pub query_len: i32,
    /// Seed score carried into the DP boundary
    pub h0: i32,

    // Outputs
    pub score: i32,
    /// Exclusive end of the best local alignment on the query
    pub query_end: i32,
    /// Exclusive end of the best local alignment on the reference
    pub ref_end: i32,
    /// Exclusive reference end where the query was fully consumed
    pub global_ref_end: i32,
    pub global_score: i32,
    pub max_offset: i32,
}

impl SeqPair {
    pub fn new(ref_offset: usize, ref_len: i32, query_offset: usize, query_len: i32, h0: i32) -> Self {
        SeqPair {
            ref_offset,
            query_offset,
            ref_len,
            query_len,
            h0,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    /// Stores kernel results into the output fields.
    #[inline]
    pub fn set_outputs(&mut self, out: &OutScore) {
        self.score = out.score;
        self.query_end = out.query_end_pos;
        self.ref_end = out.target_end_pos;
        self.global_ref_end = out.gtarget_end_pos;
        self.global_score = out.global_score;
        self.max_offset = out.max_offset;
    }

    /// Output block as an `OutScore`.
    pub fn outputs(&self) -> OutScore {
        OutScore {
            score: self.score,
            target_end_pos: self.ref_end,
            gtarget_end_pos: self.global_ref_end,
            query_end_pos: self.query_end,
            global_score: self.global_score,
            max_offset: self.max_offset,
        }
    }

    /// Copies only the output block from `other`.
    #[inline]
    pub fn copy_outputs_from(&mut self, other: &SeqPair) {
        self.set_outputs(&other.outputs());
    }
}

/// Per-call counters, the Rust side of bwa-mem2's setup/sort1/sw/sort2 ticks
/// and `SW_cells`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BswStats {
    pub setup: Duration,
    pub sort: Duration,
    pub kernel: Duration,
    pub restore: Duration,
    /// In-band DP cells evaluated across all pairs
    pub cells: u64,
    pub narrow_pairs: usize,
    pub wide_pairs: usize,
    pub scalar_pairs: usize,
}

impl BswStats {
    pub fn total_pairs(&self) -> usize {
        self.narrow_pairs + self.wide_pairs + self.scalar_pairs
    }
}
