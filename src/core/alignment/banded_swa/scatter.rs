//! Result scatter: lane outcomes back into pair records, working order back
//! into caller order.

use super::types::{LaneOutcome, SeqPair};

/// Writes one lane group's outcomes into its pair records and returns the
/// in-band cell count of the real (unpadded) lanes.
pub fn scatter_lane_outcomes(chunk: &mut [SeqPair], outcomes: &[LaneOutcome]) -> u64 {
    debug_assert!(outcomes.len() >= chunk.len());
    let mut cells = 0;
    for (pair, out) in chunk.iter_mut().zip(outcomes) {
        pair.set_outputs(&out.score);
        cells += out.cells;
    }
    cells
}

/// Restores a counting-sorted block to id order (bwa-mem2 sortPairsId).
///
/// The block must hold exactly the ids `first..first + pairs.len()`.
pub fn sort_pairs_id(pairs: &mut [SeqPair], first: usize, tmp: &mut Vec<SeqPair>) {
    tmp.clear();
    tmp.resize(pairs.len(), SeqPair::default());
    for p in pairs.iter() {
        let pos = p.id - first;
        debug_assert!(pos < pairs.len(), "id {} outside block starting at {first}", p.id);
        tmp[pos] = *p;
    }
    pairs.copy_from_slice(tmp);
}

/// Copies outputs from a working array (restored to positional ids) into the
/// caller's records; `members[pos]` is the caller index of working slot `pos`.
/// Padding slots past `members` are dropped.
pub fn scatter_outputs(work: &[SeqPair], members: &[usize], pairs: &mut [SeqPair]) {
    for (pos, &idx) in members.iter().enumerate() {
        debug_assert_eq!(work[pos].id, pos, "working array not in id order");
        pairs[idx].copy_outputs_from(&work[pos]);
    }
}
