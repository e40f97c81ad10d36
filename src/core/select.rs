use hashbrown::HashMap;
use rand::Rng;

use crate::{puzzle::PuzzleRecord, types::Difficulty};

/// Per-tier puzzle counts. Tiers with no puzzles are absent.
pub type TierCounts = HashMap<Difficulty, usize>;

/// Takes one candidate uniformly at random, or `None` when there are none.
pub fn pick_uniform<R: Rng + ?Sized>(
    mut candidates: Vec<PuzzleRecord>,
    rng: &mut R,
) -> Option<PuzzleRecord> {
    if candidates.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..candidates.len());
    Some(candidates.swap_remove(idx))
}

/// Counts records per tier.
pub fn tally<'a>(records: impl IntoIterator<Item = &'a PuzzleRecord>) -> TierCounts {
    let mut counts = TierCounts::new();
    for rec in records {
        *counts.entry(rec.difficulty).or_insert(0) += 1;
    }
    counts
}
