//! Build ordering by visual importance.

use crate::ChunkKey;

/// Factors that determine a chunk build's priority.
#[derive(Clone, Debug)]
pub struct ChunkPriorityFactors {
    /// Distance from the observer to the nearest point of the chunk.
    pub distance: f32,
    /// LOD level of the chunk (0 = highest detail, higher = coarser).
    pub lod: u8,
    /// No attached geometry covers this chunk's region yet, so the terrain
    /// has a visible gap until it is built.
    pub fills_gap: bool,
}

/// Compute a priority score from the given factors.
/// Higher scores mean higher priority (processed first).
#[must_use]
pub fn compute_priority(factors: &ChunkPriorityFactors) -> f64 {
    let mut score = 0.0;

    // Distance: closer chunks have quadratically higher priority.
    let distance_clamped = (factors.distance as f64).max(1.0);
    score += 10_000.0 / (distance_clamped * distance_clamped);

    // LOD level: lower LOD numbers (higher detail) get a bonus.
    score += 100.0 / f64::from(1_u32 << factors.lod.min(31));

    // Gaps come before refinements of already covered ground.
    if factors.fills_gap {
        score *= 10.0;
    }

    score
}

/// A chunk waiting for a build, scored by [`compute_priority`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildCandidate {
    pub key: ChunkKey,
    /// Higher builds first.
    pub priority: f64,
}

/// Order `candidates` most important first. Equal scores fall back to key
/// order so a frame's schedule is deterministic.
pub fn sort_by_priority(candidates: &mut [BuildCandidate]) {
    candidates.sort_unstable_by(|a, b| {
        b.priority
            .total_cmp(&a.priority)
            .then_with(|| a.key.cmp(&b.key))
    });
}
