use strata_lod::TreeUpdate;

/// Snapshot of terrain streaming state after the latest update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerrainStats {
    /// Updates run so far.
    pub frame: u64,
    /// Leaves of the chunk tree (chunks that should be displayed).
    pub leaves: usize,
    /// Chunks attached to the scene.
    pub attached: usize,
    /// Built chunks waiting for the rest of their swap group.
    pub ready: usize,
    /// Builds submitted but not yet collected.
    pub in_flight: usize,
    /// Builds started during the latest update.
    pub builds_started: usize,
    /// Builds wanted during the latest update but left for later ones.
    pub deferred: usize,
    /// Swap groups committed during the latest update.
    pub swaps: usize,
    /// Built chunks thrown away because they no longer matched the tree.
    pub stale_discards: u64,
    /// Triangles across attached chunks.
    pub triangles: usize,
    /// Structural tree changes during the latest update.
    pub tree: TreeUpdate,
}

impl TerrainStats {
    /// Draw batches submitted to the scene: one per attached chunk.
    pub fn batches(&self) -> usize {
        self.attached
    }
}
