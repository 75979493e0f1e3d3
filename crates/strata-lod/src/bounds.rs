//! Axis-aligned chunk bounding volumes.

use glam::Vec3;
use strata_heightfield::SampleGrid;

use crate::{ChunkKey, ChunkLayout};

/// Terrain-space AABB of a chunk: its x/z region and the height range of the
/// samples it covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkBounds {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl ChunkBounds {
    /// Bounds of `key`, with heights read from the grid's min/max pyramid.
    pub fn of(grid: &SampleGrid, layout: &ChunkLayout, key: ChunkKey) -> Self {
        let (lo, hi) = layout.region(key);
        let level = layout.chunk_cells(key.depth).trailing_zeros();
        let (min_h, max_h) = grid.block_height_range(level, key.x, key.z);
        Self {
            min: Vec3::new(lo.x, min_h, lo.y),
            max: Vec3::new(hi.x, max_h, hi.y),
        }
    }

    /// Centre of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Distance from `point` to the nearest point of the box; zero inside.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        point.distance(point.clamp(self.min, self.max))
    }
}
