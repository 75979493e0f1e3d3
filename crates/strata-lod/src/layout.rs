//! Mapping between quadtree keys, LOD levels, grid cells and world space.

use glam::Vec2;

use crate::ChunkKey;

/// Fixed geometry of a chunk quadtree over a sample grid.
///
/// The root covers `root_cells` cells per side. Every node is meshed with
/// `chunk_resolution` quads per side, so a node at depth `d` samples the grid
/// every `2^lod` cells where `lod = max_depth - d`. LOD 0 is the finest level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkLayout {
    root_cells: u32,
    chunk_resolution: u32,
    cell_spacing: f32,
    max_depth: u8,
    min_depth: u8,
}

impl ChunkLayout {
    /// Build a layout. `root_cells` and `chunk_resolution` must be powers of
    /// two. A root smaller than the resolution lowers the resolution to fit.
    ///
    /// `max_chunk_cells` is the largest node footprint (in cells per side)
    /// that may be a leaf; larger nodes are always split.
    pub fn new(
        root_cells: u32,
        chunk_resolution: u32,
        max_chunk_cells: u32,
        cell_spacing: f32,
    ) -> Self {
        debug_assert!(root_cells.is_power_of_two());
        debug_assert!(chunk_resolution.is_power_of_two());

        let chunk_resolution = chunk_resolution.min(root_cells);
        let max_depth = (root_cells / chunk_resolution).trailing_zeros() as u8;
        let mut min_depth = 0;
        while min_depth < max_depth && (root_cells >> min_depth) > max_chunk_cells {
            min_depth += 1;
        }

        Self {
            root_cells,
            chunk_resolution,
            cell_spacing,
            max_depth,
            min_depth,
        }
    }

    /// Cells per side covered by the root.
    pub fn root_cells(&self) -> u32 {
        self.root_cells
    }

    /// Quads per side of every chunk mesh.
    pub fn chunk_resolution(&self) -> u32 {
        self.chunk_resolution
    }

    /// World units per cell.
    pub fn cell_spacing(&self) -> f32 {
        self.cell_spacing
    }

    /// Deepest subdivision; nodes here are at LOD 0.
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Nodes shallower than this are always split.
    pub fn min_depth(&self) -> u8 {
        self.min_depth
    }

    /// Coarsest LOD level (the root's).
    pub fn max_lod(&self) -> u8 {
        self.max_depth
    }

    /// LOD level of a node at `depth`.
    #[inline]
    pub fn lod_of(&self, depth: u8) -> u8 {
        self.max_depth.saturating_sub(depth)
    }

    /// Depth of nodes at LOD `lod`.
    #[inline]
    pub fn depth_of(&self, lod: u8) -> u8 {
        self.max_depth.saturating_sub(lod)
    }

    /// Grid cells between adjacent mesh vertices at `depth`.
    #[inline]
    pub fn stride(&self, depth: u8) -> u32 {
        1 << self.lod_of(depth)
    }

    /// Cells per side covered by a node at `depth`.
    #[inline]
    pub fn chunk_cells(&self, depth: u8) -> u32 {
        self.root_cells >> depth
    }

    /// World size of a node at `depth`.
    #[inline]
    pub fn chunk_world_size(&self, depth: u8) -> f32 {
        self.chunk_cells(depth) as f32 * self.cell_spacing
    }

    /// World size of the finest chunks.
    pub fn leaf_world_size(&self) -> f32 {
        self.chunk_world_size(self.max_depth)
    }

    /// Grid coordinates `(col, row)` of the node's lower corner.
    #[inline]
    pub fn origin_cells(&self, key: ChunkKey) -> (u32, u32) {
        let cells = self.chunk_cells(key.depth);
        (key.x * cells, key.z * cells)
    }

    /// World-space `(min, max)` corners of the node's region on the x/z plane.
    pub fn region(&self, key: ChunkKey) -> (Vec2, Vec2) {
        let size = self.chunk_world_size(key.depth);
        let min = Vec2::new(key.x as f32, key.z as f32) * size;
        (min, min + Vec2::splat(size))
    }

    /// The node at `depth` whose region contains world `(x, z)`; points
    /// outside the root are clamped onto it.
    pub fn key_at(&self, depth: u8, x: f32, z: f32) -> ChunkKey {
        let size = self.chunk_world_size(depth);
        let last = ChunkKey::grid_size(depth) - 1;
        let index = |v: f32| {
            if v.is_nan() || v <= 0.0 {
                0
            } else {
                ((v / size) as u32).min(last)
            }
        };
        ChunkKey::new(depth, index(x), index(z))
    }
}
