//! Queryable heightfield: bilinear height, analytic normals, blend weights,
//! and a min/max pyramid for chunk bounding volumes.

use glam::Vec3;

use crate::{HeightfieldError, HeightfieldSource, LayerInfo};

/// Relative tolerance when checking `world_size == heightmap_size * spacing`.
const WORLD_SIZE_TOLERANCE: f32 = 1e-4;

/// Up to four `(layer index, weight)` pairs whose weights sum to 1.
///
/// Pairs may repeat a layer when neighbouring blend cells agree.
pub type BlendSample = [(u32, f32); 4];

/// Heightfield data ingested once from a [`HeightfieldSource`], immutable
/// afterwards and safe to share across threads.
///
/// Heights are stored as an owned flat buffer addressed by
/// `row * heightmap_size + col`; column runs along terrain x, row along
/// terrain z, and sample `(row, col)` sits at world `(col, row) * cell_spacing`.
#[derive(Debug)]
pub struct SampleGrid {
    heights: Vec<f32>,
    heightmap_size: usize,
    blend: Vec<u32>,
    blendmap_size: usize,
    layers: Vec<LayerInfo>,
    cell_spacing: f32,
    world_size: f32,
    bounds: HeightPyramid,
}

impl SampleGrid {
    /// Ingest a source. Every structural problem with the data is reported
    /// here; nothing is checked again at query time.
    pub fn from_source(
        source: &dyn HeightfieldSource,
        cell_spacing: f32,
    ) -> Result<Self, HeightfieldError> {
        if !(cell_spacing.is_finite() && cell_spacing > 0.0) {
            return Err(HeightfieldError::InvalidCellSpacing(cell_spacing));
        }

        let heightmap_size = source.heightmap_size();
        if heightmap_size < 2 {
            return Err(HeightfieldError::HeightmapTooSmall(heightmap_size));
        }

        let world_size = source.world_size();
        let expected_world = heightmap_size as f32 * cell_spacing;
        if (world_size - expected_world).abs() > expected_world * WORLD_SIZE_TOLERANCE {
            return Err(HeightfieldError::WorldSizeMismatch {
                world_size,
                heightmap_size,
                cell_spacing,
            });
        }

        let mut heights = vec![0.0; heightmap_size * heightmap_size];
        source.load_heightmap(&mut heights)?;
        if let Some((index, &value)) = heights.iter().enumerate().find(|(_, h)| !h.is_finite()) {
            return Err(HeightfieldError::NonFiniteSample { index, value });
        }

        let blendmap_size = source.blendmap_size();
        if blendmap_size == 0 {
            return Err(HeightfieldError::EmptyBlendmap);
        }
        let mut layers = Vec::new();
        let mut blend = vec![0; blendmap_size * blendmap_size];
        source.load_blendmap(&mut layers, &mut blend)?;
        if layers.is_empty() {
            return Err(HeightfieldError::NoLayers);
        }
        if let Some((cell, &index)) = blend
            .iter()
            .enumerate()
            .find(|(_, i)| **i as usize >= layers.len())
        {
            return Err(HeightfieldError::LayerIndexOutOfRange {
                cell,
                index,
                layer_count: layers.len(),
            });
        }

        let bounds = HeightPyramid::build(&heights, heightmap_size);
        tracing::debug!(
            heightmap_size,
            blendmap_size,
            layers = layers.len(),
            world_size,
            "Ingested heightfield"
        );

        Ok(Self {
            heights,
            heightmap_size,
            blend,
            blendmap_size,
            layers,
            cell_spacing,
            world_size,
            bounds,
        })
    }

    /// Side length of the elevation grid.
    pub fn heightmap_size(&self) -> usize {
        self.heightmap_size
    }

    /// Side length of the layer-index grid.
    pub fn blendmap_size(&self) -> usize {
        self.blendmap_size
    }

    /// World units between adjacent samples.
    pub fn cell_spacing(&self) -> f32 {
        self.cell_spacing
    }

    /// Extent of the data footprint along each terrain axis.
    pub fn world_size(&self) -> f32 {
        self.world_size
    }

    /// Ordered texture layers.
    pub fn layers(&self) -> &[LayerInfo] {
        &self.layers
    }

    /// Cells along the side of the smallest power-of-two square that covers
    /// every heightmap cell. Quadtrees over this grid use it as root size.
    pub fn root_cells(&self) -> u32 {
        self.bounds.root_cells
    }

    /// Sample at integer grid coordinates; indices outside the grid are
    /// clamped to the nearest edge sample.
    #[inline]
    pub fn sample(&self, row: i64, col: i64) -> f32 {
        let last = (self.heightmap_size - 1) as i64;
        let r = row.clamp(0, last) as usize;
        let c = col.clamp(0, last) as usize;
        self.heights[r * self.heightmap_size + c]
    }

    /// Clamp world coordinates onto the data footprint `[0, world_size]`.
    ///
    /// Idempotent. NaN maps to the origin edge.
    #[inline]
    pub fn clamp_to_domain(&self, x: f32, z: f32) -> (f32, f32) {
        (
            clamp_coord(x, self.world_size),
            clamp_coord(z, self.world_size),
        )
    }

    /// Continuous grid coordinates `(col, row)` in `[0, N-1]` for a world point.
    #[inline]
    fn grid_coords(&self, x: f32, z: f32) -> (f32, f32) {
        let (x, z) = self.clamp_to_domain(x, z);
        let last = (self.heightmap_size - 1) as f32;
        (
            (x / self.cell_spacing).min(last),
            (z / self.cell_spacing).min(last),
        )
    }

    /// The cell containing grid point `(gx, gz)` and the fractional position
    /// inside it. The far edge belongs to the last cell (`u` or `v` = 1).
    #[inline]
    fn cell(&self, gx: f32, gz: f32) -> (usize, usize, f32, f32) {
        let max_cell = self.heightmap_size - 2;
        let col = (gx.floor() as usize).min(max_cell);
        let row = (gz.floor() as usize).min(max_cell);
        (col, row, gx - col as f32, gz - row as f32)
    }

    #[inline]
    fn corners(&self, col: usize, row: usize) -> [f32; 4] {
        let n = self.heightmap_size;
        let base = row * n + col;
        [
            self.heights[base],
            self.heights[base + 1],
            self.heights[base + n],
            self.heights[base + n + 1],
        ]
    }

    /// Terrain height at world `(x, z)`, bilinearly interpolated from the four
    /// enclosing samples. Out-of-domain input is clamped.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let (gx, gz) = self.grid_coords(x, z);
        let (col, row, u, v) = self.cell(gx, gz);
        let [h00, h10, h01, h11] = self.corners(col, row);
        let near = h00 + (h10 - h00) * u;
        let far = h01 + (h11 - h01) * u;
        near + (far - near) * v
    }

    /// Unit surface normal at world `(x, z)` in terrain space (+Y up).
    ///
    /// Interior points use the analytic gradient of the bilinear patch used
    /// by [`height_at`](Self::height_at). Points on the domain border, which
    /// includes every clamped out-of-domain point, use central differences of
    /// the nearest sample. A degenerate result falls back to `Vec3::Y`.
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let (gx, gz) = self.grid_coords(x, z);
        let last = (self.heightmap_size - 1) as f32;
        let on_border = gx <= 0.0 || gz <= 0.0 || gx >= last || gz >= last;

        let (dhdx, dhdz) = if on_border {
            self.central_gradient(gx.round() as i64, gz.round() as i64)
        } else {
            let (col, row, u, v) = self.cell(gx, gz);
            let [h00, h10, h01, h11] = self.corners(col, row);
            let du = (h10 - h00) * (1.0 - v) + (h11 - h01) * v;
            let dv = (h01 - h00) * (1.0 - u) + (h11 - h10) * u;
            (du / self.cell_spacing, dv / self.cell_spacing)
        };

        Vec3::new(-dhdx, 1.0, -dhdz)
            .try_normalize()
            .unwrap_or(Vec3::Y)
    }

    /// Central-difference gradient at a sample; one-sided where the
    /// neighbour on one side is missing.
    fn central_gradient(&self, col: i64, row: i64) -> (f32, f32) {
        let last = (self.heightmap_size - 1) as i64;
        let col = col.clamp(0, last);
        let row = row.clamp(0, last);

        let (c0, c1) = ((col - 1).max(0), (col + 1).min(last));
        let (r0, r1) = ((row - 1).max(0), (row + 1).min(last));
        let dx = (self.sample(row, c1) - self.sample(row, c0))
            / ((c1 - c0) as f32 * self.cell_spacing);
        let dz = (self.sample(r1, col) - self.sample(r0, col))
            / ((r1 - r0) as f32 * self.cell_spacing);
        (dx, dz)
    }

    /// World size of one blendmap cell.
    pub fn blend_cell_size(&self) -> f32 {
        self.world_size / self.blendmap_size as f32
    }

    /// Dominant layer of the blend cell containing world `(x, z)`.
    pub fn layer_at(&self, x: f32, z: f32) -> u32 {
        let (x, z) = self.clamp_to_domain(x, z);
        let size = self.blend_cell_size();
        let last = self.blendmap_size - 1;
        let col = ((x / size) as usize).min(last);
        let row = ((z / size) as usize).min(last);
        self.blend[row * self.blendmap_size + col]
    }

    /// Bilinear mix of the dominant layers of the four blend cells whose
    /// centres surround world `(x, z)`.
    pub fn blend_weights_at(&self, x: f32, z: f32) -> BlendSample {
        let (x, z) = self.clamp_to_domain(x, z);
        let size = self.blend_cell_size();
        let last = (self.blendmap_size - 1) as f32;

        let fx = (x / size - 0.5).clamp(0.0, last);
        let fz = (z / size - 0.5).clamp(0.0, last);
        let c0 = fx.floor() as usize;
        let r0 = fz.floor() as usize;
        let c1 = (c0 + 1).min(self.blendmap_size - 1);
        let r1 = (r0 + 1).min(self.blendmap_size - 1);
        let u = fx - c0 as f32;
        let v = fz - r0 as f32;

        let m = self.blendmap_size;
        [
            (self.blend[r0 * m + c0], (1.0 - u) * (1.0 - v)),
            (self.blend[r0 * m + c1], u * (1.0 - v)),
            (self.blend[r1 * m + c0], (1.0 - u) * v),
            (self.blend[r1 * m + c1], u * v),
        ]
    }

    /// Min and max height over the square block of `2^level` cells whose
    /// lower corner is cell `(block_x << level, block_z << level)`,
    /// including the samples on the block's far edges.
    pub fn block_height_range(&self, level: u32, block_x: u32, block_z: u32) -> (f32, f32) {
        self.bounds.range(level, block_x, block_z)
    }

    /// Lowest and highest sample in the whole grid.
    pub fn height_range(&self) -> (f32, f32) {
        self.bounds.range(self.bounds.top_level(), 0, 0)
    }
}

#[inline]
fn clamp_coord(value: f32, max: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

/// Min/max pyramid over power-of-two cell blocks.
///
/// Level 0 holds one entry per cell (its four corner samples); each level
/// above merges 2x2 blocks of the level below, up to a single root block.
#[derive(Debug)]
struct HeightPyramid {
    root_cells: u32,
    levels: Vec<Vec<(f32, f32)>>,
}

impl HeightPyramid {
    fn build(heights: &[f32], n: usize) -> Self {
        let root_cells = ((n - 1) as u32).next_power_of_two();
        let side = root_cells as usize;
        let last = n - 1;
        let at = |r: usize, c: usize| heights[r.min(last) * n + c.min(last)];

        let mut base = Vec::with_capacity(side * side);
        for r in 0..side {
            for c in 0..side {
                let corners = [at(r, c), at(r, c + 1), at(r + 1, c), at(r + 1, c + 1)];
                let lo = corners.iter().copied().fold(f32::INFINITY, f32::min);
                let hi = corners.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                base.push((lo, hi));
            }
        }

        let mut levels = vec![base];
        let mut side = side;
        while side > 1 {
            let below = &levels[levels.len() - 1];
            let half = side / 2;
            let mut merged = Vec::with_capacity(half * half);
            for r in 0..half {
                for c in 0..half {
                    let quad = [
                        below[(2 * r) * side + 2 * c],
                        below[(2 * r) * side + 2 * c + 1],
                        below[(2 * r + 1) * side + 2 * c],
                        below[(2 * r + 1) * side + 2 * c + 1],
                    ];
                    let lo = quad.iter().map(|b| b.0).fold(f32::INFINITY, f32::min);
                    let hi = quad.iter().map(|b| b.1).fold(f32::NEG_INFINITY, f32::max);
                    merged.push((lo, hi));
                }
            }
            levels.push(merged);
            side = half;
        }

        Self { root_cells, levels }
    }

    fn top_level(&self) -> u32 {
        (self.levels.len() - 1) as u32
    }

    fn range(&self, level: u32, block_x: u32, block_z: u32) -> (f32, f32) {
        let level = level.min(self.top_level());
        let side = (self.root_cells >> level).max(1);
        let x = block_x.min(side - 1) as usize;
        let z = block_z.min(side - 1) as usize;
        self.levels[level as usize][z * side as usize + x]
    }
}
