//! Procedural sources that need no files: the rolling sinusoid landscape used
//! by the demo and a constant-height plane used by tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::source::check_square_buffer;
use crate::{HeightfieldError, HeightfieldSource, LayerInfo};

/// Ground textures shipped with the demo scene.
pub const DESERT_TEXTURES: [&str; 8] = [
    "adesert_cracks_d.jpg",
    "adesert_mntn2_d.jpg",
    "adesert_mntn4_d.jpg",
    "adesert_mntn4v_d.jpg",
    "adesert_mntn_d.jpg",
    "adesert_rocky_d.jpg",
    "adesert_sand2_d.jpg",
    "adesert_stone_d.jpg",
];

/// The demo layer palette, one diffuse-only layer per desert texture.
pub fn desert_layers() -> Vec<LayerInfo> {
    DESERT_TEXTURES.iter().map(|name| LayerInfo::diffuse(*name)).collect()
}

/// Fill a blendmap with uniformly random layer indices from a seeded RNG.
pub fn random_blendmap(layer_count: u32, seed: u64, layer_indices: &mut [u32]) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for index in layer_indices.iter_mut() {
        *index = rng.random_range(0..layer_count);
    }
}

/// Rolling hills: `h(row, col) = sin(col / 50) * 400 + cos(row / 50) * 200`.
///
/// Layers are the eight desert textures, assigned randomly per blend cell.
#[derive(Clone, Debug)]
pub struct SinusoidSource {
    /// Elevation grid side.
    pub heightmap_size: usize,
    /// Layer grid side.
    pub blendmap_size: usize,
    /// World units per cell.
    pub cell_spacing: f32,
    /// Seed for the random layer assignment.
    pub seed: u64,
}

impl Default for SinusoidSource {
    fn default() -> Self {
        Self {
            heightmap_size: 512,
            blendmap_size: 512,
            cell_spacing: 10.0,
            seed: 42,
        }
    }
}

impl SinusoidSource {
    /// Closed-form height at an integer sample.
    pub fn height(row: usize, col: usize) -> f32 {
        (col as f32 / 50.0).sin() * 400.0 + (row as f32 / 50.0).cos() * 200.0
    }
}

impl HeightfieldSource for SinusoidSource {
    fn heightmap_size(&self) -> usize {
        self.heightmap_size
    }

    fn blendmap_size(&self) -> usize {
        self.blendmap_size
    }

    fn world_size(&self) -> f32 {
        self.heightmap_size as f32 * self.cell_spacing
    }

    fn load_heightmap(&self, heights: &mut [f32]) -> Result<(), HeightfieldError> {
        let n = self.heightmap_size;
        check_square_buffer("heightmap", n, heights.len())?;
        for (i, h) in heights.iter_mut().enumerate() {
            *h = Self::height(i / n, i % n);
        }
        Ok(())
    }

    fn load_blendmap(
        &self,
        layers: &mut Vec<LayerInfo>,
        layer_indices: &mut [u32],
    ) -> Result<(), HeightfieldError> {
        check_square_buffer("blendmap", self.blendmap_size, layer_indices.len())?;
        layers.extend(desert_layers());
        random_blendmap(DESERT_TEXTURES.len() as u32, self.seed, layer_indices);
        Ok(())
    }
}

/// A constant-height plane covered by a single layer.
#[derive(Clone, Debug)]
pub struct FlatSource {
    /// Elevation grid side.
    pub heightmap_size: usize,
    /// World units per cell.
    pub cell_spacing: f32,
    /// Elevation of every sample.
    pub height: f32,
}

impl Default for FlatSource {
    fn default() -> Self {
        Self {
            heightmap_size: 65,
            cell_spacing: 1.0,
            height: 0.0,
        }
    }
}

impl HeightfieldSource for FlatSource {
    fn heightmap_size(&self) -> usize {
        self.heightmap_size
    }

    fn blendmap_size(&self) -> usize {
        1
    }

    fn world_size(&self) -> f32 {
        self.heightmap_size as f32 * self.cell_spacing
    }

    fn load_heightmap(&self, heights: &mut [f32]) -> Result<(), HeightfieldError> {
        check_square_buffer("heightmap", self.heightmap_size, heights.len())?;
        heights.fill(self.height);
        Ok(())
    }

    fn load_blendmap(
        &self,
        layers: &mut Vec<LayerInfo>,
        layer_indices: &mut [u32],
    ) -> Result<(), HeightfieldError> {
        layers.push(LayerInfo::diffuse(DESERT_TEXTURES[6]));
        layer_indices.fill(0);
        Ok(())
    }
}
