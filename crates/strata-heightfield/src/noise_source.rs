//! Multi-octave fractal Brownian motion (fBm) heightfield source.
//!
//! Composites octaves of simplex noise into a heightmap with features at many
//! spatial frequencies. Layers are picked by elevation band so the blendmap
//! follows the landscape.

use noise::{NoiseFn, Simplex};

use crate::source::check_square_buffer;
use crate::synthetic::{DESERT_TEXTURES, desert_layers};
use crate::{HeightfieldError, HeightfieldSource, LayerInfo};

/// fBm parameters, in world units.
#[derive(Clone, Debug)]
pub struct FbmParams {
    /// Noise seed.
    pub seed: u32,
    /// Octaves to composite. Typical range: 4-8.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency of the first octave, in cycles per world unit.
    pub base_frequency: f64,
    /// Amplitude of the first octave.
    pub amplitude: f64,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 6,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.0005,
            amplitude: 600.0,
        }
    }
}

/// Heightfield generated from fBm simplex noise.
pub struct NoiseSource {
    noise: Simplex,
    params: FbmParams,
    heightmap_size: usize,
    blendmap_size: usize,
    cell_spacing: f32,
}

impl NoiseSource {
    /// Create a source of `heightmap_size` samples per side.
    pub fn new(
        params: FbmParams,
        heightmap_size: usize,
        blendmap_size: usize,
        cell_spacing: f32,
    ) -> Self {
        Self {
            noise: Simplex::new(params.seed),
            params,
            heightmap_size,
            blendmap_size,
            cell_spacing,
        }
    }

    /// Noise value at a world-space point.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.amplitude;

        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, z * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        total
    }

    /// Theoretical maximum absolute height (geometric series of amplitudes).
    pub fn max_amplitude(&self) -> f64 {
        let mut sum = 0.0;
        let mut amp = self.params.amplitude;
        for _ in 0..self.params.octaves {
            sum += amp;
            amp *= self.params.persistence;
        }
        sum
    }

    /// Desert layer for a height, banded from low (sand) to high (stone).
    fn band_layer(&self, height: f64) -> u32 {
        let max = self.max_amplitude().max(f64::EPSILON);
        let t = ((height / max) * 0.5 + 0.5).clamp(0.0, 1.0);
        let count = DESERT_TEXTURES.len() as f64;
        ((t * count) as u32).min(DESERT_TEXTURES.len() as u32 - 1)
    }
}

impl HeightfieldSource for NoiseSource {
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
        let spacing = self.cell_spacing as f64;
        for (i, h) in heights.iter_mut().enumerate() {
            let x = (i % n) as f64 * spacing;
            let z = (i / n) as f64 * spacing;
            *h = self.sample(x, z) as f32;
        }
        Ok(())
    }

    fn load_blendmap(
        &self,
        layers: &mut Vec<LayerInfo>,
        layer_indices: &mut [u32],
    ) -> Result<(), HeightfieldError> {
        let m = self.blendmap_size;
        check_square_buffer("blendmap", m, layer_indices.len())?;
        layers.extend(desert_layers());

        let cell = self.world_size() as f64 / m as f64;
        for (i, index) in layer_indices.iter_mut().enumerate() {
            let x = ((i % m) as f64 + 0.5) * cell;
            let z = ((i / m) as f64 + 0.5) * cell;
            *index = self.band_layer(self.sample(x, z));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SampleGrid;

    const EPSILON: f64 = 1e-9;

    fn source(seed: u32) -> NoiseSource {
        NoiseSource::new(
            FbmParams {
                seed,
                ..Default::default()
            },
            33,
            8,
            10.0,
        )
    }

    #[test]
    fn test_same_seed_same_heights() {
        let a = source(42);
        let b = source(42);
        assert!((a.sample(100.0, 200.0) - b.sample(100.0, 200.0)).abs() < EPSILON);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = source(1);
        let b = source(999);
        assert!((a.sample(500.0, 500.0) - b.sample(500.0, 500.0)).abs() > EPSILON);
    }

    #[test]
    fn test_heights_within_max_amplitude() {
        let s = source(7);
        let grid = SampleGrid::from_source(&s, 10.0).unwrap();
        let (lo, hi) = grid.height_range();
        let max = s.max_amplitude() as f32;
        assert!(lo >= -max - 1e-3 && hi <= max + 1e-3, "range {lo}..{hi} exceeds {max}");
    }

    #[test]
    fn test_max_amplitude_calculation() {
        let s = NoiseSource::new(
            FbmParams {
                amplitude: 1000.0,
                persistence: 0.5,
                octaves: 4,
                ..Default::default()
            },
            4,
            1,
            1.0,
        );
        assert!((s.max_amplitude() - 1875.0).abs() < EPSILON);
    }

    #[test]
    fn test_blendmap_follows_elevation_bands() {
        let s = source(3);
        let mut layers = Vec::new();
        let mut indices = vec![0; 64];
        s.load_blendmap(&mut layers, &mut indices).unwrap();
        assert_eq!(layers.len(), DESERT_TEXTURES.len());
        assert!(indices.iter().all(|&i| (i as usize) < layers.len()));
        assert_eq!(s.band_layer(-1e9), 0);
        assert_eq!(s.band_layer(1e9), DESERT_TEXTURES.len() as u32 - 1);
    }
}
