//! Construction-time terrain parameters.

use strata_config::{AlignmentSetting, Config};
use strata_heightfield::Alignment;
use strata_lod::DEFAULT_HYSTERESIS;
use strata_mesh::{MAX_LAYERS_PER_CHUNK, default_worker_count};

use crate::TerrainError;

/// Everything [`crate::TerrainWorld::new`] needs besides the scene and the
/// heightfield source.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainOptions {
    /// World units between samples. `None` derives it from the source as
    /// `world_size / heightmap_size`.
    pub cell_spacing: Option<f32>,
    /// Quads per chunk side (power of two, 2..=128).
    pub chunk_resolution: u32,
    /// Largest chunk footprint, in cells per side, that may be a leaf.
    pub max_chunk_cells: u32,
    /// World plane of the terrain.
    pub alignment: Alignment,
    /// Skirt depth below chunk borders; 0 disables skirts.
    pub skirt_depth: f32,
    /// Snap borders facing coarser neighbours.
    pub stitch_edges: bool,
    /// Layer palette limit per chunk (1..=4).
    pub max_layers_per_chunk: usize,
    /// Forwarded to the scene in every chunk material.
    pub shaders: bool,
    /// Explicit distance thresholds; `None` derives them from chunk size.
    pub thresholds: Option<Vec<f32>>,
    /// Multiplier for derived thresholds.
    pub distance_factor: f32,
    /// Hysteresis margin as a fraction of each threshold.
    pub hysteresis: f32,
    /// Maximum chunk builds started per update.
    pub build_budget: usize,
    /// Background build threads; `Some(0)` builds on the update thread and
    /// `None` sizes the pool from the CPU count.
    pub worker_threads: Option<usize>,
    /// Capacity of the build task and result channels.
    pub result_capacity: usize,
}

impl Default for TerrainOptions {
    fn default() -> Self {
        Self {
            cell_spacing: None,
            chunk_resolution: 32,
            max_chunk_cells: 128,
            alignment: Alignment::XZ,
            skirt_depth: 20.0,
            stitch_edges: true,
            max_layers_per_chunk: MAX_LAYERS_PER_CHUNK,
            shaders: true,
            thresholds: None,
            distance_factor: 2.0,
            hysteresis: DEFAULT_HYSTERESIS,
            build_budget: 8,
            worker_threads: Some(0),
            result_capacity: 64,
        }
    }
}

impl TerrainOptions {
    /// Options from the `terrain`, `lod` and `streaming` config sections.
    pub fn from_config(config: &Config) -> Self {
        let alignment = match config.terrain.alignment {
            AlignmentSetting::XZ => Alignment::XZ,
            AlignmentSetting::XY => Alignment::XY,
            AlignmentSetting::YZ => Alignment::YZ,
        };
        let thresholds = if config.lod.thresholds.is_empty() {
            None
        } else {
            Some(config.lod.thresholds.clone())
        };
        Self {
            cell_spacing: Some(config.terrain.cell_spacing),
            chunk_resolution: config.terrain.chunk_resolution,
            max_chunk_cells: config.terrain.max_chunk_cells,
            alignment,
            skirt_depth: config.terrain.skirt_depth,
            stitch_edges: config.terrain.stitch_edges,
            max_layers_per_chunk: config.terrain.max_layers_per_chunk as usize,
            shaders: config.terrain.shaders,
            thresholds,
            distance_factor: config.lod.distance_factor,
            hysteresis: config.lod.hysteresis,
            build_budget: config.streaming.build_budget as usize,
            worker_threads: config.streaming.worker_threads.map(|n| n as usize),
            result_capacity: config.streaming.result_capacity as usize,
        }
    }

    /// Build threads the world will start.
    pub fn worker_count(&self) -> usize {
        self.worker_threads.unwrap_or_else(default_worker_count)
    }

    /// Reject values the world cannot be built with. Threshold tables and
    /// hysteresis are checked by the LOD policy itself.
    pub fn validate(&self) -> Result<(), TerrainError> {
        let invalid = |field, reason: &str| {
            Err(TerrainError::InvalidOption {
                field,
                reason: reason.to_string(),
            })
        };

        let resolution = self.chunk_resolution;
        if !resolution.is_power_of_two() || !(2..=128).contains(&resolution) {
            return invalid("chunk_resolution", "must be a power of two between 2 and 128");
        }
        if self.max_chunk_cells < resolution {
            return invalid("max_chunk_cells", "must be at least chunk_resolution");
        }
        if !(self.skirt_depth >= 0.0 && self.skirt_depth.is_finite()) {
            return invalid("skirt_depth", "must be finite and not negative");
        }
        if !(1..=MAX_LAYERS_PER_CHUNK).contains(&self.max_layers_per_chunk) {
            return invalid("max_layers_per_chunk", "must be between 1 and 4");
        }
        if self.thresholds.is_none()
            && !(self.distance_factor > 0.0 && self.distance_factor.is_finite())
        {
            return invalid("distance_factor", "must be positive");
        }
        if self.build_budget == 0 {
            return invalid("build_budget", "must be at least 1");
        }
        if self.worker_count() > 0 && self.result_capacity == 0 {
            return invalid("result_capacity", "must be at least 1 with worker threads");
        }
        Ok(())
    }
}
