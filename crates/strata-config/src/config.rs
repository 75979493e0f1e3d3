//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Terrain layout and geometry settings.
    pub terrain: TerrainConfig,
    /// Level-of-detail selection.
    pub lod: LodConfig,
    /// Chunk build scheduling.
    pub streaming: StreamingConfig,
    /// Settings for the headless demo binary.
    pub demo: DemoConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Which world plane the terrain lies in. The remaining axis is "up".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlignmentSetting {
    /// Terrain spans X/Z, heights along +Y.
    #[default]
    XZ,
    /// Terrain spans X/Y, heights along +Z.
    XY,
    /// Terrain spans Y/Z, heights along +X.
    YZ,
}

/// Terrain layout and geometry configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// World units between adjacent heightmap samples.
    pub cell_spacing: f32,
    /// Quads per chunk side. Every chunk has `(resolution + 1)^2` surface
    /// vertices regardless of its LOD. Must be a power of two.
    pub chunk_resolution: u32,
    /// Largest chunk, in heightmap cells, that may be rendered as one batch.
    /// Larger quadtree nodes are always subdivided.
    pub max_chunk_cells: u32,
    /// Plane the terrain is laid out in.
    pub alignment: AlignmentSetting,
    /// Depth of the vertical skirt hung below every chunk border, in world
    /// units. Zero disables skirts.
    pub skirt_depth: f32,
    /// Snap border vertices onto coarser neighbours' edges.
    pub stitch_edges: bool,
    /// Upper bound on texture layers blended within a single chunk.
    pub max_layers_per_chunk: u8,
    /// Forwarded to the renderer in each chunk material.
    pub shaders: bool,
}

/// LOD selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Explicit distance thresholds, one per LOD boundary. Empty derives
    /// them from chunk size and `distance_factor`.
    pub thresholds: Vec<f32>,
    /// Multiplier applied to a chunk's world size to get its split distance.
    pub distance_factor: f32,
    /// Fraction of a threshold the observer must overshoot before a chunk
    /// changes level.
    pub hysteresis: f32,
}

/// Chunk build scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Maximum chunk builds started per `update()` call.
    pub build_budget: u32,
    /// Background build threads. `Some(0)` builds inline on the update
    /// thread; `None` sizes the pool from the CPU count.
    pub worker_threads: Option<u32>,
    /// Capacity of the completed-build channel.
    pub result_capacity: u32,
}

/// Which heightfield source the demo constructs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    /// `sin(col/50)*400 + cos(row/50)*200`.
    #[default]
    Sinusoid,
    /// Height zero everywhere.
    Flat,
    /// Fractal simplex noise.
    Noise,
    /// Grayscale image on disk.
    Image,
}

/// Headless demo configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Heightfield provider.
    pub source: SourceKind,
    /// Side length of generated heightmaps.
    pub heightmap_size: u32,
    /// Side length of generated blendmaps.
    pub blendmap_size: u32,
    /// Seed for layer assignment, noise, and object placement.
    pub seed: u64,
    /// Image to load when `source` is `Image`.
    pub image_path: Option<PathBuf>,
    /// World-height units per full-scale image sample.
    pub image_height_scale: f32,
    /// Objects scattered on the terrain at startup.
    pub object_count: u32,
    /// Simulated frames to run.
    pub frames: u32,
    /// Simulated seconds per frame.
    pub frame_time: f32,
    /// Camera speed in world units per second.
    pub camera_speed: f32,
    /// Height of the camera above the ground.
    pub camera_altitude: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Start with the renderer in wireframe mode.
    pub wireframe_mode: bool,
    /// Seconds between stats reports (0 disables them).
    pub stats_interval: f32,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            cell_spacing: 10.0,
            chunk_resolution: 32,
            max_chunk_cells: 128,
            alignment: AlignmentSetting::XZ,
            skirt_depth: 20.0,
            stitch_edges: true,
            max_layers_per_chunk: 4,
            shaders: true,
        }
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            thresholds: Vec::new(),
            distance_factor: 2.0,
            hysteresis: 0.1,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            build_budget: 8,
            worker_threads: Some(0),
            result_capacity: 64,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Sinusoid,
            heightmap_size: 512,
            blendmap_size: 512,
            seed: 42,
            image_path: None,
            image_height_scale: 1000.0,
            object_count: 100,
            frames: 600,
            frame_time: 1.0 / 60.0,
            camera_speed: 200.0,
            camera_altitude: 400.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            wireframe_mode: false,
            stats_interval: 1.0,
            log_level: "info".to_string(),
        }
    }
}

/// Per-user directory holding `config.ron`.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("strata"))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Validation ---

impl Config {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            })
        };

        if !(self.terrain.cell_spacing > 0.0) {
            return invalid("terrain.cell_spacing", "must be positive");
        }
        let resolution = self.terrain.chunk_resolution;
        if !resolution.is_power_of_two() || !(2..=128).contains(&resolution) {
            return invalid(
                "terrain.chunk_resolution",
                "must be a power of two between 2 and 128",
            );
        }
        if self.terrain.max_chunk_cells < self.terrain.chunk_resolution {
            return invalid(
                "terrain.max_chunk_cells",
                "must be at least terrain.chunk_resolution",
            );
        }
        if self.terrain.skirt_depth < 0.0 {
            return invalid("terrain.skirt_depth", "must not be negative");
        }
        if !(1..=4).contains(&self.terrain.max_layers_per_chunk) {
            return invalid("terrain.max_layers_per_chunk", "must be between 1 and 4");
        }
        if !(0.0..0.5).contains(&self.lod.hysteresis) {
            return invalid("lod.hysteresis", "must be in [0, 0.5)");
        }
        if self.lod.thresholds.is_empty() && !(self.lod.distance_factor > 0.0) {
            return invalid("lod.distance_factor", "must be positive");
        }
        if self
            .lod
            .thresholds
            .windows(2)
            .any(|pair| pair[1] <= pair[0])
            || self.lod.thresholds.iter().any(|&t| t <= 0.0)
        {
            return invalid("lod.thresholds", "must be positive and strictly increasing");
        }
        if self.streaming.build_budget == 0 {
            return invalid("streaming.build_budget", "must be at least 1");
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::Read)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::Parse)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::Write)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(ConfigError::Write)
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let contents =
            std::fs::read_to_string(config_dir.join(CONFIG_FILE)).map_err(ConfigError::Read)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::Parse)?;
        new_config.validate()?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("chunk_resolution: 32"));
        assert!(ron_str.contains("build_budget: 8"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_missing_section_uses_default() {
        let config: Config = ron::from_str("(terrain: (cell_spacing: 4.0))").unwrap();
        assert_eq!(config.terrain.cell_spacing, 4.0);
        assert_eq!(config.terrain.chunk_resolution, 32);
        assert_eq!(config.lod, LodConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_enum_settings_parse() {
        let config: Config =
            ron::from_str("(terrain: (alignment: XY), demo: (source: Noise))").unwrap();
        assert_eq!(config.terrain.alignment, AlignmentSetting::XY);
        assert_eq!(config.demo.source, SourceKind::Noise);
    }

    #[test]
    fn test_validate_rejects_non_positive_spacing() {
        let mut config = Config::default();
        config.terrain.cell_spacing = 0.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "terrain.cell_spacing",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_odd_resolution() {
        let mut config = Config::default();
        config.terrain.chunk_resolution = 24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unordered_thresholds() {
        let mut config = Config::default();
        config.lod.thresholds = vec![100.0, 50.0];
        assert!(config.validate().is_err());
        config.lod.thresholds = vec![100.0, 200.0, 400.0];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = Config::default();
        config.streaming.build_budget = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.terrain.cell_spacing = 2.5;
        config.streaming.worker_threads = None;
        config.demo.image_path = Some(PathBuf::from("heights.png"));

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "(lod: (hysteresis: 0.9))").unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.streaming.build_budget = 2;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().streaming.build_budget, 2);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
