//! Pieces of the headless demo: source selection, object placement and the
//! scripted camera flight.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use strata_config::{Config, SourceKind};
use strata_heightfield::{
    FbmParams, FlatSource, HeightfieldError, HeightfieldSource, ImageSource, NoiseSource,
    SinusoidSource,
};
use strata_world::{SceneSink, TerrainError, TerrainWorld};

/// Reasons the demo cannot start.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// `source` is `Image` but no path was configured.
    #[error("image source selected but no image path given (use --image)")]
    MissingImagePath,

    /// The heightfield source could not be opened.
    #[error(transparent)]
    Heightfield(#[from] HeightfieldError),

    /// The terrain world rejected the source or options.
    #[error(transparent)]
    Terrain(#[from] TerrainError),

    /// The loaded configuration is inconsistent.
    #[error(transparent)]
    Config(#[from] strata_config::ConfigError),
}

/// Build the heightfield source the config asks for.
pub fn build_source(config: &Config) -> Result<Box<dyn HeightfieldSource>, DemoError> {
    let demo = &config.demo;
    let spacing = config.terrain.cell_spacing;
    let heightmap_size = demo.heightmap_size as usize;
    let blendmap_size = demo.blendmap_size as usize;

    let source: Box<dyn HeightfieldSource> = match demo.source {
        SourceKind::Sinusoid => Box::new(SinusoidSource {
            heightmap_size,
            blendmap_size,
            cell_spacing: spacing,
            seed: demo.seed,
        }),
        SourceKind::Flat => Box::new(FlatSource {
            heightmap_size,
            cell_spacing: spacing,
            height: 0.0,
        }),
        SourceKind::Noise => {
            let params = FbmParams {
                seed: demo.seed as u32,
                ..Default::default()
            };
            Box::new(NoiseSource::new(params, heightmap_size, blendmap_size, spacing))
        }
        SourceKind::Image => {
            let path = demo.image_path.as_ref().ok_or(DemoError::MissingImagePath)?;
            Box::new(ImageSource::open(path, spacing, demo.image_height_scale)?)
        }
    };
    Ok(source)
}

/// An object resting on the terrain surface.
#[derive(Clone, Copy, Debug)]
pub struct PlacedObject {
    /// Contact point on the surface.
    pub position: Vec3,
    /// Rotation taking the terrain's up axis onto the surface normal.
    pub orientation: Quat,
}

/// Scatter `count` objects over the terrain with a seeded RNG, each resting
/// on the surface and tilted to its slope.
pub fn place_objects<S: SceneSink>(
    world: &TerrainWorld<S>,
    count: u32,
    seed: u64,
) -> Vec<PlacedObject> {
    let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
    let size = world.world_size();
    let up = world.alignment().up();

    (0..count)
        .map(|_| {
            let a = rng.gen_range(0.0..size);
            let b = rng.gen_range(0.0..size);
            let planar = world.alignment().to_world(Vec3::new(a, 0.0, b));
            let position = world.surface_point(planar);
            let normal = world.normal_at(position);
            PlacedObject {
                position,
                orientation: Quat::from_rotation_arc(up, normal),
            }
        })
        .collect()
}

/// Closed circuit over the terrain at a fixed height above the ground.
#[derive(Clone, Copy, Debug)]
pub struct CameraFlight {
    centre: f32,
    radius: f32,
    speed: f32,
    altitude: f32,
}

impl CameraFlight {
    /// A circuit around the middle of a terrain of side `world_size`.
    pub fn new(world_size: f32, speed: f32, altitude: f32) -> Self {
        Self {
            centre: world_size * 0.5,
            radius: world_size * 0.35,
            speed,
            altitude,
        }
    }

    /// Observer position (world space) after `time` seconds of flight.
    pub fn position<S: SceneSink>(&self, world: &TerrainWorld<S>, time: f32) -> Vec3 {
        let angle = if self.radius > 0.0 {
            time * self.speed / self.radius
        } else {
            0.0
        };
        let a = self.centre + self.radius * angle.cos();
        let b = self.centre + self.radius * angle.sin();
        let ground = world.surface_point(world.alignment().to_world(Vec3::new(a, 0.0, b)));
        ground + world.alignment().up() * self.altitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_world::{RecordingScene, TerrainOptions};

    fn sinusoid_world() -> TerrainWorld<RecordingScene> {
        let source = SinusoidSource {
            heightmap_size: 129,
            blendmap_size: 64,
            cell_spacing: 10.0,
            seed: 1,
        };
        TerrainWorld::new(RecordingScene::new(), &source, TerrainOptions::default()).unwrap()
    }

    #[test]
    fn test_image_source_needs_path() {
        let mut config = Config::default();
        config.demo.source = SourceKind::Image;
        assert!(matches!(
            build_source(&config),
            Err(DemoError::MissingImagePath)
        ));
    }

    #[test]
    fn test_build_source_uses_demo_sizes() {
        let mut config = Config::default();
        config.demo.source = SourceKind::Flat;
        config.demo.heightmap_size = 33;
        let source = build_source(&config).unwrap();
        assert_eq!(source.heightmap_size(), 33);
        assert_eq!(source.world_size(), 330.0);
    }

    #[test]
    fn test_objects_rest_on_surface() {
        let world = sinusoid_world();
        let objects = place_objects(&world, 50, 42);
        assert_eq!(objects.len(), 50);
        for object in &objects {
            let ground = world.height_at(object.position);
            assert!((object.position.y - ground).abs() < 1e-3);
            let tilted_up = object.orientation * Vec3::Y;
            assert!(tilted_up.dot(world.normal_at(object.position)) > 0.999);
        }
    }

    #[test]
    fn test_placement_is_deterministic() {
        let world = sinusoid_world();
        let a = place_objects(&world, 10, 7);
        let b = place_objects(&world, 10, 7);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.position, y.position);
        }
    }

    #[test]
    fn test_camera_stays_above_ground() {
        let world = sinusoid_world();
        let flight = CameraFlight::new(world.world_size(), 200.0, 50.0);
        for step in 0..100 {
            let p = flight.position(&world, step as f32 * 0.5);
            let ground = world.height_at(p);
            assert!((p.y - ground - 50.0).abs() < 1e-2, "step {step}");
            assert!(p.x >= 0.0 && p.x <= world.world_size());
        }
    }
}
