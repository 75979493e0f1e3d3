//! Viewpoint-driven terrain: LOD orchestration, chunk streaming into an
//! external scene, and height/normal queries.
//!
//! [`TerrainWorld`] owns the sample grid and chunk quadtree. Each call to
//! [`TerrainWorld::update`] re-evaluates the tree around the observer,
//! schedules a bounded number of chunk builds, and swaps finished geometry
//! into the [`SceneSink`] so the surface never shows holes or overlaps.
//! [`FrameLoop`] adds the per-frame controls a host application drives.

mod error;
mod frame_loop;
mod options;
mod scene;
mod stats;
mod world;

pub use error::TerrainError;
pub use frame_loop::{FrameLoop, FrameReport};
pub use options::TerrainOptions;
pub use scene::{DrawMode, RecordingScene, SceneSink, TerrainDescriptor, TerrainMaterial};
pub use stats::TerrainStats;
pub use world::TerrainWorld;
