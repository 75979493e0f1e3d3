//! Terrain chunk meshing: vertex format, geometry generation with skirts and
//! LOD stitching, per-chunk layer palettes, and build scheduling.

mod blend;
mod chunk_mesh;
mod generate;
mod pipeline;
mod stitching;
mod vertex;

pub use blend::{LayerPalette, MAX_LAYERS_PER_CHUNK, quantize_weights};
pub use chunk_mesh::ChunkMesh;
pub use generate::{BuildSignature, ChunkBuildRequest, MeshSettings, generate_chunk};
pub use pipeline::{BuildPipeline, BuildResult, ChunkBuilder, InlineBuilder, default_worker_count};
pub use stitching::{append_skirts, edge_points, grid_index, snap_edge_to_coarser};
pub use vertex::TerrainVertex;
