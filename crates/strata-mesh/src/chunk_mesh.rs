//! Chunk mesh data structure handed to the scene.

use strata_lod::ChunkKey;

use crate::TerrainVertex;

/// Geometry for one chunk: a `(R+1)^2` surface grid followed by skirt
/// vertices, indexed as a triangle list.
#[derive(Clone, Debug)]
pub struct ChunkMesh {
    /// Chunk this mesh was built for.
    pub key: ChunkKey,
    /// LOD level of the surface grid.
    pub lod: u8,
    /// Vertex buffer; the first `surface_vertex_count` entries form the grid.
    pub vertices: Vec<TerrainVertex>,
    /// Index buffer (triangles, 3 indices per triangle).
    pub indices: Vec<u16>,
    /// Global layer indices for each palette slot in `layer_weights`.
    pub layers: Vec<u32>,
    /// Number of grid vertices before the skirt vertices.
    pub surface_vertex_count: usize,
}

impl ChunkMesh {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Vertex buffer as raw bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
