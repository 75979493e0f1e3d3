//! Chunk geometry generation from a sample grid.

use glam::Vec3;
use strata_heightfield::{Alignment, BlendSample, SampleGrid};
use strata_lod::{ChunkKey, ChunkLayout, Edge, EdgeMask};

use crate::blend::LayerPalette;
use crate::stitching::{append_skirts, grid_index, snap_edge_to_coarser};
use crate::{ChunkMesh, TerrainVertex};

/// Everything that determines a chunk's geometry besides its key. A result
/// built for one signature is useless once the desired signature differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BuildSignature {
    /// LOD level the chunk is meshed at.
    pub lod: u8,
    /// Borders snapped to a coarser neighbour.
    pub coarser_edges: EdgeMask,
}

/// One chunk to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkBuildRequest {
    /// Chunk address.
    pub key: ChunkKey,
    /// Geometry variant.
    pub signature: BuildSignature,
}

/// Terrain-wide meshing parameters.
#[derive(Clone, Copy, Debug)]
pub struct MeshSettings {
    /// Quadtree geometry.
    pub layout: ChunkLayout,
    /// World plane of the terrain.
    pub alignment: Alignment,
    /// Skirt depth below every border; 0 disables skirts.
    pub skirt_depth: f32,
    /// Snap borders facing coarser neighbours.
    pub stitch_edges: bool,
    /// Layer palette limit per chunk.
    pub max_layers: usize,
}

/// Build the mesh for `request`. Pure: the same inputs always produce the
/// same mesh, on any thread.
pub fn generate_chunk(
    grid: &SampleGrid,
    settings: &MeshSettings,
    request: &ChunkBuildRequest,
) -> ChunkMesh {
    let layout = &settings.layout;
    let key = request.key;
    let res = layout.chunk_resolution() as usize;
    let side = res + 1;
    let stride = layout.stride(key.depth);
    let (col0, row0) = layout.origin_cells(key);
    let spacing = layout.cell_spacing();
    let extent = grid.world_size();

    let mut points = Vec::with_capacity(side * side + 4 * side);
    let mut normals = Vec::with_capacity(points.capacity());
    for j in 0..side {
        let z = ((row0 + j as u32 * stride) as f32 * spacing).min(extent);
        for i in 0..side {
            let x = ((col0 + i as u32 * stride) as f32 * spacing).min(extent);
            points.push(Vec3::new(x, grid.height_at(x, z), z));
            normals.push(grid.normal_at(x, z));
        }
    }

    if settings.stitch_edges {
        for edge in Edge::ALL {
            if request.signature.coarser_edges.contains(edge) {
                snap_edge_to_coarser(&mut points, &mut normals, res, edge);
            }
        }
    }

    let mut blend: Vec<BlendSample> = points
        .iter()
        .map(|p| grid.blend_weights_at(p.x, p.z))
        .collect();
    let palette = LayerPalette::build(&blend, settings.max_layers);
    if palette.failed_over() {
        tracing::warn!(
            chunk = %key,
            max_layers = settings.max_layers,
            layer = palette.layers()[0],
            "Chunk blends too many layers, falling back to dominant layer"
        );
    }

    let mut indices = surface_indices(res);
    if settings.skirt_depth > 0.0 {
        append_skirts(
            &mut points,
            &mut normals,
            &mut blend,
            &mut indices,
            res,
            settings.skirt_depth,
        );
    }
    if settings.alignment.flips_winding() {
        for tri in indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    let alignment = settings.alignment;
    let vertices = points
        .iter()
        .zip(&normals)
        .zip(&blend)
        .map(|((p, n), b)| {
            TerrainVertex::new(
                alignment.to_world(*p),
                alignment.to_world(*n),
                [p.x / extent, p.z / extent],
                palette.weights(b),
            )
        })
        .collect();

    ChunkMesh {
        key,
        lod: request.signature.lod,
        vertices,
        indices,
        layers: palette.layers().to_vec(),
        surface_vertex_count: side * side,
    }
}

/// Two counter-clockwise (seen from +Y) triangles per grid cell.
fn surface_indices(res: usize) -> Vec<u16> {
    let mut indices = Vec::with_capacity(res * res * 6);
    for j in 0..res {
        for i in 0..res {
            let a = grid_index(res, i, j) as u16;
            let b = grid_index(res, i + 1, j) as u16;
            let c = grid_index(res, i, j + 1) as u16;
            let d = grid_index(res, i + 1, j + 1) as u16;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }
    indices
}
