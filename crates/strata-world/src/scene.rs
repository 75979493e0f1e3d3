//! Boundary with the external scene graph and renderer.

use std::collections::BTreeMap;

use strata_heightfield::{Alignment, LayerInfo};
use strata_lod::ChunkKey;
use strata_mesh::ChunkMesh;

/// How the renderer rasterizes terrain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawMode {
    /// Filled triangles.
    #[default]
    Solid,
    /// Triangle edges only.
    Wireframe,
}

impl DrawMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            DrawMode::Solid => DrawMode::Wireframe,
            DrawMode::Wireframe => DrawMode::Solid,
        }
    }
}

/// What a scene learns about a terrain when it is registered.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainDescriptor {
    /// Side length of the terrain square in world units.
    pub world_size: f32,
    /// World plane of the terrain.
    pub alignment: Alignment,
    /// Every texture layer the terrain may reference.
    pub layers: Vec<LayerInfo>,
}

/// Per-chunk material: the layers behind the mesh's four weight slots.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainMaterial {
    /// Global layer index per weight slot.
    pub layer_indices: Vec<u32>,
    /// Layer descriptions per weight slot.
    pub layers: Vec<LayerInfo>,
    /// Whether the renderer should use its terrain shaders.
    pub shaders: bool,
}

/// Receiver of terrain geometry. The terrain never rasterizes anything
/// itself; it hands finished chunks to a sink and tells it when to drop
/// them.
pub trait SceneSink {
    /// Called once when the terrain is created.
    fn register_terrain(&mut self, descriptor: &TerrainDescriptor);

    /// Take ownership of a chunk's geometry and start drawing it.
    fn attach_chunk(&mut self, mesh: ChunkMesh, material: TerrainMaterial);

    /// Stop drawing the chunk with this key and release its geometry.
    fn detach_chunk(&mut self, key: ChunkKey);

    /// Switch between solid and wireframe rendering.
    fn set_draw_mode(&mut self, mode: DrawMode);

    /// Called once when the terrain is dropped, after every chunk has been
    /// detached.
    fn unregister_terrain(&mut self);
}

impl<T: SceneSink + ?Sized> SceneSink for &mut T {
    fn register_terrain(&mut self, descriptor: &TerrainDescriptor) {
        (**self).register_terrain(descriptor);
    }

    fn attach_chunk(&mut self, mesh: ChunkMesh, material: TerrainMaterial) {
        (**self).attach_chunk(mesh, material);
    }

    fn detach_chunk(&mut self, key: ChunkKey) {
        (**self).detach_chunk(key);
    }

    fn set_draw_mode(&mut self, mode: DrawMode) {
        (**self).set_draw_mode(mode);
    }

    fn unregister_terrain(&mut self) {
        (**self).unregister_terrain();
    }
}

/// In-memory scene that keeps every attached chunk, for headless runs and
/// tests.
#[derive(Debug, Default)]
pub struct RecordingScene {
    descriptor: Option<TerrainDescriptor>,
    chunks: BTreeMap<ChunkKey, (ChunkMesh, TerrainMaterial)>,
    draw_mode: DrawMode,
    attach_count: usize,
    detach_count: usize,
    unregistered: bool,
}

impl RecordingScene {
    /// Empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a terrain is currently registered.
    pub fn is_registered(&self) -> bool {
        self.descriptor.is_some()
    }

    /// Whether a terrain was registered and later unregistered.
    pub fn was_unregistered(&self) -> bool {
        self.unregistered
    }

    /// Descriptor of the registered terrain.
    pub fn descriptor(&self) -> Option<&TerrainDescriptor> {
        self.descriptor.as_ref()
    }

    /// Attached chunk keys in key order.
    pub fn chunk_keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.chunks.keys().copied()
    }

    /// Mesh and material of an attached chunk.
    pub fn chunk(&self, key: ChunkKey) -> Option<(&ChunkMesh, &TerrainMaterial)> {
        self.chunks.get(&key).map(|(mesh, material)| (mesh, material))
    }

    /// Attached chunks, one draw batch each.
    pub fn batch_count(&self) -> usize {
        self.chunks.len()
    }

    /// Triangles across all attached chunks.
    pub fn triangle_count(&self) -> usize {
        self.chunks.values().map(|(mesh, _)| mesh.triangle_count()).sum()
    }

    /// Current draw mode.
    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    /// Total attach calls received.
    pub fn attach_count(&self) -> usize {
        self.attach_count
    }

    /// Total detach calls received.
    pub fn detach_count(&self) -> usize {
        self.detach_count
    }

    /// First pair of attached chunks whose regions overlap, if any.
    pub fn find_overlap(&self) -> Option<(ChunkKey, ChunkKey)> {
        let keys: Vec<ChunkKey> = self.chunks.keys().copied().collect();
        for (i, &a) in keys.iter().enumerate() {
            for &b in &keys[i + 1..] {
                if a.overlaps(b) {
                    return Some((a, b));
                }
            }
        }
        None
    }
}

impl SceneSink for RecordingScene {
    fn register_terrain(&mut self, descriptor: &TerrainDescriptor) {
        self.descriptor = Some(descriptor.clone());
        self.unregistered = false;
    }

    fn attach_chunk(&mut self, mesh: ChunkMesh, material: TerrainMaterial) {
        self.attach_count += 1;
        if self.chunks.insert(mesh.key, (mesh, material)).is_some() {
            tracing::warn!("Chunk attached twice without a detach");
        }
    }

    fn detach_chunk(&mut self, key: ChunkKey) {
        self.detach_count += 1;
        if self.chunks.remove(&key).is_none() {
            tracing::warn!(%key, "Detach of a chunk that is not attached");
        }
    }

    fn set_draw_mode(&mut self, mode: DrawMode) {
        self.draw_mode = mode;
    }

    fn unregister_terrain(&mut self) {
        self.descriptor = None;
        self.unregistered = true;
    }
}
