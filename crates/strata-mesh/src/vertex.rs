//! GPU-ready terrain vertex format.

use glam::Vec3;

/// One terrain vertex, laid out for direct upload.
///
/// Layout (36 bytes total):
///   - `[0..12]`  position `[f32; 3]`, world space
///   - `[12..24]` normal `[f32; 3]`, world space, unit length
///   - `[24..32]` uv `[f32; 2]`, terrain-global in `[0, 1]`
///   - `[32..36]` layer_weights `[u8; 4]`, one per chunk palette slot,
///     summing to 255
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// World-space unit normal.
    pub normal: [f32; 3],
    /// Texture coordinates across the whole terrain.
    pub uv: [f32; 2],
    /// Blend weights for the chunk's layer palette.
    pub layer_weights: [u8; 4],
}

static_assertions::assert_eq_size!(TerrainVertex, [u8; 36]);

impl TerrainVertex {
    /// Assemble a vertex.
    pub fn new(position: Vec3, normal: Vec3, uv: [f32; 2], layer_weights: [u8; 4]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
            layer_weights,
        }
    }

    /// Position as a vector.
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Normal as a vector.
    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}
