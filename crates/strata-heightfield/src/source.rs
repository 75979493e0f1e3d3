//! The pluggable heightfield data provider interface.

use crate::{HeightfieldError, LayerInfo};

/// Supplies raw elevation samples and per-cell texture-layer indices for a
/// bounded square domain.
///
/// Implementors know nothing about rendering. Both load methods are called
/// exactly once, when a [`SampleGrid`](crate::SampleGrid) is built, and write
/// row-major data (`index = row * side + col`) into buffers the caller has
/// already sized from [`heightmap_size`](Self::heightmap_size) and
/// [`blendmap_size`](Self::blendmap_size).
pub trait HeightfieldSource {
    /// Side length `N` of the elevation grid.
    fn heightmap_size(&self) -> usize;

    /// Side length `M` of the layer-index grid. May differ from `N`.
    fn blendmap_size(&self) -> usize;

    /// World-space extent of the domain; expected to equal
    /// `heightmap_size() * cell_spacing`.
    fn world_size(&self) -> f32;

    /// Fill the `N*N` elevation buffer.
    fn load_heightmap(&self, heights: &mut [f32]) -> Result<(), HeightfieldError>;

    /// Append the ordered layer list to `layers` and fill the `M*M` buffer of
    /// dominant-layer indices.
    fn load_blendmap(
        &self,
        layers: &mut Vec<LayerInfo>,
        layer_indices: &mut [u32],
    ) -> Result<(), HeightfieldError>;
}

impl<S: HeightfieldSource + ?Sized> HeightfieldSource for Box<S> {
    fn heightmap_size(&self) -> usize {
        (**self).heightmap_size()
    }

    fn blendmap_size(&self) -> usize {
        (**self).blendmap_size()
    }

    fn world_size(&self) -> f32 {
        (**self).world_size()
    }

    fn load_heightmap(&self, heights: &mut [f32]) -> Result<(), HeightfieldError> {
        (**self).load_heightmap(heights)
    }

    fn load_blendmap(
        &self,
        layers: &mut Vec<LayerInfo>,
        layer_indices: &mut [u32],
    ) -> Result<(), HeightfieldError> {
        (**self).load_blendmap(layers, layer_indices)
    }
}

/// Check that a row-major buffer holds exactly `side * side` entries.
pub fn check_square_buffer(map: &str, side: usize, len: usize) -> Result<(), HeightfieldError> {
    let expected = side * side;
    if len != expected {
        return Err(HeightfieldError::SizeMismatch {
            map: map.to_string(),
            side,
            expected,
            actual: len,
        });
    }
    Ok(())
}
