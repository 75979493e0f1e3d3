//! Errors raised while ingesting heightfield data.

use std::path::PathBuf;

/// A heightfield source supplied data the terrain cannot be built from.
///
/// All variants are construction-time failures; once a
/// [`SampleGrid`](crate::SampleGrid) exists, queries never fail.
#[derive(Debug, thiserror::Error)]
pub enum HeightfieldError {
    /// The heightmap needs at least two samples per side to form a cell.
    #[error("heightmap size {0} is too small (need at least 2)")]
    HeightmapTooSmall(usize),

    /// The blendmap needs at least one cell.
    #[error("blendmap size must be non-zero")]
    EmptyBlendmap,

    /// A load call received or produced a buffer of the wrong length, which
    /// happens when a source's declared size disagrees with its data.
    #[error("{map} buffer holds {actual} samples, expected {expected} ({side}x{side})")]
    SizeMismatch {
        /// `"heightmap"`, `"blendmap"` or an image path.
        map: String,
        /// Declared side length.
        side: usize,
        /// `side * side`.
        expected: usize,
        /// What was actually supplied.
        actual: usize,
    },

    /// Image data that is not square.
    #[error("image {path} is {width}x{height}; terrain images must be square")]
    NonSquare {
        /// Offending file.
        path: PathBuf,
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// The blendmap declared no texture layers.
    #[error("blendmap declares zero texture layers")]
    NoLayers,

    /// A blend cell referenced a layer that does not exist.
    #[error("blend cell {cell} references layer {index}, but only {layer_count} layers exist")]
    LayerIndexOutOfRange {
        /// Row-major cell index.
        cell: usize,
        /// Referenced layer.
        index: u32,
        /// Number of declared layers.
        layer_count: usize,
    },

    /// Spacing between samples must be a positive, finite number.
    #[error("cell spacing {0} must be positive and finite")]
    InvalidCellSpacing(f32),

    /// The source's world size does not equal `heightmap_size * cell_spacing`.
    #[error("world size {world_size} does not match {heightmap_size} samples x {cell_spacing} spacing")]
    WorldSizeMismatch {
        /// Reported by the source.
        world_size: f32,
        /// Reported by the source.
        heightmap_size: usize,
        /// Requested by the caller.
        cell_spacing: f32,
    },

    /// A sample was NaN or infinite.
    #[error("heightmap sample {index} is not finite ({value})")]
    NonFiniteSample {
        /// Row-major sample index.
        index: usize,
        /// The bad value.
        value: f32,
    },

    /// Reading a file-backed source failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Decoding an image-backed source failed.
    #[error("failed to decode {path}: {source}")]
    Image {
        /// File being decoded.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: image::ImageError,
    },
}
