//! Heightfield ingestion and sampling: the pluggable data source interface,
//! the immutable sample grid, and the bundled procedural and image sources.

mod alignment;
mod error;
mod grid;
mod image_source;
mod layer;
mod noise_source;
mod source;
mod synthetic;

pub use alignment::Alignment;
pub use error::HeightfieldError;
pub use grid::{BlendSample, SampleGrid};
pub use image_source::ImageSource;
pub use layer::LayerInfo;
pub use noise_source::{FbmParams, NoiseSource};
pub use source::{HeightfieldSource, check_square_buffer};
pub use synthetic::{DESERT_TEXTURES, FlatSource, SinusoidSource, desert_layers, random_blendmap};
