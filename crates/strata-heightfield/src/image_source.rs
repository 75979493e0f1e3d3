//! Heightfield source backed by a grayscale image file.

use std::path::{Path, PathBuf};

use crate::source::check_square_buffer;
use crate::synthetic::{DESERT_TEXTURES, desert_layers};
use crate::{HeightfieldError, HeightfieldSource, LayerInfo};

/// A square grayscale image decoded into elevations.
///
/// Pixel `(x, y)` becomes sample `(row = y, col = x)`; luminance is mapped
/// linearly from `[0, 1]` to `[0, height_scale]`. Layers are assigned by
/// elevation band on the same grid.
#[derive(Debug)]
pub struct ImageSource {
    path: PathBuf,
    side: usize,
    /// Normalised luminance, row-major.
    luminance: Vec<f32>,
    cell_spacing: f32,
    height_scale: f32,
}

impl ImageSource {
    /// Decode `path`. 8-bit and 16-bit images are both read at 16-bit
    /// precision; colour images are converted to luminance.
    pub fn open(
        path: impl AsRef<Path>,
        cell_spacing: f32,
        height_scale: f32,
    ) -> Result<Self, HeightfieldError> {
        let path = path.as_ref().to_path_buf();
        std::fs::metadata(&path).map_err(|source| HeightfieldError::Io {
            path: path.clone(),
            source,
        })?;

        let image = image::open(&path)
            .map_err(|source| HeightfieldError::Image {
                path: path.clone(),
                source,
            })?
            .into_luma16();

        let (width, height) = image.dimensions();
        if width != height {
            return Err(HeightfieldError::NonSquare {
                path,
                width,
                height,
            });
        }

        let luminance = image
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / u16::MAX as f32)
            .collect();

        tracing::info!(path = %path.display(), side = width, "Loaded heightmap image");
        Ok(Self {
            path,
            side: width as usize,
            luminance,
            cell_spacing,
            height_scale,
        })
    }

    /// The decoded file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn band_layer(luminance: f32) -> u32 {
        let count = DESERT_TEXTURES.len() as u32;
        ((luminance * count as f32) as u32).min(count - 1)
    }
}

impl HeightfieldSource for ImageSource {
    fn heightmap_size(&self) -> usize {
        self.side
    }

    fn blendmap_size(&self) -> usize {
        self.side
    }

    fn world_size(&self) -> f32 {
        self.side as f32 * self.cell_spacing
    }

    fn load_heightmap(&self, heights: &mut [f32]) -> Result<(), HeightfieldError> {
        check_square_buffer(&self.path.display().to_string(), self.side, heights.len())?;
        for (h, l) in heights.iter_mut().zip(&self.luminance) {
            *h = l * self.height_scale;
        }
        Ok(())
    }

    fn load_blendmap(
        &self,
        layers: &mut Vec<LayerInfo>,
        layer_indices: &mut [u32],
    ) -> Result<(), HeightfieldError> {
        check_square_buffer("blendmap", self.side, layer_indices.len())?;
        layers.extend(desert_layers());
        for (index, l) in layer_indices.iter_mut().zip(&self.luminance) {
            *index = Self::band_layer(*l);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SampleGrid;

    fn write_gray(path: &Path, width: u32, height: u32, f: impl Fn(u32, u32) -> u8) {
        image::GrayImage::from_fn(width, height, |x, y| image::Luma([f(x, y)]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_open_png_maps_luminance_to_height() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("height.png");
        write_gray(&path, 4, 4, |x, _| if x == 3 { 255 } else { 0 });

        let source = ImageSource::open(&path, 2.0, 100.0).unwrap();
        assert_eq!(source.heightmap_size(), 4);
        assert_eq!(source.world_size(), 8.0);

        let grid = SampleGrid::from_source(&source, 2.0).unwrap();
        assert!((grid.height_at(6.0, 0.0) - 100.0).abs() < 1e-3);
        assert!(grid.height_at(0.0, 6.0).abs() < 1e-3);
        assert_eq!(grid.layer_at(7.0, 0.0), DESERT_TEXTURES.len() as u32 - 1);
        assert_eq!(grid.layer_at(0.0, 0.0), 0);
    }

    #[test]
    fn test_non_square_image_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        write_gray(&path, 8, 4, |_, _| 0);

        assert!(matches!(
            ImageSource::open(&path, 1.0, 1.0),
            Err(HeightfieldError::NonSquare {
                width: 8,
                height: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageSource::open(dir.path().join("nope.png"), 1.0, 1.0),
            Err(HeightfieldError::Io { .. })
        ));
    }

    #[test]
    fn test_garbage_file_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            ImageSource::open(&path, 1.0, 1.0),
            Err(HeightfieldError::Image { .. })
        ));
    }
}
