//! Image loading and normalization

use crate::{Error, Result};
use image::{DynamicImage, GenericImageView, ImageReader, RgbaImage};
use std::path::Path;
use tracing::debug;

/// Decoded image in RGBA format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// RGBA pixel data
    pub data: Vec<u8>,
}

impl LoadedImage {
    /// Load an image from a file path
    ///
    /// The format is guessed from the file contents, not the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let decode_error = |message: String| Error::ImageDecode {
            path: path.to_path_buf(),
            message,
        };

        let img = ImageReader::open(path)
            .map_err(|e| decode_error(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| decode_error(e.to_string()))?
            .decode()
            .map_err(|e| decode_error(e.to_string()))?;

        Ok(Self::from_dynamic_image(img))
    }

    /// Create from a DynamicImage
    pub fn from_dynamic_image(img: DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        let data = img.to_rgba8().into_raw();

        Self {
            width,
            height,
            data,
        }
    }

    /// Copy the pixels into an [`RgbaImage`]
    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            Error::InvalidInput(format!(
                "Pixel buffer of {} bytes does not match {}x{}",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }

    /// Resize to exactly the given dimensions with Lanczos3
    ///
    /// The aspect ratio is not preserved.
    pub fn resize(&self, target_width: u32, target_height: u32) -> Result<Self> {
        if self.width == target_width && self.height == target_height {
            return Ok(self.clone());
        }

        let dynamic = DynamicImage::ImageRgba8(self.to_rgba_image()?);
        let resized = dynamic.resize_exact(
            target_width,
            target_height,
            image::imageops::FilterType::Lanczos3,
        );

        Ok(Self::from_dynamic_image(resized))
    }
}

/// Load images in order and resize every one to `width`x`height`
///
/// The first unreadable image aborts the whole operation.
pub fn normalize<P: AsRef<Path>>(paths: &[P], width: u32, height: u32) -> Result<Vec<LoadedImage>> {
    if paths.is_empty() {
        return Err(Error::InvalidInput("No images provided".to_string()));
    }

    paths
        .iter()
        .map(|path| {
            let img = LoadedImage::from_path(path)?;
            debug!(
                path = %path.as_ref().display(),
                width = img.width,
                height = img.height,
                "decoded image"
            );
            img.resize(width, height)
        })
        .collect()
}
