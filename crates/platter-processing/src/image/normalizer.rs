//! Image normalizer - bound dimensions and re-encode to the canonical codec
//!
//! Every raster upload leaves here as lossy WebP fitting inside an 800x800 box. Inputs
//! already inside the box keep their dimensions.

use crate::error::ProcessingError;
use bytes::Bytes;
use image::imageops::FilterType;
use image::{GenericImageView, ImageReader};
use platter_core::constants::{
    IMAGE_CONTENT_TYPE, IMAGE_EXTENSION, IMAGE_MAX_DIMENSION, IMAGE_QUALITY,
};
use std::io::Cursor;

/// Output of [`ImageNormalizer::normalize`]
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
    pub extension: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    max_dimension: u32,
    quality: f32,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(IMAGE_MAX_DIMENSION, IMAGE_QUALITY)
    }
}

impl ImageNormalizer {
    pub fn new(max_dimension: u32, quality: f32) -> Self {
        Self {
            max_dimension,
            quality: quality.clamp(0.0, 100.0),
        }
    }

    /// Decode, bound and re-encode. CPU bound; use [`normalize_bytes`](Self::normalize_bytes)
    /// from async code.
    pub fn normalize(&self, data: &[u8]) -> Result<NormalizedImage, ProcessingError> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?;

        let (original_width, original_height) = img.dimensions();

        // resize() keeps aspect ratio within the box; only shrink
        let img = if original_width > self.max_dimension || original_height > self.max_dimension
        {
            img.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
        } else {
            img
        };

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(ProcessingError::Encode(format!(
                "degenerate image dimensions {}x{}",
                width, height
            )));
        }

        let rgba_img = img.to_rgba8();
        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder.encode(self.quality);

        tracing::debug!(
            original_width,
            original_height,
            width,
            height,
            input_bytes = data.len(),
            output_bytes = webp_data.len(),
            "Image normalized"
        );

        Ok(NormalizedImage {
            data: Bytes::copy_from_slice(&webp_data),
            width,
            height,
            content_type: IMAGE_CONTENT_TYPE,
            extension: IMAGE_EXTENSION,
        })
    }

    /// Run [`normalize`](Self::normalize) on the blocking pool.
    pub async fn normalize_bytes(&self, data: Bytes) -> Result<NormalizedImage, ProcessingError> {
        let normalizer = *self;
        tokio::task::spawn_blocking(move || normalizer.normalize(&data))
            .await
            .map_err(|e| ProcessingError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn decoded_dimensions(data: &[u8]) -> (u32, u32) {
        image::load_from_memory_with_format(data, ImageFormat::WebP)
            .unwrap()
            .dimensions()
    }

    #[test]
    fn test_large_image_fits_box_preserving_aspect() {
        let out = ImageNormalizer::default().normalize(&png(2000, 1500)).unwrap();
        assert_eq!((out.width, out.height), (800, 600));
        assert_eq!(decoded_dimensions(&out.data), (800, 600));
        assert_eq!(out.content_type, "image/webp");
        assert_eq!(out.extension, "webp");
    }

    #[test]
    fn test_portrait_image_bounded_by_height() {
        let out = ImageNormalizer::default().normalize(&png(900, 1800)).unwrap();
        assert_eq!((out.width, out.height), (400, 800));
    }

    #[test]
    fn test_small_image_never_upscaled() {
        let out = ImageNormalizer::default().normalize(&png(120, 90)).unwrap();
        assert_eq!((out.width, out.height), (120, 90));
        assert_eq!(decoded_dimensions(&out.data), (120, 90));
    }

    #[test]
    fn test_undecodable_input_is_error() {
        let err = ImageNormalizer::default()
            .normalize(b"definitely not an image")
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Decode(_)));
    }

    #[tokio::test]
    async fn test_normalize_bytes_on_blocking_pool() {
        let out = ImageNormalizer::default()
            .normalize_bytes(Bytes::from(png(1000, 1000)))
            .await
            .unwrap();
        assert_eq!((out.width, out.height), (800, 800));
    }
}
