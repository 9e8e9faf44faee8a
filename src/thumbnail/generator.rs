//! Thumbnail generation: decode, resize to fit, re-encode as JPEG
//!
//! This is a pure transform over bytes; the cache decides where the output
//! goes.

use image::{DynamicImage, codecs::jpeg::JpegEncoder, imageops::FilterType};

use super::{Quality, ThumbnailSpec};
use crate::errors::GenerationError;

/// Produces encoded thumbnail bytes from source image bytes
pub trait ThumbnailGenerator: Send + Sync {
    fn generate(&self, source: &[u8], spec: &ThumbnailSpec) -> Result<Vec<u8>, GenerationError>;
}

/// Lanczos3 fit-within-box resize followed by a JPEG encode
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegThumbnailer;

impl ThumbnailGenerator for JpegThumbnailer {
    fn generate(&self, source: &[u8], spec: &ThumbnailSpec) -> Result<Vec<u8>, GenerationError> {
        let image = image::load_from_memory(source)
            .map_err(|e| GenerationError::DecodeFailed(e.to_string()))?;

        let (width, height) = fit_dimensions(
            image.width(),
            image.height(),
            spec.max_width,
            spec.max_height,
        );
        let thumbnail = if (width, height) == (image.width(), image.height()) {
            image
        } else {
            image.resize_exact(width, height, FilterType::Lanczos3)
        };

        encode_jpeg(&thumbnail, spec.quality)
    }
}

/// Generate a thumbnail with an unchecked quality value, clamping it into
/// `[0, 100]` first
pub fn generate_thumbnail(
    source: &[u8],
    max_width: u32,
    max_height: u32,
    quality: i64,
) -> Result<Vec<u8>, GenerationError> {
    let spec = ThumbnailSpec::new(max_width, max_height, Quality::clamped(quality));
    JpegThumbnailer.generate(source, &spec)
}

/// Largest size with the source aspect ratio that fits inside the bounds.
///
/// Images that already fit are left alone, and a bound of 0 does not
/// constrain its axis.
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let scale_for = |size: u32, bound: u32| {
        if bound == 0 {
            f64::INFINITY
        } else {
            f64::from(bound) / f64::from(size)
        }
    };
    let scale = scale_for(width, max_width).min(scale_for(height, max_height));
    if scale >= 1.0 {
        return (width, height);
    }

    let scaled = |size: u32, bound: u32| {
        let value = (f64::from(size) * scale).round() as u32;
        let upper = if bound == 0 { size } else { bound };
        value.clamp(1, upper)
    };
    (scaled(width, max_width), scaled(height, max_height))
}

fn encode_jpeg(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, GenerationError> {
    // JPEG has no alpha channel
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    // the encoder's lowest setting is 1
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.value().max(1));
    encoder
        .encode_image(&rgb)
        .map_err(|e| GenerationError::EncodeFailed(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_fit_dimensions_preserves_aspect() {
        assert_eq!(fit_dimensions(400, 200, 100, 100), (100, 50));
        assert_eq!(fit_dimensions(200, 400, 100, 100), (50, 100));
        assert_eq!(fit_dimensions(1000, 1000, 300, 200), (200, 200));
    }

    #[test]
    fn test_fit_dimensions_never_upscales() {
        assert_eq!(fit_dimensions(80, 40, 100, 100), (80, 40));
        assert_eq!(fit_dimensions(100, 100, 100, 100), (100, 100));
    }

    #[test]
    fn test_fit_dimensions_zero_bounds() {
        assert_eq!(fit_dimensions(400, 200, 0, 100), (200, 100));
        assert_eq!(fit_dimensions(400, 200, 0, 50), (100, 50));
        assert_eq!(fit_dimensions(400, 200, 100, 0), (100, 50));
        assert_eq!(fit_dimensions(400, 200, 0, 0), (400, 200));
    }

    #[test]
    fn test_fit_dimensions_extreme_ratio_keeps_one_pixel() {
        assert_eq!(fit_dimensions(10_000, 10, 100, 100), (100, 1));
    }

    #[test]
    fn test_generate_bounds_and_format() {
        let output = generate_thumbnail(&png_bytes(400, 200), 100, 100, 80).unwrap();

        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&output).unwrap();
        assert!(decoded.width() <= 100);
        assert!(decoded.height() <= 50);
    }

    #[test]
    fn test_generate_flattens_alpha() {
        let rgba = RgbaImage::from_pixel(64, 64, image::Rgba([10, 20, 30, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let output = generate_thumbnail(&bytes, 32, 32, 90).unwrap();
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 32));
    }

    #[test]
    fn test_quality_out_of_range_is_clamped() {
        let source = png_bytes(120, 90);

        let below = generate_thumbnail(&source, 60, 60, -5).unwrap();
        let zero = generate_thumbnail(&source, 60, 60, 0).unwrap();
        assert_eq!(below, zero);

        let above = generate_thumbnail(&source, 60, 60, 150).unwrap();
        let hundred = generate_thumbnail(&source, 60, 60, 100).unwrap();
        assert_eq!(above, hundred);
    }

    #[test]
    fn test_corrupt_input_fails_to_decode() {
        let result = generate_thumbnail(b"definitely not an image", 100, 100, 75);
        assert!(matches!(result, Err(GenerationError::DecodeFailed(_))));
    }
}
