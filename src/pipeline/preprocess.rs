//! Image normalisation: clean up a scanned image before extraction.
//!
//! Scans arrive skewed in tone — uneven lighting, sensor noise, low
//! contrast — and all of it costs OCR accuracy. The normaliser is a pure
//! image→image function: grayscale, a small median-filter denoise, then
//! histogram equalisation for contrast, with a longest-edge pixel cap so a
//! 12 000 px flatbed scan never exhausts memory or the API upload limit.
//!
//! ## Why spawn_blocking?
//!
//! Filtering and equalisation are CPU-bound over every pixel.
//! `tokio::task::spawn_blocking` keeps that work off the async worker
//! threads, the same treatment the network-facing stages expect.
//!
//! ## Why CatmullRom for the downscale?
//!
//! Lanczos3 is sharper but rings around high-contrast edges — exactly what
//! glyph outlines are. CatmullRom downscales text without ringing.

use crate::config::ConversionConfig;
use crate::error::ImgToDocxError;
use image::imageops::FilterType;
use image::DynamicImage;
use imageproc::contrast::equalize_histogram;
use imageproc::filter::median_filter;
use std::path::Path;
use tracing::debug;

/// Load and normalise the image at `path` according to `config`.
///
/// With `config.preprocess == false` the image is only decoded and
/// dimension-capped; tone is left untouched.
pub async fn load_and_normalize(
    path: &Path,
    config: &ConversionConfig,
) -> Result<DynamicImage, ImgToDocxError> {
    let path = path.to_path_buf();
    let preprocess = config.preprocess;
    let max_pixels = config.max_image_pixels;

    tokio::task::spawn_blocking(move || {
        let img = image::open(&path).map_err(|e| ImgToDocxError::DecodeFailed {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        debug!("Decoded {}: {}x{} px", path.display(), img.width(), img.height());

        let img = if preprocess {
            normalize_image(&img)
        } else {
            img
        };
        Ok(cap_dimensions(img, max_pixels))
    })
    .await
    .map_err(|e| ImgToDocxError::Internal(format!("Preprocess task panicked: {}", e)))?
}

/// Grayscale → 3×3 median denoise → histogram equalisation.
///
/// Pure and deterministic; exposed for direct testing.
pub fn normalize_image(img: &DynamicImage) -> DynamicImage {
    let gray = img.to_luma8();
    let denoised = median_filter(&gray, 1, 1);
    let equalized = equalize_histogram(&denoised);
    DynamicImage::ImageLuma8(equalized)
}

/// Scale the image down so neither edge exceeds `max_pixels`, preserving
/// aspect ratio. Images already within the cap pass through untouched.
pub fn cap_dimensions(img: DynamicImage, max_pixels: u32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w <= max_pixels && h <= max_pixels {
        return img;
    }
    let resized = img.resize(max_pixels, max_pixels, FilterType::CatmullRom);
    debug!(
        "Capped image {}x{} -> {}x{}",
        w,
        h,
        resized.width(),
        resized.height()
    );
    resized
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn test_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |x, y| {
            let v = ((x + y) % 256) as u8;
            Rgba([v, v / 2, 255 - v, 255])
        }))
    }

    #[test]
    fn normalize_preserves_dimensions() {
        let img = test_image(64, 48);
        let out = normalize_image(&img);
        assert_eq!((out.width(), out.height()), (64, 48));
    }

    #[test]
    fn normalize_outputs_grayscale() {
        let out = normalize_image(&test_image(16, 16));
        assert!(matches!(out, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn normalize_is_deterministic() {
        let img = test_image(32, 32);
        assert_eq!(
            normalize_image(&img).to_luma8().as_raw(),
            normalize_image(&img).to_luma8().as_raw()
        );
    }

    #[test]
    fn small_image_is_not_resized() {
        let out = cap_dimensions(test_image(100, 80), 2000);
        assert_eq!((out.width(), out.height()), (100, 80));
    }

    #[test]
    fn oversized_image_is_capped_with_aspect_kept() {
        let out = cap_dimensions(test_image(4000, 2000), 1000);
        assert_eq!(out.width(), 1000);
        assert_eq!(out.height(), 500);
    }
}
