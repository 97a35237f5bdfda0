//! Perceptual image comparison
//!
//! Counts pixels whose color differs beyond a small per-channel tolerance and
//! reports the share as a percentage in [0, 100]. The tolerance absorbs
//! rendering noise (anti-aliasing, color-profile drift) that a strict
//! equality check would flag on every capture.

use crate::error::{Error, Result};
use image::{DynamicImage, GenericImageView};
use std::path::Path;

/// Per-channel difference below which two pixels count as the same
const CHANNEL_TOLERANCE: u8 = 16;

/// Verdict of a candidate-vs-reference comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonResult {
    /// Share of differing pixels, 0..=100
    pub mismatch_percent: f64,
    /// `mismatch_percent <= threshold`
    pub passed: bool,
}

/// Build a verdict from a measured mismatch and an allowed threshold
pub fn verdict(mismatch_percent: f64, threshold: f64) -> ComparisonResult {
    ComparisonResult {
        mismatch_percent,
        passed: mismatch_percent <= threshold,
    }
}

/// Mismatch percentage between two same-sized images
pub fn mismatch_percent(a: &DynamicImage, b: &DynamicImage) -> Result<f64> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::DimensionMismatch {
            candidate_dims: a.dimensions(),
            reference_dims: b.dimensions(),
        });
    }

    let a = a.to_rgba8();
    let b = b.to_rgba8();
    let total = (a.width() as u64) * (a.height() as u64);
    if total == 0 {
        return Ok(0.0);
    }

    let differing = a
        .pixels()
        .zip(b.pixels())
        .filter(|(pa, pb)| {
            pa.0.iter()
                .zip(pb.0.iter())
                .any(|(ca, cb)| ca.abs_diff(*cb) > CHANNEL_TOLERANCE)
        })
        .count() as u64;

    Ok((differing as f64 / total as f64) * 100.0)
}

/// Mismatch percentage between two image files
pub fn compare_files(candidate: &Path, reference: &Path) -> Result<f64> {
    let a = image::open(candidate)?;
    let b = image::open(reference)?;
    mismatch_percent(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    #[test]
    fn test_identical_images_have_zero_mismatch() {
        let img = solid(4, 4, [120, 10, 200, 255]);
        let mismatch = mismatch_percent(&img, &img.clone()).unwrap();
        assert_eq!(mismatch, 0.0);
        assert!(verdict(mismatch, 0.0).passed);
    }

    #[test]
    fn test_small_channel_noise_is_tolerated() {
        let a = solid(4, 4, [100, 100, 100, 255]);
        let b = solid(4, 4, [100 + CHANNEL_TOLERANCE, 100, 100, 255]);
        assert_eq!(mismatch_percent(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_quarter_of_pixels_differing() {
        let a = solid(2, 2, [0, 0, 0, 255]);
        let mut raw = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        raw.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        let b = DynamicImage::ImageRgba8(raw);

        let mismatch = mismatch_percent(&a, &b).unwrap();
        assert_eq!(mismatch, 25.0);
        assert!(!verdict(mismatch, 20.0).passed);
        assert!(verdict(mismatch, 25.0).passed);
    }

    #[test]
    fn test_verdict_thresholds() {
        assert!(verdict(0.15, 0.2).passed);
        assert!(!verdict(0.35, 0.2).passed);
        // boundary is inclusive
        assert!(verdict(0.2, 0.2).passed);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let a = solid(2, 2, [0, 0, 0, 255]);
        let b = solid(3, 2, [0, 0, 0, 255]);
        let err = mismatch_percent(&a, &b).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }
}
