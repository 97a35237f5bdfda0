//! Screenshot persistence and the crop-then-diff pipeline
//!
//! Reference images live under a `Screen_Shots` directory beside the artifact
//! under test. A comparison run writes the fresh capture to a `_Test` sibling
//! of the reference, crops it, diffs it, and deletes it only on pass - a
//! failing candidate stays on disk for inspection.

use crate::error::{Error, Result};
use crate::visual::compare::{self, ComparisonResult};
use crate::visual::region::CropRegion;
use base64::Engine;
use image::GenericImageView;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name reference images are stored under
pub const SCREENSHOTS_DIR: &str = "Screen_Shots";

/// Suffix appended to a reference's stem for its candidate sibling
const CANDIDATE_SUFFIX: &str = "_Test";

/// `<base>/Screen_Shots`
pub fn screenshots_dir(base: &Path) -> PathBuf {
    base.join(SCREENSHOTS_DIR)
}

/// `<base>/Screen_Shots/<name>.png`
pub fn reference_path(base: &Path, name: &str) -> PathBuf {
    screenshots_dir(base).join(format!("{}.png", name))
}

/// Candidate sibling of a reference: `<stem>_Test<ext>` in the same directory
pub fn candidate_path(reference: &Path) -> PathBuf {
    let stem = reference
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = reference
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    reference.with_file_name(format!("{}{}{}", stem, CANDIDATE_SUFFIX, ext))
}

/// Decode base64 PNG bytes and persist them, creating parent directories
pub fn write_png_base64(path: &Path, png_base64: &str) -> Result<()> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(png_base64.trim())
        .map_err(|e| Error::InvalidArgument(format!("screenshot payload is not base64: {}", e)))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// Crop an image file in place to `region`.
///
/// An absent region is a no-op and the file is left untouched: callers pass
/// `None` when no identifiable viewport frame exists and the full capture is
/// the comparison surface.
pub fn crop_in_place(path: &Path, region: Option<&CropRegion>) -> Result<()> {
    let region = match region {
        Some(r) => r,
        None => return Ok(()),
    };

    let img = image::open(path)?;
    let (img_width, img_height) = img.dimensions();
    let (x, y, w, h) = region.clamped_to(img_width, img_height);
    let cropped = img.crop_imm(x, y, w, h);
    cropped.save(path)?;
    Ok(())
}

/// Run the full pipeline for one captured screenshot.
///
/// `overwrite=true` establishes a new baseline: the capture is written to the
/// reference path itself and cropped; no comparison happens and the result is
/// a trivially passing verdict. `overwrite=false` writes and crops a
/// candidate, compares it to the existing reference, deletes the candidate on
/// pass, and fails with [`Error::MismatchExceeded`] (candidate retained) when
/// the mismatch exceeds `threshold` percent.
pub fn process_screenshot(
    reference: &Path,
    png_base64: &str,
    region: Option<&CropRegion>,
    overwrite: bool,
    threshold: f64,
) -> Result<ComparisonResult> {
    if threshold < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "mismatch threshold must be >= 0, got {}",
            threshold
        )));
    }

    if overwrite {
        write_png_base64(reference, png_base64)?;
        crop_in_place(reference, region)?;
        return Ok(compare::verdict(0.0, threshold));
    }

    if !reference.exists() {
        return Err(Error::InvalidArgument(format!(
            "reference image {} does not exist; run in overwrite mode to create a baseline",
            reference.display()
        )));
    }

    let candidate = candidate_path(reference);
    write_png_base64(&candidate, png_base64)?;
    crop_in_place(&candidate, region)?;

    let mismatch = compare::compare_files(&candidate, reference)?;
    let result = compare::verdict(mismatch, threshold);

    if result.passed {
        fs::remove_file(&candidate)?;
        Ok(result)
    } else {
        Err(Error::MismatchExceeded {
            allowed: threshold,
            actual: (mismatch * 100.0).round() / 100.0,
            candidate,
        })
    }
}
