//! Pixel geometry for viewport cropping
//!
//! A region is full-width by construction: platform viewports only ever trim
//! from the top (status bar) and bottom (frame height), never the sides.

/// Crop target in pixels: `height` x `width` starting `top_offset` below the
/// top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub width: f64,
    pub height: f64,
    pub top_offset: f64,
}

impl CropRegion {
    pub fn new(width: f64, height: f64, top_offset: f64) -> Self {
        Self {
            width,
            height,
            top_offset,
        }
    }

    /// Scale all dimensions by `factor`.
    ///
    /// iOS reports element bounds in points, so callers double them before
    /// cropping a retina capture. Android bounds are already pixels and are
    /// used as-is.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
            top_offset: self.top_offset * factor,
        }
    }

    /// Integer crop rectangle `(x, y, w, h)` clamped to image bounds
    pub(crate) fn clamped_to(&self, img_width: u32, img_height: u32) -> (u32, u32, u32, u32) {
        let y = (self.top_offset.max(0.0).round() as u32).min(img_height);
        let w = (self.width.max(0.0).round() as u32).min(img_width);
        let h = (self.height.max(0.0).round() as u32).min(img_height - y);
        (0, y, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retina_doubling() {
        let region = CropRegion::new(390.0, 800.0, 44.0).scaled(2.0);
        assert_eq!(region, CropRegion::new(780.0, 1600.0, 88.0));
    }

    #[test]
    fn test_clamped_to_image_bounds() {
        let region = CropRegion::new(2000.0, 3000.0, 100.0);
        assert_eq!(region.clamped_to(1080, 1920), (0, 100, 1080, 1820));
    }

    #[test]
    fn test_clamp_handles_offset_past_bottom() {
        let region = CropRegion::new(100.0, 100.0, 5000.0);
        let (_, y, _, h) = region.clamped_to(1080, 1920);
        assert_eq!(y, 1920);
        assert_eq!(h, 0);
    }
}
