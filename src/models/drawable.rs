use std::sync::Arc;

use image::RgbaImage;

use super::ImageRef;

/// A loaded image, ready to be placed on the strip.
#[derive(Debug, Clone)]
pub struct DrawableHandle {
    pub reference: ImageRef,
    pub natural_width: u32,
    pub natural_height: u32,
    /// Decoded pixels. Absent for handles that only carry dimensions.
    pub pixels: Option<Arc<RgbaImage>>,
}

impl DrawableHandle {
    pub fn new(reference: ImageRef, pixels: RgbaImage) -> Self {
        let (natural_width, natural_height) = pixels.dimensions();
        Self {
            reference,
            natural_width,
            natural_height,
            pixels: Some(Arc::new(pixels)),
        }
    }

    /// A handle that has dimensions but nothing to draw.
    pub fn dimensions_only(reference: ImageRef, natural_width: u32, natural_height: u32) -> Self {
        Self {
            reference,
            natural_width,
            natural_height,
            pixels: None,
        }
    }

    /// Width after scaling the image to `strip_height`, preserving aspect ratio.
    pub fn scaled_width(&self, strip_height: f64) -> f64 {
        if self.natural_height == 0 {
            return strip_height;
        }
        self.natural_width as f64 * (strip_height / self.natural_height as f64)
    }
}
