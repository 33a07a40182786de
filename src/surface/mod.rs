//! Drawing surfaces the scroller renders onto.
//!
//! The scroller never creates or resizes a surface; it only checks once at
//! mount that the primitives it needs are present and then issues draw calls
//! every frame.

pub mod raster;
pub mod recording;

pub use raster::RasterSurface;
pub use recording::{DrawCommand, RecordingSurface};

use crate::error::{Result, ScrollerError};
use crate::models::DrawableHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    /// Components scaled to `0.0..=1.0`.
    pub fn to_unit(self) -> (f64, f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
            self.a as f64 / 255.0,
        )
    }
}

/// Bold sans label style.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub color: Color,
    pub family: String,
}

impl TextStyle {
    pub fn new(size: f64, color: Color) -> Self {
        Self {
            size,
            color,
            family: "Trebuchet MS".to_string(),
        }
    }
}

/// A stroked circular arc. Angles are in radians, clockwise from +x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcStroke {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub start: f64,
    pub end: f64,
    pub line_width: f64,
    pub color: Color,
}

/// Drawing primitives a surface offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub images: bool,
    pub strokes: bool,
    pub text: bool,
}

impl Capabilities {
    pub const FULL: Capabilities = Capabilities {
        images: true,
        strokes: true,
        text: true,
    };

    /// Fails with `UnsupportedEnvironment` when a required primitive is absent.
    /// Text is optional; without it the status line is skipped.
    pub fn check(&self) -> Result<()> {
        if !self.images {
            return Err(ScrollerError::UnsupportedEnvironment { missing: "image drawing" });
        }
        if !self.strokes {
            return Err(ScrollerError::UnsupportedEnvironment { missing: "arc stroking" });
        }
        Ok(())
    }
}

/// A fixed-size 2-D drawing target.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (f64, f64);

    fn capabilities(&self) -> Capabilities;

    fn clear(&mut self);

    fn draw_image(&mut self, handle: &DrawableHandle, x: f64, y: f64, width: f64, height: f64);

    fn stroke_arc(&mut self, arc: &ArcStroke);

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle);

    /// Advance width of `text`; used to right-align the status label.
    fn measure_text(&self, text: &str, style: &TextStyle) -> f64 {
        text.chars().count() as f64 * style.size * 0.6
    }
}
