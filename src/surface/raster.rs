//! Software surface backed by an `image::RgbaImage`.
//!
//! Used by the headless binary to render frames and write PNG snapshots.
//! Scaled copies of each image are cached so a strip at rest does not
//! resample every frame.

use std::f64::consts::TAU;
use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use lru::LruCache;
use tracing::trace;

use super::{ArcStroke, Capabilities, Color, Surface, TextStyle};
use crate::models::{DrawableHandle, ImageRef};

/// Scaled copies kept at once; the least recently drawn goes first.
const MAX_SCALED_ENTRIES: usize = 256;

pub struct RasterSurface {
    canvas: RgbaImage,
    background: Rgba<u8>,
    scaled: LruCache<(ImageRef, u32, u32), RgbaImage>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, Color::rgb(0xff, 0xff, 0xff))
    }

    pub fn with_background(width: u32, height: u32, background: Color) -> Self {
        let background = background.to_rgba();
        Self {
            canvas: RgbaImage::from_pixel(width, height, background),
            background,
            scaled: LruCache::new(
                NonZeroUsize::new(MAX_SCALED_ENTRIES).unwrap_or(NonZeroUsize::MIN),
            ),
        }
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.canvas
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write snapshot: {:?}", path))
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> (f64, f64) {
        (self.canvas.width() as f64, self.canvas.height() as f64)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            images: true,
            strokes: true,
            text: false,
        }
    }

    fn clear(&mut self) {
        let background = self.background;
        for pixel in self.canvas.pixels_mut() {
            *pixel = background;
        }
    }

    fn draw_image(&mut self, handle: &DrawableHandle, x: f64, y: f64, width: f64, height: f64) {
        let (w, h) = (width.round().max(1.0) as u32, height.round().max(1.0) as u32);
        let (x, y) = (x.round() as i64, y.round() as i64);
        if x >= self.canvas.width() as i64 || x + w as i64 <= 0 {
            return;
        }
        let Some(pixels) = handle.pixels.as_ref() else {
            return;
        };
        let key = (handle.reference.clone(), w, h);
        if self.scaled.get(&key).is_none() {
            trace!(reference = %handle.reference, w, h, "Scaling image for raster surface");
            let resized = imageops::resize(pixels.as_ref(), w, h, FilterType::Triangle);
            self.scaled.put(key.clone(), resized);
        }
        if let Some(scaled) = self.scaled.peek(&key) {
            imageops::overlay(&mut self.canvas, scaled, x, y);
        }
    }

    fn stroke_arc(&mut self, arc: &ArcStroke) {
        let sweep = arc.end - arc.start;
        if sweep <= 0.0 {
            return;
        }
        let half = arc.line_width / 2.0;
        let outer = arc.radius + half;
        let (cw, ch) = (self.canvas.width() as i64, self.canvas.height() as i64);
        let x0 = ((arc.cx - outer).floor() as i64).max(0);
        let x1 = ((arc.cx + outer).ceil() as i64).min(cw - 1);
        let y0 = ((arc.cy - outer).floor() as i64).max(0);
        let y1 = ((arc.cy + outer).ceil() as i64).min(ch - 1);
        let color = arc.color.to_rgba();

        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f64 + 0.5 - arc.cx;
                let dy = py as f64 + 0.5 - arc.cy;
                let dist = (dx * dx + dy * dy).sqrt();
                if (dist - arc.radius).abs() > half {
                    continue;
                }
                let rel = (dy.atan2(dx) - arc.start).rem_euclid(TAU);
                if sweep >= TAU || rel <= sweep {
                    self.canvas.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }

    fn fill_text(&mut self, _text: &str, _x: f64, _y: f64, _style: &TextStyle) {}
}
