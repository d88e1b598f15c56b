//! Glyph rendering backends.

use std::path::Path;

use fontdue::{Font, FontSettings};
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::{MosaicError, Result};

/// Measured size of rendered text, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphSize {
    pub width: f32,
    pub height: f32,
}

impl GlyphSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width : height of one glyph cell.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Integer pixel size of a buffer holding one glyph.
    pub fn cell_pixels(&self) -> (u32, u32) {
        (self.width.ceil().max(0.0) as u32, self.height.ceil().max(0.0) as u32)
    }
}

/// Draws text for signature building.
///
/// Implementations draw light text on a dark background, anti-aliased, with the
/// baseline at the font ascent and the pen starting at x = 0.
pub trait GlyphRenderer: Sync {
    /// Whether every glyph advances by the same width.
    fn is_fixed_pitch(&self) -> bool;

    /// Advance width and line height of `text`.
    fn measure(&self, text: &str) -> GlyphSize;

    /// Draw `text` into a fresh `width × height` buffer.
    fn render(&self, text: &str, width: u32, height: u32) -> GrayImage;
}

/// [`GlyphRenderer`] backed by a TrueType/OpenType font loaded with fontdue.
pub struct FontdueRenderer {
    font: Font,
    px: f32,
    ascent: f32,
    descent: f32,
}

impl FontdueRenderer {
    pub fn from_bytes(data: Vec<u8>, px: f32) -> Result<Self> {
        if !(px.is_finite() && px > 0.0) {
            return Err(MosaicError::InvalidFont(format!("font size must be positive, got {px}")));
        }
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| MosaicError::InvalidFont(e.to_string()))?;
        let (ascent, descent) = font
            .horizontal_line_metrics(px)
            .map(|m| (m.ascent, m.descent))
            .ok_or_else(|| MosaicError::InvalidFont("font has no horizontal line metrics".into()))?;

        log::debug!(
            "loaded font {} at {px}px (ascent {ascent}, descent {descent})",
            font.name().unwrap_or("<unnamed>")
        );
        Ok(Self { font, px, ascent, descent })
    }

    pub fn from_file(path: impl AsRef<Path>, px: f32) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data, px)
    }

    pub fn size(&self) -> f32 {
        self.px
    }
}

impl GlyphRenderer for FontdueRenderer {
    fn is_fixed_pitch(&self) -> bool {
        let mut advances = ('!'..='~')
            .filter(|&c| self.font.lookup_glyph_index(c) != 0)
            .map(|c| self.font.metrics(c, self.px).advance_width);

        match advances.next() {
            Some(first) => advances.all(|a| (a - first).abs() < 0.01),
            None => false,
        }
    }

    fn measure(&self, text: &str) -> GlyphSize {
        let width = text.chars().map(|c| self.font.metrics(c, self.px).advance_width).sum();
        GlyphSize::new(width, self.ascent - self.descent)
    }

    fn render(&self, text: &str, width: u32, height: u32) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        let baseline = self.ascent.round() as i32;
        let mut pen_x = 0.0f32;

        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, self.px);
            let x_offset = pen_x.round() as i32 + metrics.xmin;
            let y_offset = baseline - metrics.height as i32 - metrics.ymin;
            pen_x += metrics.advance_width;

            for sy in 0..metrics.height {
                for sx in 0..metrics.width {
                    let tx = x_offset + sx as i32;
                    let ty = y_offset + sy as i32;
                    if tx >= 0 && tx < width as i32 && ty >= 0 && ty < height as i32 {
                        let val = bitmap[sy * metrics.width + sx];
                        let px = img.get_pixel_mut(tx as u32, ty as u32);
                        // Overlapping glyphs (combining marks) keep the brighter coverage.
                        *px = Luma([px.0[0].max(val)]);
                    }
                }
            }
        }

        img
    }
}
