//! Synthetic monospaced font shared by the integration tests.

use glyphmosaic::{GlyphRenderer, GlyphSize};
use image::{GrayImage, Luma};

pub const CELL_W: u32 = 6;
pub const CELL_H: u32 = 12;

/// Pure black/white 6x12 glyphs built from bars, so a glyph's rendering is
/// its own exact signature source.
pub struct BarFont;

fn lit(ch: char, x: u32, y: u32) -> bool {
    let hbar = (5..7).contains(&y);
    let vbar = (2..4).contains(&x);
    match ch {
        '#' => true,
        '-' => hbar,
        '|' => vbar,
        '+' => hbar || vbar,
        '_' => y >= 10,
        '.' => vbar && (9..11).contains(&y),
        _ => false,
    }
}

impl GlyphRenderer for BarFont {
    fn is_fixed_pitch(&self) -> bool {
        true
    }

    fn measure(&self, text: &str) -> GlyphSize {
        GlyphSize::new((CELL_W as usize * text.chars().count()) as f32, CELL_H as f32)
    }

    fn render(&self, text: &str, width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let index = (x / CELL_W) as usize;
            match text.chars().nth(index) {
                Some(ch) if lit(ch, x % CELL_W, y) => Luma([255]),
                _ => Luma([0]),
            }
        })
    }
}

pub const BAR_CHARS: [&str; 7] = [" ", "#", "-", "|", "+", "_", "."];
