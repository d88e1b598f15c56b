//! The 16 console colors and their ANSI escapes.

use image::RgbImage;
use ndarray::Array2;
use rayon::prelude::*;

use crate::geometry::tile;

/// Resets foreground and background to the terminal defaults.
pub const ANSI_RESET: &str = "\x1b[39m\x1b[49m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkCyan,
    DarkRed,
    DarkMagenta,
    DarkYellow,
    Gray,
    DarkGray,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Yellow,
    White,
}

impl ConsoleColor {
    pub const ALL: [Self; 16] = [
        Self::Black,
        Self::DarkBlue,
        Self::DarkGreen,
        Self::DarkCyan,
        Self::DarkRed,
        Self::DarkMagenta,
        Self::DarkYellow,
        Self::Gray,
        Self::DarkGray,
        Self::Blue,
        Self::Green,
        Self::Cyan,
        Self::Red,
        Self::Magenta,
        Self::Yellow,
        Self::White,
    ];

    /// SGR code of the foreground form; the background form is 10 higher.
    fn sgr(self) -> u8 {
        match self {
            Self::Black => 30,
            Self::DarkRed => 31,
            Self::DarkGreen => 32,
            Self::DarkYellow => 33,
            Self::DarkBlue => 34,
            Self::DarkMagenta => 35,
            Self::DarkCyan => 36,
            Self::Gray => 37,
            Self::DarkGray => 90,
            Self::Red => 91,
            Self::Green => 92,
            Self::Yellow => 93,
            Self::Blue => 94,
            Self::Magenta => 95,
            Self::Cyan => 96,
            Self::White => 97,
        }
    }

    pub fn ansi_foreground(self) -> String {
        format!("\x1b[{}m", self.sgr())
    }

    pub fn ansi_background(self) -> String {
        format!("\x1b[{}m", self.sgr() + 10)
    }

    /// Nominal sRGB value (xterm defaults).
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Black => (0, 0, 0),
            Self::DarkRed => (205, 0, 0),
            Self::DarkGreen => (0, 205, 0),
            Self::DarkYellow => (205, 205, 0),
            Self::DarkBlue => (0, 0, 238),
            Self::DarkMagenta => (205, 0, 205),
            Self::DarkCyan => (0, 205, 205),
            Self::Gray => (229, 229, 229),
            Self::DarkGray => (127, 127, 127),
            Self::Red => (255, 0, 0),
            Self::Green => (0, 255, 0),
            Self::Yellow => (255, 255, 0),
            Self::Blue => (92, 92, 255),
            Self::Magenta => (255, 0, 255),
            Self::Cyan => (0, 255, 255),
            Self::White => (255, 255, 255),
        }
    }

    /// Closest console color by squared RGB distance.
    pub fn nearest(r: u8, g: u8, b: u8) -> Self {
        let dist = |c: Self| {
            let (cr, cg, cb) = c.rgb();
            let d = |a: u8, b: u8| (i32::from(a) - i32::from(b)).pow(2);
            d(r, cr) + d(g, cg) + d(b, cb)
        };
        Self::ALL
            .into_iter()
            .min_by_key(|&c| dist(c))
            .unwrap_or(Self::White)
    }
}

/// One console color per output cell: the nearest color to each cell's mean RGB.
///
/// Cells follow the same tiling as [`crate::generate`], so the map lines up with an
/// artwork of the same grid size.
pub fn console_color_map(
    image: &RgbImage,
    grid_width: u32,
    grid_height: u32,
) -> Array2<ConsoleColor> {
    let (width, height) = image.dimensions();
    let shape = (grid_height as usize, grid_width as usize);
    if width == 0 || height == 0 {
        return Array2::from_elem(shape, ConsoleColor::Black);
    }

    let colors: Vec<ConsoleColor> = tile(width, height, grid_width, grid_height)
        .into_par_iter()
        .map(|cell| {
            let (x_max, y_max) = (cell.x_max.min(width), cell.y_max.min(height));
            let mut sum = [0u64; 3];
            let mut count = 0u64;
            for y in cell.y_min..y_max {
                for x in cell.x_min..x_max {
                    for (s, &c) in sum.iter_mut().zip(image.get_pixel(x, y).0.iter()) {
                        *s += u64::from(c);
                    }
                    count += 1;
                }
            }
            let count = count.max(1);
            let [r, g, b] = sum.map(|s| (s / count) as u8);
            ConsoleColor::nearest(r, g, b)
        })
        .collect();

    Array2::from_shape_vec(shape, colors)
        .unwrap_or_else(|_| Array2::from_elem(shape, ConsoleColor::Black))
}
