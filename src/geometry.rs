//! Image partitioning - splits an image into output cells and cells into segments.
//!
//! Boundaries are `floor(extent / count * index)`, so consecutive spans share
//! their edges, the last span ends exactly at `extent` and spans differ in
//! length by at most one pixel.

use std::fmt;

use crate::signature::Granularity;
use crate::{MosaicError, Result};

/// Half-open pixel rectangle `[x_min, x_max) × [y_min, y_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellBounds {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl CellBounds {
    pub fn new(x_min: u32, x_max: u32, y_min: u32, y_max: u32) -> Self {
        Self { x_min, x_max, y_min, y_max }
    }

    /// The whole of a `width × height` buffer.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, width, 0, height)
    }

    pub fn width(&self) -> u32 {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> u32 {
        self.y_max.saturating_sub(self.y_min)
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }
}

impl fmt::Display for CellBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) x [{}, {})", self.x_min, self.x_max, self.y_min, self.y_max)
    }
}

// Integer form of floor(extent / count * index), exact for any extent.
fn boundary(extent: u32, count: u32, index: u32) -> u32 {
    (u64::from(extent) * u64::from(index) / u64::from(count)) as u32
}

/// Span of division `index` out of `count`, widened to one pixel when it would be empty.
fn span(extent: u32, count: u32, index: u32) -> (u32, u32) {
    let start = boundary(extent, count, index);
    let end = boundary(extent, count, index + 1);
    (start, end.max(start + 1))
}

/// Output grid size for a source image.
///
/// `width`/`height` of `0` mean "auto": that dimension is derived from the other one so
/// the output keeps the source aspect ratio once each cell is drawn with a glyph of
/// `char_aspect` (glyph width / glyph height). At most one dimension may be auto,
/// neither may be negative, and the grid may not exceed the source in either direction.
pub fn compute_grid_size(
    source_width: u32,
    source_height: u32,
    width: i32,
    height: i32,
    char_aspect: f64,
) -> Result<(u32, u32)> {
    if width < 0 || height < 0 {
        return Err(MosaicError::InvalidConfiguration(format!(
            "width and height must not be negative (got {width}x{height})"
        )));
    }
    if width == 0 && height == 0 {
        return Err(MosaicError::InvalidConfiguration(
            "either width or height must be specified".into(),
        ));
    }
    if source_width == 0 || source_height == 0 {
        return Err(MosaicError::InvalidConfiguration(format!(
            "source image is empty ({source_width}x{source_height})"
        )));
    }
    if !(char_aspect.is_finite() && char_aspect > 0.0) {
        return Err(MosaicError::InvalidConfiguration(format!(
            "character aspect ratio must be positive (got {char_aspect})"
        )));
    }

    let (src_w, src_h) = (f64::from(source_width), f64::from(source_height));
    let grid = match (width, height) {
        (w, 0) => {
            let cell_w = src_w / f64::from(w);
            let cell_h = cell_w / char_aspect;
            (w as u32, (src_h / cell_h).round().max(1.0) as u32)
        }
        (0, h) => {
            let cell_h = src_h / f64::from(h);
            let cell_w = cell_h * char_aspect;
            ((src_w / cell_w).round().max(1.0) as u32, h as u32)
        }
        (w, h) => (w as u32, h as u32),
    };
    if grid.0 > source_width || grid.1 > source_height {
        return Err(MosaicError::InvalidConfiguration(format!(
            "{}x{} grid has more cells than the {source_width}x{source_height} source has pixels",
            grid.0, grid.1
        )));
    }
    Ok(grid)
}

/// Split a `source_width × source_height` image into `grid_width × grid_height` cells,
/// row-major.
pub fn tile(
    source_width: u32,
    source_height: u32,
    grid_width: u32,
    grid_height: u32,
) -> Vec<CellBounds> {
    if grid_width == 0 || grid_height == 0 {
        return Vec::new();
    }
    let columns: Vec<(u32, u32)> = (0..grid_width)
        .map(|x| span(source_width, grid_width, x))
        .collect();

    (0..grid_height)
        .flat_map(|y| {
            let (y_min, y_max) = span(source_height, grid_height, y);
            columns
                .iter()
                .map(move |&(x_min, x_max)| CellBounds::new(x_min, x_max, y_min, y_max))
        })
        .collect()
}

/// Split one cell into the segments of `granularity`, row-major. Uses the same boundary
/// rule as [`tile`], offset to the cell origin.
pub fn segments(cell: CellBounds, granularity: Granularity) -> Vec<CellBounds> {
    let (rows, cols) = (granularity.vertical(), granularity.horizontal());
    let (w, h) = (cell.width(), cell.height());

    (0..rows)
        .flat_map(|y| {
            let (y0, y1) = span(h, rows, y);
            (0..cols).map(move |x| {
                let (x0, x1) = span(w, cols, x);
                CellBounds::new(cell.x_min + x0, cell.x_min + x1, cell.y_min + y0, cell.y_min + y1)
            })
        })
        .collect()
}
