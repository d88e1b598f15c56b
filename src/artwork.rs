//! Generated character grid and its text renderings.

use std::collections::BTreeSet;
use std::fmt;

use ndarray::Array2;

use crate::color::{ConsoleColor, ANSI_RESET};
use crate::{MosaicError, Result};

/// A grid of characters, rows top to bottom, with optional per-cell console colors.
///
/// A background map requires a foreground map, and every map has the character
/// grid's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Artwork {
    cells: Array2<String>,
    foreground: Option<Array2<ConsoleColor>>,
    background: Option<Array2<ConsoleColor>>,
}

impl Artwork {
    pub fn new(cells: Array2<String>) -> Result<Self> {
        Self::with_colors(cells, None, None)
    }

    pub fn with_colors(
        cells: Array2<String>,
        foreground: Option<Array2<ConsoleColor>>,
        background: Option<Array2<ConsoleColor>>,
    ) -> Result<Self> {
        if cells.is_empty() {
            return Err(MosaicError::ShapeMismatch(
                "artwork must hold at least one character".into(),
            ));
        }
        if foreground.is_none() && background.is_some() {
            return Err(MosaicError::ShapeMismatch(
                "a background color map requires a foreground color map".into(),
            ));
        }
        for (name, map) in [("foreground", &foreground), ("background", &background)] {
            if let Some(map) = map {
                if map.dim() != cells.dim() {
                    return Err(MosaicError::ShapeMismatch(format!(
                        "{name} color map is {:?} but the character grid is {:?}",
                        map.dim(),
                        cells.dim()
                    )));
                }
            }
        }
        Ok(Self { cells, foreground, background })
    }

    /// Build from rows of equal length.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(MosaicError::ShapeMismatch("rows differ in length".into()));
        }
        let cells = Array2::from_shape_vec((height, width), rows.into_iter().flatten().collect())
            .map_err(|e| MosaicError::ShapeMismatch(e.to_string()))?;
        Self::new(cells)
    }

    /// Copy of this artwork carrying the given color maps.
    pub fn colored(
        &self,
        foreground: Array2<ConsoleColor>,
        background: Option<Array2<ConsoleColor>>,
    ) -> Result<Self> {
        Self::with_colors(self.cells.clone(), Some(foreground), background)
    }

    /// Columns.
    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.cells.get((row, col)).map(String::as_str)
    }

    pub fn cells(&self) -> &Array2<String> {
        &self.cells
    }

    pub fn foreground(&self) -> Option<&Array2<ConsoleColor>> {
        self.foreground.as_ref()
    }

    pub fn background(&self) -> Option<&Array2<ConsoleColor>> {
        self.background.as_ref()
    }

    /// Distinct characters in use, sorted.
    pub fn characters(&self) -> BTreeSet<&str> {
        self.cells.iter().map(String::as_str).collect()
    }

    /// Rows joined by `\n`, without a trailing newline.
    ///
    /// With `colorize`, each character is preceded by its foreground escape (and
    /// background escape, if present) and a single reset follows the whole output.
    /// Fails with [`MosaicError::ColorUnavailable`] if there is no color map.
    pub fn render(&self, colorize: bool) -> Result<String> {
        let foreground = match (colorize, &self.foreground) {
            (false, _) => None,
            (true, Some(fg)) => Some(fg),
            (true, None) => return Err(MosaicError::ColorUnavailable),
        };

        let mut out = String::new();
        for (r, row) in self.cells.rows().into_iter().enumerate() {
            if r > 0 {
                out.push('\n');
            }
            for (c, cell) in row.iter().enumerate() {
                if let Some(fg) = foreground {
                    out.push_str(&fg[[r, c]].ansi_foreground());
                    if let Some(bg) = &self.background {
                        out.push_str(&bg[[r, c]].ansi_background());
                    }
                }
                out.push_str(cell);
            }
        }
        if foreground.is_some() {
            out.push_str(ANSI_RESET);
        }
        Ok(out)
    }
}

impl fmt::Display for Artwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.cells.rows().into_iter().enumerate() {
            if r > 0 {
                f.write_str("\n")?;
            }
            for cell in row {
                f.write_str(cell)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn grid(rows: &[&str]) -> Array2<String> {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|r| r.chars().map(String::from).collect())
            .collect();
        Artwork::from_rows(rows).unwrap().cells().clone()
    }

    #[test]
    fn plain_render_has_no_trailing_newline() {
        let art = Artwork::new(grid(&["ab", "cd"])).unwrap();
        assert_eq!(art.render(false).unwrap(), "ab\ncd");
        assert_eq!(art.to_string(), "ab\ncd");
        assert_eq!((art.width(), art.height()), (2, 2));
        assert_eq!(art.get(1, 0), Some("c"));
    }

    #[test]
    fn colorized_render_resets_once() {
        let fg = array![[ConsoleColor::DarkRed, ConsoleColor::White]];
        let bg = array![[ConsoleColor::Black, ConsoleColor::Blue]];
        let art = Artwork::with_colors(grid(&["xy"]), Some(fg), Some(bg)).unwrap();
        assert_eq!(
            art.render(true).unwrap(),
            "\x1b[31m\x1b[40mx\x1b[97m\x1b[104my\x1b[39m\x1b[49m"
        );
    }

    #[test]
    fn colorized_render_spans_lines() {
        let fg = Array2::from_elem((2, 1), ConsoleColor::Green);
        let art = Artwork::new(grid(&["a", "b"])).unwrap().colored(fg, None).unwrap();
        assert_eq!(art.render(true).unwrap(), "\x1b[92ma\n\x1b[92mb\x1b[39m\x1b[49m");
        assert_eq!(art.render(false).unwrap(), "a\nb");
    }

    #[test]
    fn colorize_without_map_fails() {
        let art = Artwork::new(grid(&["a"])).unwrap();
        assert!(matches!(art.render(true), Err(MosaicError::ColorUnavailable)));
    }

    #[test]
    fn mismatched_background_is_rejected() {
        let fg = Array2::from_elem((3, 3), ConsoleColor::White);
        let bg = Array2::from_elem((2, 3), ConsoleColor::Black);
        let result = Artwork::with_colors(grid(&["abc", "def", "ghi"]), Some(fg), Some(bg));
        assert!(matches!(result, Err(MosaicError::ShapeMismatch(_))));
    }

    #[test]
    fn background_without_foreground_is_rejected() {
        let bg = Array2::from_elem((1, 1), ConsoleColor::Black);
        let result = Artwork::with_colors(grid(&["a"]), None, Some(bg));
        assert!(matches!(result, Err(MosaicError::ShapeMismatch(_))));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec![vec!["a".to_owned(), "b".to_owned()], vec!["c".to_owned()]];
        assert!(matches!(Artwork::from_rows(rows), Err(MosaicError::ShapeMismatch(_))));
    }

    #[test]
    fn characters_are_distinct_and_sorted() {
        let art = Artwork::new(grid(&["baa", "cab"])).unwrap();
        assert_eq!(art.characters().into_iter().collect::<Vec<_>>(), ["a", "b", "c"]);
    }
}
