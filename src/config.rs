//! Conversion settings.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::signature::Granularity;
use crate::{MosaicError, Result};

/// Digits, Latin letters, ASCII punctuation in code point order, then a space.
///
/// The order is the tie-break order of matching.
pub const DEFAULT_CHARSET: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~ ";

/// Preprocessing applied to the image before matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Luma thresholded at 127 into pure black and white.
    #[default]
    Binary,
    /// Luma only.
    Grayscale,
    /// Atkinson error diffusion at output cell scale.
    Dither,
    /// Full color. Recognized, but not supported by [`crate::generate`].
    Color,
}

impl ColorMode {
    pub const ALL: [Self; 4] = [Self::Binary, Self::Grayscale, Self::Dither, Self::Color];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Grayscale => "grayscale",
            Self::Dither => "dither",
            Self::Color => "color",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorMode {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == wanted)
            .ok_or_else(|| {
                MosaicError::InvalidConfiguration(format!(
                    "unknown color mode '{s}' (expected binary, grayscale, dither or color)"
                ))
            })
    }
}

/// Settings for one conversion. `0` for `width` or `height` means "derive from the
/// other dimension"; at most one may be `0` and neither may be negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub width: i32,
    pub height: i32,
    pub color_mode: ColorMode,
    pub granularity: Granularity,
    pub charset: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 0,
            color_mode: ColorMode::Binary,
            granularity: Granularity::ONE_BY_ONE,
            charset: DEFAULT_CHARSET.to_owned(),
        }
    }
}

impl GenerateConfig {
    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Read settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Candidate characters, one per entry, in charset order.
    pub fn characters(&self) -> Vec<String> {
        self.charset.chars().map(String::from).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < 0 || self.height < 0 {
            return Err(MosaicError::InvalidConfiguration(format!(
                "width and height must not be negative (got {}x{})",
                self.width, self.height
            )));
        }
        if self.width == 0 && self.height == 0 {
            return Err(MosaicError::InvalidConfiguration(
                "either width or height must be specified".into(),
            ));
        }
        Ok(())
    }
}
