//! Image to text converter using per-glyph brightness signatures.
//!
//! Every candidate character is rendered once and reduced to a grid of mean
//! brightness values (its signature). Each output cell of an image is reduced
//! the same way and replaced by the character whose signature is closest.

pub mod artwork;
pub mod brightness;
pub mod color;
pub mod config;
pub mod font;
pub mod generate;
pub mod geometry;
pub mod matcher;
pub mod preprocess;
pub mod signature;

pub use artwork::Artwork;
pub use color::ConsoleColor;
pub use config::{ColorMode, GenerateConfig, DEFAULT_CHARSET};
pub use font::{FontdueRenderer, GlyphRenderer, GlyphSize};
pub use generate::{generate, Generator};
pub use geometry::CellBounds;
pub use signature::{CharacterSignature, Granularity, SignatureDatabase};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MosaicError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid font: {0}")]
    InvalidFont(String),
    #[error("Granularity {granularity} is finer than the {width}x{height} glyph cell")]
    GranularityTooFine {
        granularity: Granularity,
        width: u32,
        height: u32,
    },
    #[error("Color mode '{0}' is not supported")]
    UnsupportedColorMode(ColorMode),
    #[error("Empty sampling region {0}")]
    EmptyRegion(CellBounds),
    #[error("No candidate characters to match against")]
    NoCandidates,
    #[error("Artwork has no color map")]
    ColorUnavailable,
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MosaicError>;
