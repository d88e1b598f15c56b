//! Image to artwork conversion.

use std::sync::Arc;

use image::DynamicImage;
use ndarray::Array2;
use rayon::prelude::*;

use crate::artwork::Artwork;
use crate::config::{ColorMode, GenerateConfig};
use crate::geometry::{compute_grid_size, tile};
use crate::matcher::find_best_character;
use crate::preprocess::preprocess;
use crate::signature::{Granularity, SignatureDatabase};
use crate::{MosaicError, Result};

/// Convert `image` into an artwork using the signatures of `database` at `granularity`.
///
/// `config` supplies the output size and color mode; its own granularity is ignored
/// in favour of the explicit argument. The image is not modified.
pub fn generate(
    image: &DynamicImage,
    database: &SignatureDatabase,
    granularity: Granularity,
    config: &GenerateConfig,
) -> Result<Artwork> {
    let signatures = database.get(granularity).ok_or_else(|| {
        MosaicError::InvalidConfiguration(format!(
            "no signatures were built for granularity {granularity}"
        ))
    })?;
    if signatures.is_empty() {
        return Err(MosaicError::NoCandidates);
    }
    if config.color_mode == ColorMode::Color {
        return Err(MosaicError::UnsupportedColorMode(config.color_mode));
    }

    let (width, height) = (image.width(), image.height());
    let (grid_w, grid_h) = compute_grid_size(
        width,
        height,
        config.width,
        config.height,
        database.char_aspect(),
    )?;
    let processed = preprocess(image, config.color_mode, (width / grid_w).max(1))?;

    log::debug!(
        "matching {width}x{height} image as {grid_w}x{grid_h} cells at {granularity} \
         ({} mode, {} candidates)",
        config.color_mode,
        signatures.len()
    );

    let characters = tile(width, height, grid_w, grid_h)
        .into_par_iter()
        .map(|cell| find_best_character(&processed, cell, signatures).map(str::to_owned))
        .collect::<Result<Vec<String>>>()?;

    let cells = Array2::from_shape_vec((grid_h as usize, grid_w as usize), characters)
        .map_err(|e| MosaicError::ShapeMismatch(e.to_string()))?;
    Artwork::new(cells)
}

/// Reusable converter holding a shared signature database and its settings.
#[derive(Debug, Clone)]
pub struct Generator {
    database: Arc<SignatureDatabase>,
    config: GenerateConfig,
}

impl Generator {
    pub fn new(database: Arc<SignatureDatabase>, config: GenerateConfig) -> Self {
        Self { database, config }
    }

    pub fn with_width(mut self, width: i32) -> Self {
        self.config.width = width;
        self
    }

    pub fn with_height(mut self, height: i32) -> Self {
        self.config.height = height;
        self
    }

    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.config.color_mode = color_mode;
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.config.granularity = granularity;
        self
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    pub fn database(&self) -> &SignatureDatabase {
        &self.database
    }

    pub fn convert(&self, image: &DynamicImage) -> Result<Artwork> {
        generate(image, &self.database, self.config.granularity, &self.config)
    }
}
