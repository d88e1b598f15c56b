//! Nearest-signature character matching.

use ndarray::Array2;

use crate::brightness::PixelAccess;
use crate::geometry::CellBounds;
use crate::signature::{sample_signature, CharacterSignature};
use crate::{MosaicError, Result};

/// Mean squared difference between two equally shaped signatures.
pub fn mean_squared_error(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    let sum: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
    sum / a.len().max(1) as f64
}

/// Character whose relative signature is closest to `target`.
///
/// Linear scan in character-set order; only a strictly smaller error replaces the
/// current best, so exact ties go to the earlier character.
pub fn closest_character<'a>(
    target: &Array2<f64>,
    signatures: &'a CharacterSignature,
) -> Result<&'a str> {
    let mut best: Option<(&str, f64)> = None;

    for (character, signature) in signatures.iter_relative() {
        let error = mean_squared_error(signature, target);
        let better = match best {
            Some((_, best_error)) => error < best_error,
            None => true,
        };
        if better {
            best = Some((character, error));
        }
    }

    best.map(|(character, _)| character).ok_or(MosaicError::NoCandidates)
}

/// Sample `cell` of `pixels` at the signatures' granularity and pick the closest character.
pub fn find_best_character<'a, A: PixelAccess + ?Sized>(
    pixels: &A,
    cell: CellBounds,
    signatures: &'a CharacterSignature,
) -> Result<&'a str> {
    if signatures.is_empty() {
        return Err(MosaicError::NoCandidates);
    }
    let target = sample_signature(pixels, cell, signatures.granularity())?;
    closest_character(&target, signatures)
}
