//! Per-character brightness signatures.
//!
//! A signature is the mean brightness of each segment of a glyph cell, laid out
//! as a `[vertical, horizontal]` array. The absolute signatures come straight
//! from the rendered glyphs; the relative ones are divided by the brightest
//! segment of the whole character set so that set spans the full [0, 1] range.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::str::FromStr;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::brightness::{mean_brightness, PixelAccess};
use crate::font::{GlyphRenderer, GlyphSize};
use crate::geometry::{segments, CellBounds};
use crate::{MosaicError, Result};

/// How finely one output cell is subdivided for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(u32, u32)", into = "(u32, u32)")]
pub struct Granularity {
    vertical: u32,
    horizontal: u32,
}

impl Granularity {
    pub const ONE_BY_ONE: Self = Self { vertical: 1, horizontal: 1 };
    pub const TWO_BY_ONE: Self = Self { vertical: 2, horizontal: 1 };
    pub const TWO_BY_TWO: Self = Self { vertical: 2, horizontal: 2 };
    pub const FOUR_BY_TWO: Self = Self { vertical: 4, horizontal: 2 };
    pub const FOUR_BY_FOUR: Self = Self { vertical: 4, horizontal: 4 };

    pub const PRESETS: [Self; 5] = [
        Self::ONE_BY_ONE,
        Self::TWO_BY_ONE,
        Self::TWO_BY_TWO,
        Self::FOUR_BY_TWO,
        Self::FOUR_BY_FOUR,
    ];

    pub fn new(vertical: u32, horizontal: u32) -> Result<Self> {
        if vertical == 0 || horizontal == 0 {
            return Err(MosaicError::InvalidConfiguration(format!(
                "granularity must be at least 1x1, got {vertical}x{horizontal}"
            )));
        }
        Ok(Self { vertical, horizontal })
    }

    pub fn vertical(&self) -> u32 {
        self.vertical
    }

    pub fn horizontal(&self) -> u32 {
        self.horizontal
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.vertical as usize, self.horizontal as usize)
    }

    pub fn segment_count(&self) -> usize {
        self.vertical as usize * self.horizontal as usize
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Self::ONE_BY_ONE
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.vertical, self.horizontal)
    }
}

/// Parses `"VxH"`, e.g. `"4x2"` for four rows of two segments.
impl FromStr for Granularity {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            MosaicError::InvalidConfiguration(format!("granularity must look like 4x2, got '{s}'"))
        };
        let (v, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let v = v.trim().parse().map_err(|_| invalid())?;
        let h = h.trim().parse().map_err(|_| invalid())?;
        Self::new(v, h)
    }
}

impl TryFrom<(u32, u32)> for Granularity {
    type Error = MosaicError;

    fn try_from((vertical, horizontal): (u32, u32)) -> Result<Self> {
        Self::new(vertical, horizontal)
    }
}

impl From<Granularity> for (u32, u32) {
    fn from(g: Granularity) -> Self {
        (g.vertical, g.horizontal)
    }
}

/// Sample the brightness signature of `bounds` at `granularity`.
pub fn sample_signature<A: PixelAccess + ?Sized>(
    pixels: &A,
    bounds: CellBounds,
    granularity: Granularity,
) -> Result<Array2<f64>> {
    let values = segments(bounds, granularity)
        .into_iter()
        .map(|segment| mean_brightness(pixels, segment))
        .collect::<Result<Vec<f64>>>()?;
    Array2::from_shape_vec(granularity.shape(), values)
        .map_err(|e| MosaicError::ShapeMismatch(e.to_string()))
}

/// Signatures of a character set at one granularity, in character-set order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredSignature", into = "StoredSignature")]
pub struct CharacterSignature {
    granularity: Granularity,
    characters: Vec<String>,
    absolute: Vec<Array2<f64>>,
    relative: Vec<Array2<f64>>,
}

impl CharacterSignature {
    /// Fails with [`MosaicError::ShapeMismatch`] if any array is not `granularity`-shaped.
    /// Repeated characters keep their first signature.
    pub fn new(granularity: Granularity, entries: Vec<(String, Array2<f64>)>) -> Result<Self> {
        let mut characters = Vec::with_capacity(entries.len());
        let mut absolute = Vec::with_capacity(entries.len());

        for (character, values) in entries {
            if values.dim() != granularity.shape() {
                return Err(MosaicError::ShapeMismatch(format!(
                    "signature of '{character}' is {:?}, expected {:?} at {granularity}",
                    values.dim(),
                    granularity.shape()
                )));
            }
            if characters.contains(&character) {
                continue;
            }
            characters.push(character);
            absolute.push(values);
        }

        let relative = normalize(&absolute);
        Ok(Self { granularity, characters, absolute, relative })
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn characters(&self) -> &[String] {
        &self.characters
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    fn position(&self, character: &str) -> Option<usize> {
        self.characters.iter().position(|c| c == character)
    }

    pub fn absolute(&self, character: &str) -> Option<&Array2<f64>> {
        self.position(character).map(|i| &self.absolute[i])
    }

    pub fn relative(&self, character: &str) -> Option<&Array2<f64>> {
        self.position(character).map(|i| &self.relative[i])
    }

    /// Relative signatures in character-set order.
    pub fn iter_relative(&self) -> impl Iterator<Item = (&str, &Array2<f64>)> {
        self.characters.iter().map(String::as_str).zip(self.relative.iter())
    }

    /// Keep only the characters matching `predicate`, renormalizing the relative set.
    pub fn retain(&mut self, mut predicate: impl FnMut(&str) -> bool) {
        let mut characters = Vec::new();
        let mut absolute = Vec::new();
        for (c, a) in self.characters.drain(..).zip(self.absolute.drain(..)) {
            if predicate(c.as_str()) {
                characters.push(c);
                absolute.push(a);
            }
        }
        self.relative = normalize(&absolute);
        self.characters = characters;
        self.absolute = absolute;
    }
}

/// Divide by the global maximum. A set with no lit segment is left as is.
fn normalize(absolute: &[Array2<f64>]) -> Vec<Array2<f64>> {
    let max = absolute
        .iter()
        .flat_map(|a| a.iter().copied())
        .fold(0.0f64, f64::max);

    if max > 0.0 {
        absolute.iter().map(|a| a / max).collect()
    } else {
        absolute.to_vec()
    }
}

#[derive(Serialize, Deserialize)]
struct StoredSignature {
    granularity: Granularity,
    characters: Vec<String>,
    absolute: Vec<Array2<f64>>,
}

impl TryFrom<StoredSignature> for CharacterSignature {
    type Error = MosaicError;

    fn try_from(stored: StoredSignature) -> Result<Self> {
        if stored.characters.len() != stored.absolute.len() {
            return Err(MosaicError::ShapeMismatch(format!(
                "{} characters but {} signatures",
                stored.characters.len(),
                stored.absolute.len()
            )));
        }
        Self::new(stored.granularity, stored.characters.into_iter().zip(stored.absolute).collect())
    }
}

impl From<CharacterSignature> for StoredSignature {
    fn from(sig: CharacterSignature) -> Self {
        Self {
            granularity: sig.granularity,
            characters: sig.characters,
            absolute: sig.absolute,
        }
    }
}

/// Signatures of one font and character set at every requested granularity.
///
/// Built once, then shared read-only between conversions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredDatabase", into = "StoredDatabase")]
pub struct SignatureDatabase {
    glyph_size: GlyphSize,
    signatures: HashMap<Granularity, CharacterSignature>,
}

impl SignatureDatabase {
    /// Render every character with `renderer` and sample it at every granularity.
    ///
    /// The glyph cell is the measured size of `"A"`. Without granularities, 1x1 is used.
    pub fn build<R, S>(
        renderer: &R,
        characters: &[S],
        granularities: &[Granularity],
    ) -> Result<Self>
    where
        R: GlyphRenderer + ?Sized,
        S: AsRef<str>,
    {
        let glyph_size = renderer.measure("A");
        Self::build_with_glyph_size(renderer, characters, granularities, glyph_size)
    }

    pub fn build_with_glyph_size<R, S>(
        renderer: &R,
        characters: &[S],
        granularities: &[Granularity],
        glyph_size: GlyphSize,
    ) -> Result<Self>
    where
        R: GlyphRenderer + ?Sized,
        S: AsRef<str>,
    {
        if !renderer.is_fixed_pitch() {
            return Err(MosaicError::InvalidFont("font must be monospaced".into()));
        }

        let characters = dedup(characters.iter().map(|c| c.as_ref().to_owned()));
        if characters.is_empty() {
            return Err(MosaicError::NoCandidates);
        }
        let mut granularities = dedup(granularities.iter().copied());
        if granularities.is_empty() {
            granularities.push(Granularity::ONE_BY_ONE);
        }

        let (width, height) = glyph_size.cell_pixels();
        if width == 0 || height == 0 {
            return Err(MosaicError::InvalidFont(format!(
                "glyph cell {}x{} has no pixels",
                glyph_size.width, glyph_size.height
            )));
        }
        if let Some(&granularity) = granularities
            .iter()
            .find(|g| g.horizontal() > width || g.vertical() > height)
        {
            return Err(MosaicError::GranularityTooFine { granularity, width, height });
        }

        let cell = CellBounds::full(width, height);
        // per_character[c][g]: signature of character c at granularity g
        let per_character = characters
            .par_iter()
            .map(|character| {
                let glyph = renderer.render(character, width, height);
                granularities
                    .iter()
                    .map(|&g| sample_signature(&glyph, cell, g))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let mut signatures = HashMap::with_capacity(granularities.len());
        for (gi, &granularity) in granularities.iter().enumerate() {
            let entries = characters
                .iter()
                .zip(&per_character)
                .map(|(c, sigs)| (c.clone(), sigs[gi].clone()))
                .collect();
            signatures.insert(granularity, CharacterSignature::new(granularity, entries)?);
        }

        log::debug!(
            "built signatures for {} characters at {} granularities in a {width}x{height} cell",
            characters.len(),
            granularities.len()
        );
        Ok(Self { glyph_size, signatures })
    }

    /// Assemble a database from precomputed signatures, e.g. for glyphs no renderer can draw.
    /// A repeated granularity keeps its first signature set.
    pub fn from_signatures(
        glyph_size: GlyphSize,
        signatures: Vec<CharacterSignature>,
    ) -> Result<Self> {
        if !(glyph_size.width > 0.0 && glyph_size.height > 0.0) {
            return Err(MosaicError::InvalidFont(format!(
                "glyph size must be positive, got {}x{}",
                glyph_size.width, glyph_size.height
            )));
        }
        let mut map = HashMap::with_capacity(signatures.len());
        for sig in signatures {
            map.entry(sig.granularity()).or_insert(sig);
        }
        Ok(Self { glyph_size, signatures: map })
    }

    pub fn glyph_size(&self) -> GlyphSize {
        self.glyph_size
    }

    /// Glyph width : height, used for aspect-correct auto sizing.
    pub fn char_aspect(&self) -> f64 {
        self.glyph_size.aspect_ratio()
    }

    pub fn get(&self, granularity: Granularity) -> Option<&CharacterSignature> {
        self.signatures.get(&granularity)
    }

    /// Available granularities, sorted.
    pub fn granularities(&self) -> Vec<Granularity> {
        let mut keys: Vec<_> = self.signatures.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Drop candidate characters not matching `predicate` at every granularity.
    pub fn retain(&mut self, predicate: impl Fn(&str) -> bool) {
        for sig in self.signatures.values_mut() {
            sig.retain(&predicate);
        }
    }

    /// Keep printable ASCII characters only (0x20-0x7E).
    pub fn ascii_only(&mut self) {
        self.retain(|s| s.chars().all(|c| (' '..='~').contains(&c)));
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn dedup<T: PartialEq>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut out = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[derive(Serialize, Deserialize)]
struct StoredDatabase {
    glyph_size: GlyphSize,
    signatures: Vec<CharacterSignature>,
}

impl TryFrom<StoredDatabase> for SignatureDatabase {
    type Error = MosaicError;

    fn try_from(stored: StoredDatabase) -> Result<Self> {
        Self::from_signatures(stored.glyph_size, stored.signatures)
    }
}

impl From<SignatureDatabase> for StoredDatabase {
    fn from(db: SignatureDatabase) -> Self {
        let mut signatures: Vec<_> = db.signatures.into_values().collect();
        signatures.sort_unstable_by_key(CharacterSignature::granularity);
        Self { glyph_size: db.glyph_size, signatures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use ndarray::array;

    /// 4x8 cells: "#" fully lit, "." lit in the bottom half, " " dark.
    struct BlockFont {
        fixed: bool,
    }

    impl GlyphRenderer for BlockFont {
        fn is_fixed_pitch(&self) -> bool {
            self.fixed
        }

        fn measure(&self, text: &str) -> GlyphSize {
            GlyphSize::new(4.0 * text.chars().count() as f32, 8.0)
        }

        fn render(&self, text: &str, width: u32, height: u32) -> GrayImage {
            GrayImage::from_fn(width, height, |_, y| match text {
                "#" => Luma([200]),
                "." if y >= height / 2 => Luma([100]),
                _ => Luma([0]),
            })
        }
    }

    fn build(chars: &[&str], grans: &[Granularity]) -> Result<SignatureDatabase> {
        SignatureDatabase::build(&BlockFont { fixed: true }, chars, grans)
    }

    #[test]
    fn granularity_parses_and_displays() {
        let g: Granularity = "4x2".parse().unwrap();
        assert_eq!(g, Granularity::FOUR_BY_TWO);
        assert_eq!(g.to_string(), "4x2");
        assert!("0x2".parse::<Granularity>().is_err());
        assert!("four".parse::<Granularity>().is_err());
    }

    #[test]
    fn absolute_signature_follows_glyph_pixels() {
        let db = build(&[" ", ".", "#"], &[Granularity::TWO_BY_ONE]).unwrap();
        let sig = db.get(Granularity::TWO_BY_ONE).unwrap();
        let dot = sig.absolute(".").unwrap();
        assert!((dot[[0, 0]] - 0.0).abs() < 1e-9);
        assert!((dot[[1, 0]] - 100.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn relative_signature_peaks_at_one() {
        let db = build(&[" ", ".", "#"], &Granularity::PRESETS).unwrap();
        for g in db.granularities() {
            let sig = db.get(g).unwrap();
            let max = sig.iter_relative().flat_map(|(_, a)| a.iter().copied()).fold(0.0, f64::max);
            assert!((max - 1.0).abs() < 1e-9, "granularity {g}");
            assert!((sig.relative("#").unwrap()[[0, 0]] - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn relative_is_global_not_per_character() {
        let db = build(&[".", "#"], &[Granularity::TWO_BY_ONE]).unwrap();
        let dot = db.get(Granularity::TWO_BY_ONE).unwrap().relative(".").unwrap();
        assert!((dot[[1, 0]] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn characters_keep_first_occurrence_order() {
        let db = build(&["#", " ", "#", "."], &[]).unwrap();
        let sig = db.get(Granularity::ONE_BY_ONE).unwrap();
        assert_eq!(sig.characters(), ["#", " ", "."]);
    }

    #[test]
    fn proportional_font_is_rejected() {
        let result = SignatureDatabase::build(&BlockFont { fixed: false }, &["#"], &[]);
        assert!(matches!(result, Err(MosaicError::InvalidFont(_))));
    }

    #[test]
    fn granularity_finer_than_glyph_is_rejected() {
        let too_wide = Granularity::new(2, 5).unwrap();
        assert!(matches!(
            build(&["#"], &[too_wide]),
            Err(MosaicError::GranularityTooFine { width: 4, height: 8, .. })
        ));
        assert!(build(&["#"], &[Granularity::new(8, 4).unwrap()]).is_ok());
    }

    #[test]
    fn empty_character_set_has_no_candidates() {
        assert!(matches!(build(&[], &[]), Err(MosaicError::NoCandidates)));
    }

    #[test]
    fn retain_renormalizes() {
        let mut db = build(&[" ", ".", "#"], &[Granularity::TWO_BY_ONE]).unwrap();
        db.retain(|c| c != "#");
        let sig = db.get(Granularity::TWO_BY_ONE).unwrap();
        assert_eq!(sig.characters(), [" ", "."]);
        assert!((sig.relative(".").unwrap()[[1, 0]] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ascii_only_drops_other_characters() {
        let mut db = build(&["#", "█", "."], &[]).unwrap();
        db.ascii_only();
        assert_eq!(db.get(Granularity::ONE_BY_ONE).unwrap().characters(), ["#", "."]);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let result = CharacterSignature::new(
            Granularity::TWO_BY_TWO,
            vec![("a".into(), array![[1.0, 0.0]])],
        );
        assert!(matches!(result, Err(MosaicError::ShapeMismatch(_))));
    }

    #[test]
    fn all_dark_set_stays_zero() {
        let dark = vec![(" ".into(), array![[0.0]])];
        let sig = CharacterSignature::new(Granularity::ONE_BY_ONE, dark).unwrap();
        assert_eq!(sig.relative(" ").unwrap()[[0, 0]], 0.0);
    }

    #[test]
    fn save_and_load_preserves_signatures() {
        let grans = [Granularity::ONE_BY_ONE, Granularity::TWO_BY_ONE];
        let db = build(&[" ", ".", "#"], &grans).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signatures.json");
        db.save(&path).unwrap();

        let loaded = SignatureDatabase::load(&path).unwrap();
        assert_eq!(loaded.glyph_size(), db.glyph_size());
        assert_eq!(loaded.granularities(), db.granularities());
        let a = db.get(Granularity::TWO_BY_ONE).unwrap();
        let b = loaded.get(Granularity::TWO_BY_ONE).unwrap();
        assert_eq!(a.characters(), b.characters());
        assert_eq!(a.relative("."), b.relative("."));
    }
}
