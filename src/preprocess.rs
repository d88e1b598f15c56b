//! Pixel preprocessing ahead of matching: grayscale, binary threshold and dithering.
//!
//! Every transform writes into a fresh buffer; the source image is never touched.

use image::{DynamicImage, GrayImage, RgbImage};
use rayon::prelude::*;

use crate::config::ColorMode;
use crate::{MosaicError, Result};

/// Luma cut-off of [`ColorMode::Binary`]: brighter pixels become white.
pub const BINARY_THRESHOLD: u8 = 127;

/// BT.601 luma, truncated.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b)) / 1000) as u8
}

/// Apply `f` to the luma of every pixel, one row per task.
fn map_luma(image: &RgbImage, f: impl Fn(u8) -> u8 + Sync) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let row_len = width as usize;
    out.par_chunks_mut(row_len)
        .zip(image.as_raw().par_chunks(row_len * 3))
        .for_each(|(dst, src)| {
            for (d, px) in dst.iter_mut().zip(src.chunks_exact(3)) {
                *d = f(luma(px[0], px[1], px[2]));
            }
        });
    out
}

pub fn grayscale(image: &RgbImage) -> GrayImage {
    map_luma(image, |l| l)
}

pub fn binarize(image: &RgbImage, threshold: u8) -> GrayImage {
    map_luma(image, |l| if l > threshold { 255 } else { 0 })
}

/// Atkinson dithering at a block size of `scale` pixels.
///
/// The image is averaged down to `scale × scale` blocks, diffused to black and white
/// at that resolution, then scaled back up so each block stays one solid tone.
pub fn dither_atkinson(image: &GrayImage, scale: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let scale = scale.max(1);
    let (work_w, work_h) = (width.div_ceil(scale), height.div_ceil(scale));

    let mut levels = block_means(image, scale, work_w, work_h);
    let tones = diffuse(&mut levels, work_w as usize, work_h as usize);

    GrayImage::from_fn(width, height, |x, y| {
        let idx = ((y / scale) * work_w + x / scale) as usize;
        image::Luma([tones[idx]])
    })
}

fn block_means(image: &GrayImage, scale: u32, work_w: u32, work_h: u32) -> Vec<f32> {
    let (width, height) = image.dimensions();
    (0..work_h)
        .into_par_iter()
        .flat_map_iter(|by| {
            (0..work_w).map(move |bx| {
                let xs = bx * scale..((bx + 1) * scale).min(width);
                let ys = by * scale..((by + 1) * scale).min(height);
                let count = xs.len() * ys.len();
                let sum: f32 = ys
                    .flat_map(|y| xs.clone().map(move |x| (x, y)))
                    .map(|(x, y)| f32::from(image.get_pixel(x, y).0[0]))
                    .sum();
                sum / count as f32
            })
        })
        .collect()
}

/// Error diffusion in scan order. Atkinson passes 1/8 of the error to six neighbours
/// and drops the remaining quarter, which keeps contrast high.
fn diffuse(levels: &mut [f32], w: usize, h: usize) -> Vec<u8> {
    const NEIGHBOURS: [(isize, usize); 6] = [(1, 0), (2, 0), (-1, 1), (0, 1), (1, 1), (0, 2)];
    let mut tones = vec![0u8; levels.len()];

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let old = levels[idx].clamp(0.0, 255.0);
            let new = if old > 127.5 { 255.0 } else { 0.0 };
            tones[idx] = new as u8;

            let share = (old - new) / 8.0;
            for (dx, dy) in NEIGHBOURS {
                let nx = x as isize + dx;
                let ny = y + dy;
                if nx >= 0 && (nx as usize) < w && ny < h {
                    levels[ny * w + nx as usize] += share;
                }
            }
        }
    }
    tones
}

/// Private grayscale copy of `image` prepared for `mode`.
///
/// `cell_width` is the output cell width in source pixels, used as the dither block size.
pub fn preprocess(image: &DynamicImage, mode: ColorMode, cell_width: u32) -> Result<GrayImage> {
    match mode {
        ColorMode::Binary => Ok(binarize(&image.to_rgb8(), BINARY_THRESHOLD)),
        ColorMode::Grayscale => Ok(grayscale(&image.to_rgb8())),
        ColorMode::Dither => Ok(dither_atkinson(&grayscale(&image.to_rgb8()), cell_width)),
        ColorMode::Color => Err(MosaicError::UnsupportedColorMode(mode)),
    }
}
