//! Mean brightness of pixel regions.

use std::ops::Deref;

use image::{ImageBuffer, Pixel};

use crate::geometry::CellBounds;
use crate::{MosaicError, Result};

/// Read access to the brightness of individual pixels.
pub trait PixelAccess {
    fn dimensions(&self) -> (u32, u32);

    /// HSV value channel of pixel (x, y), normalized to [0, 1].
    fn value(&self, x: u32, y: u32) -> f64;
}

impl<P, C> PixelAccess for ImageBuffer<P, C>
where
    P: Pixel<Subpixel = u8>,
    C: Deref<Target = [u8]>,
{
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    #[inline]
    fn value(&self, x: u32, y: u32) -> f64 {
        let rgb = self.get_pixel(x, y).to_rgb();
        let max = rgb.0.iter().copied().max().unwrap_or(0);
        f64::from(max) / 255.0
    }
}

/// Mean brightness over `bounds`.
///
/// Fails with [`MosaicError::EmptyRegion`] when `bounds` holds no pixel or reaches
/// outside the image.
pub fn mean_brightness<A: PixelAccess + ?Sized>(pixels: &A, bounds: CellBounds) -> Result<f64> {
    let (width, height) = pixels.dimensions();
    if bounds.is_empty() || bounds.x_max > width || bounds.y_max > height {
        return Err(MosaicError::EmptyRegion(bounds));
    }

    let total: f64 = (bounds.y_min..bounds.y_max)
        .map(|y| (bounds.x_min..bounds.x_max).map(|x| pixels.value(x, y)).sum::<f64>())
        .sum();
    Ok(total / bounds.area() as f64)
}
