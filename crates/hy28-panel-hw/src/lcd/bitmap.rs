//! 24-bit BMP images drawn pixel by pixel.

use std::path::Path;

use image::{ColorType, ImageFormat, RgbImage};
use tracing::info;

use super::raster::PixelSink;
use crate::color::Color;
use crate::{Error, Result};

/// Offset of the little-endian bits-per-pixel field in a BMP file.
const BPP_OFFSET: usize = 28;

/// A decoded 24-bit bitmap.
#[derive(Debug, Clone)]
pub struct Bitmap {
    image: RgbImage,
}

impl Bitmap {
    /// Reads and decodes a BMP file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        info!("Reading bitmap {}", path.as_ref().display());
        Self::from_bytes(&bytes)
    }

    /// Decodes an in-memory BMP. Only files whose header declares 24 bits
    /// per pixel are accepted.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bpp = bits_per_pixel(bytes)?;
        if bpp != 24 {
            return Err(Error::UnsupportedBitmap(format!(
                "expected 24 bits per pixel, got {}",
                bpp
            )));
        }
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Bmp)?;
        if decoded.color() != ColorType::Rgb8 {
            return Err(Error::UnsupportedBitmap(format!(
                "expected 24-bit RGB, got {:?}",
                decoded.color()
            )));
        }
        let image = decoded.into_rgb8();
        info!(
            "Bitmap {}x{}, {} bytes",
            image.width(),
            image.height(),
            bytes.len()
        );
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// RGB565 color at a top-down image position.
    pub fn pixel(&self, col: u32, row: u32) -> Color {
        let [r, g, b] = self.image.get_pixel(col, row).0;
        Color::from_rgb888(r, g, b)
    }
}

fn bits_per_pixel(bytes: &[u8]) -> Result<u16> {
    match bytes.get(BPP_OFFSET..BPP_OFFSET + 2) {
        Some(&[lo, hi]) => Ok(u16::from_le_bytes([lo, hi])),
        _ => Err(Error::UnsupportedBitmap(format!(
            "header too short: {} bytes",
            bytes.len()
        ))),
    }
}

/// Image drawing on any [`PixelSink`].
pub trait DrawBitmap: PixelSink {
    /// Draws `bitmap` with its upper-left corner at (x, y).
    ///
    /// Portrait draws upright. Landscape follows the file's bottom-up row
    /// order: a pixel `r` rows above the bottom lands on native column
    /// `x + r`, row `y + col`. Pixels off the panel are clipped.
    fn put_image(&mut self, x: u16, y: u16, bitmap: &Bitmap) -> Result<()> {
        let (width, height) = (bitmap.width(), bitmap.height());
        let portrait = self.orientation().is_portrait();
        for row in 0..height {
            for col in 0..width {
                let color = bitmap.pixel(col, row);
                let (px, py) = if portrait {
                    (x as u32 + col, y as u32 + row)
                } else {
                    (x as u32 + (height - 1 - row), y as u32 + col)
                };
                if let (Ok(px), Ok(py)) = (u16::try_from(px), u16::try_from(py)) {
                    self.set_point(px, py, color)?;
                }
            }
        }
        Ok(())
    }
}

impl<S: PixelSink + ?Sized> DrawBitmap for S {}
