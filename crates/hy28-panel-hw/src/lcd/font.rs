//! 8x16 bitmap glyphs for text blitting.

use std::convert::Infallible;

use embedded_graphics::mono_font::{ascii::FONT_8X13, MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

/// Glyph cell width in pixels.
pub const GLYPH_WIDTH: usize = 8;

/// Glyph cell height in pixels.
pub const GLYPH_HEIGHT: usize = 16;

/// One glyph: a row mask per line, MSB is the leftmost column.
pub type Glyph = [u8; GLYPH_HEIGHT];

/// First and last characters in the shipped table.
const FIRST_CHAR: char = ' ';
const LAST_CHAR: char = '~';

/// Lookup of fixed-size glyph bitmaps.
pub trait GlyphTable {
    fn glyph(&self, ch: char) -> Option<Glyph>;
}

/// Printable ASCII rasterized from an `embedded-graphics` mono font.
#[derive(Debug, Clone)]
pub struct MonoFontGlyphs {
    glyphs: Vec<Glyph>,
}

impl Default for MonoFontGlyphs {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoFontGlyphs {
    /// Builds the table from the 8x13 font, centred vertically in the cell.
    pub fn new() -> Self {
        Self::from_font(&FONT_8X13)
    }

    /// Builds the table from any mono font; pixels beyond 8x16 are clipped.
    pub fn from_font(font: &MonoFont<'_>) -> Self {
        let height = font.character_size.height as usize;
        let top = GLYPH_HEIGHT.saturating_sub(height) / 2;
        let style = MonoTextStyle::new(font, BinaryColor::On);

        let glyphs = (FIRST_CHAR..=LAST_CHAR)
            .map(|ch| {
                let mut cell = GlyphCell::default();
                let mut buf = [0u8; 4];
                let text = ch.encode_utf8(&mut buf);
                // Infallible target.
                let _ = Text::with_baseline(text, Point::new(0, top as i32), style, Baseline::Top)
                    .draw(&mut cell);
                cell.rows
            })
            .collect();

        Self { glyphs }
    }
}

impl GlyphTable for MonoFontGlyphs {
    fn glyph(&self, ch: char) -> Option<Glyph> {
        if !(FIRST_CHAR..=LAST_CHAR).contains(&ch) {
            return None;
        }
        self.glyphs.get(ch as usize - FIRST_CHAR as usize).copied()
    }
}

/// Scratch target one glyph cell in size.
#[derive(Default)]
struct GlyphCell {
    rows: Glyph,
}

impl OriginDimensions for GlyphCell {
    fn size(&self) -> Size {
        Size::new(GLYPH_WIDTH as u32, GLYPH_HEIGHT as u32)
    }
}

impl DrawTarget for GlyphCell {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) else {
                continue;
            };
            if color.is_on() && x < GLYPH_WIDTH && y < GLYPH_HEIGHT {
                self.rows[y] |= 0x80 >> x;
            }
        }
        Ok(())
    }
}
