//! RGB565 colors and the controller's native channel order.
//!
//! With the BGR bit set in the entry-mode register the ILI9320 swaps red and
//! blue when a pixel is written, so GRAM holds pixels as BBBBBGGGGGGRRRRR and
//! reads come back in that order. [`Color`] is always the conventional
//! RRRRRGGGGGGBBBBB layout; conversions to and from GRAM order are explicit.

use std::str::FromStr;

use crate::{Error, Result};

/// 16-bit RGB565 color in conventional channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(u16);

impl Color {
    pub const WHITE: Color = Color(0xFFFF);
    pub const BLACK: Color = Color(0x0000);
    pub const GREY: Color = Color(0xF7DE);
    pub const BLUE: Color = Color(0x001F);
    pub const BLUE2: Color = Color(0x051F);
    pub const RED: Color = Color(0xF800);
    pub const MAGENTA: Color = Color(0xF81F);
    pub const GREEN: Color = Color(0x07E0);
    pub const CYAN: Color = Color(0x7FFF);
    pub const YELLOW: Color = Color(0xFFE0);

    /// Wraps a packed RGB565 value.
    pub const fn from_raw(raw: u16) -> Self {
        Color(raw)
    }

    /// Returns the packed RGB565 value, as written to the pixel-data register.
    pub const fn into_raw(self) -> u16 {
        self.0
    }

    /// Packs 8-bit channels, dropping the low bits.
    pub const fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        let r5 = (r >> 3) as u16;
        let g6 = (g >> 2) as u16;
        let b5 = (b >> 3) as u16;
        Color((r5 << 11) | (g6 << 5) | b5)
    }

    /// Expands to 8-bit channels.
    pub fn to_rgb888(self) -> (u8, u8, u8) {
        let r = ((self.0 >> 11) & 0x1F) as u8;
        let g = ((self.0 >> 5) & 0x3F) as u8;
        let b = (self.0 & 0x1F) as u8;
        ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
    }

    /// Converts to GRAM (BGR) order.
    pub const fn to_native(self) -> u16 {
        swap_red_blue(self.0)
    }

    /// Converts a word read back from GRAM.
    pub const fn from_native(native: u16) -> Self {
        Color(swap_red_blue(native))
    }
}

const fn swap_red_blue(word: u16) -> u16 {
    let hi = (word >> 11) & 0x1F;
    let g = (word >> 5) & 0x3F;
    let lo = word & 0x1F;
    (lo << 11) | (g << 5) | hi
}

impl FromStr for Color {
    type Err = Error;

    /// Parses `#RRGGBB` (hash optional).
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim_start_matches('#');
        let invalid = || Error::InvalidColor(s.to_string());
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let r = u8::from_str_radix(&hex[0..2], 16).map_err(|_| invalid())?;
        let g = u8::from_str_radix(&hex[2..4], 16).map_err(|_| invalid())?;
        let b = u8::from_str_radix(&hex[4..6], 16).map_err(|_| invalid())?;
        Ok(Color::from_rgb888(r, g, b))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (r, g, b) = self.to_rgb888();
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
    }
}

impl From<embedded_graphics::pixelcolor::Rgb565> for Color {
    fn from(color: embedded_graphics::pixelcolor::Rgb565) -> Self {
        use embedded_graphics::prelude::IntoStorage;
        Color(color.into_storage())
    }
}
