//! HY28 Panel Hardware Library
//!
//! Drives the HY28A-LCDB module: an ILI9320 240x320 RGB565 display and an
//! ADS7843 resistive touch controller sharing one SPI bus. Provides the
//! register protocol, pixel surface, rasterizer, filtered touch sampling and
//! three-point affine touch calibration.

pub mod color;
pub mod error;
pub mod lcd;
pub mod orientation;
pub mod session;
pub mod touch;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use color::Color;
pub use error::{Error, Result};
pub use lcd::{
    Bitmap, ControllerIdentity, DrawBitmap, GlyphTable, InitReport, MonoFontGlyphs, Panel,
    PixelSink, Rasterizer,
};
pub use orientation::Orientation;
pub use session::Session;
pub use touch::{
    Acquisition, CalibrationMatrix, Rejection, TouchSettings, CALIBRATION_TARGETS,
};
pub use transport::{Channel, ControlPin, HalTransport, Level, Transport};

/// Native GRAM dimensions.
pub const PANEL_WIDTH: u16 = 240;
pub const PANEL_HEIGHT: u16 = 320;

/// A point in raw touch space or display space, depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coordinate {
    pub x: u16,
    pub y: u16,
}

impl Coordinate {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
