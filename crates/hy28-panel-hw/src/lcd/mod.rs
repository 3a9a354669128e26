//! LCD display module.
//!
//! Provides the ILI9320 register protocol, the pixel surface and drawing
//! primitives for the 240x320 RGB565 display.

mod bitmap;
mod device;
mod font;
mod raster;

pub mod protocol;

pub use bitmap::{Bitmap, DrawBitmap};
pub use device::{ControllerIdentity, InitReport, Panel};
pub use font::{Glyph, GlyphTable, MonoFontGlyphs, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use protocol::{Register, RegisterAccess};
pub use raster::{PixelSink, Rasterizer};
