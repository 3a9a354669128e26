//! Display orientation support.
//!
//! GRAM is always addressed natively as 240 columns by 320 rows. Orientation
//! selects the controller's scan direction (entry-mode register) and the axis
//! mapping used by text and bitmap drawing.

use crate::{Error, Result, PANEL_HEIGHT, PANEL_WIDTH};
use std::str::FromStr;

/// Display orientation.
///
/// Only the two orientations the controller sequence supports are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Landscape, origin in the lower left corner.
    Landscape,
    /// Portrait, origin in the upper left corner.
    #[default]
    Portrait,
}

impl Orientation {
    /// Returns the entry-mode (0x03) register value: BGR order, scan direction.
    pub fn entry_mode(&self) -> u16 {
        match self {
            Orientation::Landscape => 0x1008,
            Orientation::Portrait => 0x1030,
        }
    }

    /// Returns true if this is a portrait orientation.
    pub fn is_portrait(&self) -> bool {
        matches!(self, Orientation::Portrait)
    }

    /// Returns the logical (width, height) seen by text layout.
    pub fn dimensions(&self) -> (u16, u16) {
        if self.is_portrait() {
            (PANEL_WIDTH, PANEL_HEIGHT)
        } else {
            (PANEL_HEIGHT, PANEL_WIDTH)
        }
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "landscape" => Ok(Orientation::Landscape),
            "portrait" => Ok(Orientation::Portrait),
            _ => Err(Error::InvalidOrientation(s.to_string())),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Landscape => write!(f, "landscape"),
            Orientation::Portrait => write!(f, "portrait"),
        }
    }
}
