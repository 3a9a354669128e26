//! Error types for the HY28 panel hardware library.

use thiserror::Error;

use crate::transport::ControlPin;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when driving the panel.
///
/// Bus and pin faults are fatal for the current session. Touch samples that
/// fail the outlier filter are not errors; see [`crate::touch::Rejection`].
#[derive(Error, Debug)]
pub enum Error {
    /// SPI exchange failed.
    #[error("SPI bus error: {0}")]
    Bus(String),

    /// GPIO control line could not be read or driven.
    #[error("GPIO error on {pin} line: {reason}")]
    Pin { pin: ControlPin, reason: String },

    /// The three raw calibration points are collinear.
    #[error("Degenerate calibration: reference points are collinear")]
    DegenerateCalibration,

    /// A display coordinate was requested before calibration.
    #[error("Touch panel is not calibrated")]
    NotCalibrated,

    /// No usable touch was seen before the calibration deadline.
    #[error("Timed out waiting for a calibration touch")]
    CalibrationTimeout,

    /// Invalid orientation value.
    #[error("Invalid orientation: {0}")]
    InvalidOrientation(String),

    /// Invalid color literal.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Bitmap is not a 24-bit uncompressed image.
    #[error("Unsupported bitmap: {0}")]
    UnsupportedBitmap(String),

    /// Bitmap decoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
