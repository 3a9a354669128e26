//! Per-run panel state.
//!
//! Orientation, the active calibration and the last touch are the only
//! mutable state shared between drawing, sampling and calibration. They live
//! here, owned by the [`crate::Panel`], rather than in globals.

use crate::orientation::Orientation;
use crate::touch::CalibrationMatrix;
use crate::Coordinate;

/// Session state; nothing is persisted across runs.
#[derive(Debug, Clone, Default)]
pub struct Session {
    orientation: Orientation,
    calibration: Option<CalibrationMatrix>,
    last_raw: Option<Coordinate>,
    last_display: Option<Coordinate>,
}

impl Session {
    /// Creates an uncalibrated session.
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Self::default()
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The active calibration, if any.
    pub fn calibration(&self) -> Option<&CalibrationMatrix> {
        self.calibration.as_ref()
    }

    /// Raw coordinate of the last accepted touch.
    pub fn last_raw(&self) -> Option<Coordinate> {
        self.last_raw
    }

    /// Display coordinate of the last accepted touch.
    pub fn last_display(&self) -> Option<Coordinate> {
        self.last_display
    }

    pub(crate) fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Installs a new calibration and drops cached touches from the old one.
    pub(crate) fn set_calibration(&mut self, matrix: CalibrationMatrix) {
        self.calibration = Some(matrix);
        self.forget_touch();
    }

    pub(crate) fn record_touch(&mut self, raw: Coordinate, display: Option<Coordinate>) {
        self.last_raw = Some(raw);
        self.last_display = display;
    }

    pub(crate) fn forget_touch(&mut self) {
        self.last_raw = None;
        self.last_display = None;
    }
}
