//! ADS7843 touch controller: filtered sampling and calibration.

mod calibration;
pub mod sampler;

pub use calibration::{CalibrationMatrix, CALIBRATION_TARGETS};
pub use sampler::{filter_axis, Acquisition, Rejection, SampleWindow, TouchSettings};
