//! Three-point affine calibration from raw touch space to display space.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::sampler::Rejection;
use crate::color::Color;
use crate::lcd::{GlyphTable, Panel, Rasterizer};
use crate::transport::Transport;
use crate::{Coordinate, Error, Result};

/// Display positions of the calibration crosshairs, in order.
pub const CALIBRATION_TARGETS: [Coordinate; 3] = [
    Coordinate::new(45, 45),
    Coordinate::new(45, 270),
    Coordinate::new(190, 190),
];

const PROMPT: &str = "Touch crosshair to calibrate";

/// Affine map `xd = (a*xs + b*ys + c) / divider`,
/// `yd = (d*xs + e*ys + f) / divider`.
///
/// Coefficients are solved exactly in integers and held as `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationMatrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    divider: f64,
}

impl CalibrationMatrix {
    /// Solves the map that sends each `screen[i]` to `display[i]`.
    ///
    /// Fails with [`Error::DegenerateCalibration`] when the raw points are
    /// collinear.
    pub fn solve(display: &[Coordinate; 3], screen: &[Coordinate; 3]) -> Result<Self> {
        let [d0, d1, d2] = display.map(|p| (p.x as i64, p.y as i64));
        let [s0, s1, s2] = screen.map(|p| (p.x as i64, p.y as i64));

        let divider = (s0.0 - s2.0) * (s1.1 - s2.1) - (s1.0 - s2.0) * (s0.1 - s2.1);
        if divider == 0 {
            return Err(Error::DegenerateCalibration);
        }

        let a = (d0.0 - d2.0) * (s1.1 - s2.1) - (d1.0 - d2.0) * (s0.1 - s2.1);
        let b = (s0.0 - s2.0) * (d1.0 - d2.0) - (d0.0 - d2.0) * (s1.0 - s2.0);
        let c = (s2.0 * d1.0 - s1.0 * d2.0) * s0.1
            + (s0.0 * d2.0 - s2.0 * d0.0) * s1.1
            + (s1.0 * d0.0 - s0.0 * d1.0) * s2.1;

        let d = (d0.1 - d2.1) * (s1.1 - s2.1) - (d1.1 - d2.1) * (s0.1 - s2.1);
        let e = (s0.0 - s2.0) * (d1.1 - d2.1) - (d0.1 - d2.1) * (s1.0 - s2.0);
        let f = (s2.0 * d1.1 - s1.0 * d2.1) * s0.1
            + (s0.0 * d2.1 - s2.0 * d0.1) * s1.1
            + (s1.0 * d0.1 - s0.0 * d1.1) * s2.1;

        Ok(Self {
            a: a as f64,
            b: b as f64,
            c: c as f64,
            d: d as f64,
            e: e as f64,
            f: f as f64,
            divider: divider as f64,
        })
    }

    /// Coefficients `[a, b, c, d, e, f]`.
    pub fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    pub fn divider(&self) -> f64 {
        self.divider
    }

    /// Unrounded display position of a raw point.
    pub fn apply_f64(&self, raw: Coordinate) -> Result<(f64, f64)> {
        if self.divider == 0.0 {
            return Err(Error::DegenerateCalibration);
        }
        let (xs, ys) = (raw.x as f64, raw.y as f64);
        Ok((
            (self.a * xs + self.b * ys + self.c) / self.divider,
            (self.d * xs + self.e * ys + self.f) / self.divider,
        ))
    }

    /// Display position of a raw point, rounded to the nearest pixel and
    /// saturated to the `u16` range.
    pub fn apply(&self, raw: Coordinate) -> Result<Coordinate> {
        let (x, y) = self.apply_f64(raw)?;
        Ok(Coordinate::new(x.round() as u16, y.round() as u16))
    }
}

impl<T: Transport> Panel<T> {
    /// Polls until a full, clean acquisition succeeds.
    pub fn wait_for_touch(&mut self, timeout: Option<Duration>) -> Result<Coordinate> {
        self.wait_for_touch_until(timeout.map(|t| Instant::now() + t))
    }

    /// Polls until the touch-ready line is released.
    pub fn wait_for_release(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.wait_for_release_until(timeout.map(|t| Instant::now() + t))
    }

    fn wait_for_touch_until(&mut self, deadline: Option<Instant>) -> Result<Coordinate> {
        loop {
            match self.acquire()? {
                Ok(raw) => return Ok(raw),
                Err(Rejection::Noisy) => debug!("Retrying after noisy touch"),
                Err(Rejection::Incomplete { .. }) => {}
            }
            self.pause(deadline)?;
        }
    }

    fn wait_for_release_until(&mut self, deadline: Option<Instant>) -> Result<()> {
        while self.is_touched()? {
            self.pause(deadline)?;
        }
        Ok(())
    }

    fn pause(&mut self, deadline: Option<Instant>) -> Result<()> {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::CalibrationTimeout);
        }
        let interval = self.touch_settings().poll_interval_us;
        self.transport_mut().delay_us(interval);
        Ok(())
    }

    /// Runs interactive calibration against [`CALIBRATION_TARGETS`].
    ///
    /// Shows the prompt and one crosshair per target, waits for a clean
    /// touch and a release at each, then solves and installs the matrix and
    /// clears the screen to black. On any failure the previous calibration,
    /// if any, stays active.
    pub fn calibrate<G>(&mut self, glyphs: &G, timeout: Option<Duration>) -> Result<CalibrationMatrix>
    where
        G: GlyphTable + ?Sized,
    {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut screen = [Coordinate::default(); 3];

        for (i, target) in CALIBRATION_TARGETS.iter().enumerate() {
            self.draw_text(glyphs, 10, 10, PROMPT, Color::WHITE, Color::BLACK)?;
            self.draw_cross(target.x as i32, target.y as i32, Color::WHITE)?;

            let raw = self.wait_for_touch_until(deadline)?;
            info!("Calibration point {} at {}: raw {}", i, target, raw);
            screen[i] = raw;

            self.wait_for_release_until(deadline)?;
        }

        let matrix = match CalibrationMatrix::solve(&CALIBRATION_TARGETS, &screen) {
            Ok(m) => m,
            Err(e) => {
                warn!("Calibration rejected, raw points {:?}", screen);
                return Err(e);
            }
        };
        debug!(
            "Calibration coefficients {:?} / {}",
            matrix.coefficients(),
            matrix.divider()
        );
        self.session_mut().set_calibration(matrix);
        self.clear(Color::BLACK)?;
        Ok(matrix)
    }

    /// Maps a raw point through the active calibration.
    pub fn to_display(&self, raw: Coordinate) -> Result<Coordinate> {
        self.session()
            .calibration()
            .ok_or(Error::NotCalibrated)?
            .apply(raw)
    }

    /// One acquisition mapped to display space.
    ///
    /// `Ok(None)` means no clean touch this cycle. Accepted touches are
    /// cached in the session; without a calibration the raw point is cached
    /// and [`Error::NotCalibrated`] is returned.
    pub fn poll_touch(&mut self) -> Result<Option<Coordinate>> {
        let raw = match self.acquire()? {
            Ok(raw) => raw,
            Err(_) => return Ok(None),
        };
        match self.to_display(raw) {
            Ok(mapped) => {
                debug!("Touch raw {} -> display {}", raw, mapped);
                self.session_mut().record_touch(raw, Some(mapped));
                Ok(Some(mapped))
            }
            Err(e) => {
                self.session_mut().record_touch(raw, None);
                Err(e)
            }
        }
    }
}
