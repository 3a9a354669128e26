//! ADS7843 sampling with 9-sample outlier rejection.

use tracing::{debug, trace};

use crate::lcd::Panel;
use crate::transport::{Channel, ControlPin, Level, Transport};
use crate::{Coordinate, Result};

/// Control byte: start, 12-bit differential conversion of the X channel.
pub const CMD_READ_X: u8 = 0xD0;

/// Control byte: start, 12-bit differential conversion of the Y channel.
pub const CMD_READ_Y: u8 = 0x90;

/// Samples collected per acquisition.
pub const WINDOW_SIZE: usize = 9;

/// Samples averaged per group.
const GROUP_SIZE: usize = 3;

/// Maximum spread between group averages that still counts as agreement.
pub const DEFAULT_THRESHOLD: u16 = 2;

/// Why an acquisition produced no coordinate. Not an error: the caller
/// treats it as "no touch this cycle".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Finger lifted before the window filled.
    Incomplete { collected: usize },
    /// All three group averages disagree beyond the threshold.
    Noisy,
}

/// Outcome of one acquisition.
pub type Acquisition = std::result::Result<Coordinate, Rejection>;

/// Touch sampling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSettings {
    /// Outlier threshold in raw ADC counts.
    pub threshold: u16,
    /// Pause between polls while waiting for a press or release.
    pub poll_interval_us: u32,
}

impl Default for TouchSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            poll_interval_us: 1000,
        }
    }
}

/// Raw readings gathered during one acquisition.
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    xs: [u16; WINDOW_SIZE],
    ys: [u16; WINDOW_SIZE],
    len: usize,
}

impl SampleWindow {
    /// Appends a reading; ignored once the window is full.
    pub fn push(&mut self, x: u16, y: u16) {
        if self.len < WINDOW_SIZE {
            self.xs[self.len] = x;
            self.ys[self.len] = y;
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == WINDOW_SIZE
    }

    /// Reduces the window to one coordinate, each axis filtered
    /// independently.
    pub fn filter(&self, threshold: u16) -> Acquisition {
        if !self.is_full() {
            return Err(Rejection::Incomplete {
                collected: self.len,
            });
        }
        let x = filter_axis(&self.xs, threshold).ok_or(Rejection::Noisy)?;
        let y = filter_axis(&self.ys, threshold).ok_or(Rejection::Noisy)?;
        Ok(Coordinate::new(x, y))
    }
}

/// Averages three groups of three, rejects the window if every pair of
/// group averages differs by more than `threshold`, otherwise averages the
/// closest pair.
pub fn filter_axis(samples: &[u16; WINDOW_SIZE], threshold: u16) -> Option<u16> {
    let mut avg = [0i32; 3];
    for (group, chunk) in samples.chunks_exact(GROUP_SIZE).enumerate() {
        avg[group] = chunk.iter().map(|&s| s as i32).sum::<i32>() / GROUP_SIZE as i32;
    }

    let m0 = (avg[0] - avg[1]).abs();
    let m1 = (avg[1] - avg[2]).abs();
    let m2 = (avg[2] - avg[0]).abs();
    let threshold = threshold as i32;

    if m0 > threshold && m1 > threshold && m2 > threshold {
        return None;
    }

    let value = if m0 < m1 {
        if m2 < m0 {
            (avg[0] + avg[2]) / 2
        } else {
            (avg[0] + avg[1]) / 2
        }
    } else if m2 < m1 {
        (avg[0] + avg[2]) / 2
    } else {
        (avg[1] + avg[2]) / 2
    };
    Some(value as u16)
}

/// Extracts the 12-bit conversion from a 3-byte exchange.
fn decode_conversion(frame: &[u8; 3]) -> u16 {
    ((((frame[1] as u16) << 8) | frame[2] as u16) >> 4) & 0x0FFF
}

impl<T: Transport> Panel<T> {
    /// True while the touch-ready line is held low.
    pub fn is_touched(&mut self) -> Result<bool> {
        Ok(self.transport_mut().read_pin(ControlPin::TouchReady)? == Level::Low)
    }

    fn read_channel(&mut self, command: u8) -> Result<u16> {
        let mut frame = [command, 0, 0];
        self.transport_mut().exchange(Channel::Touch, &mut frame)?;
        Ok(decode_conversion(&frame))
    }

    /// One raw X conversion.
    pub fn read_raw_x(&mut self) -> Result<u16> {
        self.read_channel(CMD_READ_X)
    }

    /// One raw Y conversion.
    pub fn read_raw_y(&mut self) -> Result<u16> {
        self.read_channel(CMD_READ_Y)
    }

    /// Samples while the panel is pressed, up to a full window, then filters.
    ///
    /// Returns immediately with `Incomplete` if nothing is touching the
    /// panel. An accepted point is cached in the session as the last raw
    /// touch. The outer `Result` only fails on bus or pin faults.
    pub fn acquire(&mut self) -> Result<Acquisition> {
        let mut window = SampleWindow::default();
        loop {
            if self.is_touched()? {
                let x = self.read_raw_x()?;
                let y = self.read_raw_y()?;
                trace!("Raw sample {}: x={} y={}", window.len(), x, y);
                window.push(x, y);
            }
            if !(self.is_touched()? && !window.is_full()) {
                break;
            }
        }

        let result = window.filter(self.touch_settings().threshold);
        if let Ok(raw) = &result {
            self.session_mut().record_touch(*raw, None);
        }
        match result {
            Ok(raw) => debug!("Touch at raw {}", raw),
            Err(Rejection::Incomplete { collected }) if collected > 0 => {
                debug!("Touch released after {} samples", collected)
            }
            Err(Rejection::Noisy) => debug!("Noisy touch window discarded"),
            Err(_) => {}
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Frame, Gesture, MockTransport};

    fn window(xs: [u16; 9], ys: [u16; 9]) -> SampleWindow {
        let mut w = SampleWindow::default();
        for (x, y) in xs.into_iter().zip(ys) {
            w.push(x, y);
        }
        w
    }

    #[test]
    fn test_noisy_axis_rejected() {
        let samples = [100, 101, 102, 500, 501, 499, 900, 901, 902];
        assert_eq!(filter_axis(&samples, DEFAULT_THRESHOLD), None);
    }

    #[test]
    fn test_agreeing_groups_average_closest_pair() {
        // averages 101, 500, 102: m0 = 399, m1 = 398, m2 = 1
        let samples = [100, 101, 102, 500, 501, 499, 101, 102, 103];
        assert_eq!(filter_axis(&samples, DEFAULT_THRESHOLD), Some(101));
    }

    #[test]
    fn test_tie_break_order() {
        // avg 10, 11, 20: m0 = 1 < m1 = 9, m2 = 10 not < m0 -> {0, 1}
        let s = [10, 10, 10, 11, 11, 11, 20, 20, 20];
        assert_eq!(filter_axis(&s, 2), Some(10));

        // avg 10, 7, 12: m0 = 3 < m1 = 5, m2 = 2 < m0 -> {0, 2}
        let s = [10, 10, 10, 7, 7, 7, 12, 12, 12];
        assert_eq!(filter_axis(&s, 2), Some(11));

        // avg 10, 20, 11: m0 = 10 < m1 = 9? no; m2 = 1 < m1 -> {0, 2}
        let s = [10, 10, 10, 20, 20, 20, 11, 11, 11];
        assert_eq!(filter_axis(&s, 2), Some(10));

        // avg 20, 10, 11: m0 = 10, m1 = 1, m2 = 9 -> {1, 2}
        let s = [20, 20, 20, 10, 10, 10, 11, 11, 11];
        assert_eq!(filter_axis(&s, 2), Some(10));

        // avg 10, 13, 11: m0 = 3 < m1 = 2? no; m2 = 1 < m1 -> {0, 2}
        let s = [10, 10, 10, 13, 13, 13, 11, 11, 11];
        assert_eq!(filter_axis(&s, 2), Some(10));

        // all equal: m0 < m1 false, m2 < m1 false -> {1, 2}
        let s = [7; 9];
        assert_eq!(filter_axis(&s, 2), Some(7));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // averages 100, 102, 104: m0 = 2 is not above the threshold
        let s = [100, 100, 100, 102, 102, 102, 104, 104, 104];
        assert_eq!(filter_axis(&s, 2), Some(103));
        assert_eq!(filter_axis(&s, 1), None);
    }

    #[test]
    fn test_group_average_truncates() {
        // avg (1+1+2)/3 = 1
        let s = [1, 1, 2, 1, 1, 2, 1, 1, 2];
        assert_eq!(filter_axis(&s, 2), Some(1));
    }

    #[test]
    fn test_window_filter() {
        let w = window([1000; 9], [2000; 9]);
        assert_eq!(w.filter(2), Ok(Coordinate::new(1000, 2000)));

        let w = window([1000; 9], [100, 101, 102, 500, 501, 499, 900, 901, 902]);
        assert_eq!(w.filter(2), Err(Rejection::Noisy));

        let mut w = SampleWindow::default();
        w.push(1, 1);
        assert_eq!(w.filter(2), Err(Rejection::Incomplete { collected: 1 }));
    }

    #[test]
    fn test_window_ignores_overflow() {
        let mut w = window([5; 9], [5; 9]);
        w.push(9999, 9999);
        assert_eq!(w.len(), WINDOW_SIZE);
        assert_eq!(w.filter(2), Ok(Coordinate::new(5, 5)));
    }

    #[test]
    fn test_decode_conversion() {
        assert_eq!(decode_conversion(&[0, 0x7F, 0xF0]), 0x7FF);
        assert_eq!(decode_conversion(&[0, 0xFF, 0xFF]), 0xFFF);
        assert_eq!(decode_conversion(&[0, 0x01, 0x2F]), 0x012);
    }

    #[test]
    fn test_acquire_steady_touch() {
        let t = MockTransport::with_gestures([Gesture::steady(1800, 2200, 9)]);
        let mut p = Panel::new(t);
        assert_eq!(p.acquire().unwrap(), Ok(Coordinate::new(1800, 2200)));
        // X then Y per sample, on the touch channel only
        assert_eq!(p.transport().touch_frames(), 18);
        assert_eq!(p.transport().display_frames(), 0);
        assert_eq!(p.transport().frames[0], Frame::Touch(vec![CMD_READ_X, 0, 0]));
        assert_eq!(p.transport().frames[1], Frame::Touch(vec![CMD_READ_Y, 0, 0]));
    }

    #[test]
    fn test_acquire_caches_accepted_point() {
        let t = MockTransport::with_gestures([
            Gesture::steady(1800, 2200, 9),
            Gesture::steady(1000, 1000, 5),
        ]);
        let mut p = Panel::new(t);
        assert_eq!(p.session().last_raw(), None);

        assert!(p.acquire().unwrap().is_ok());
        assert_eq!(p.session().last_raw(), Some(Coordinate::new(1800, 2200)));
        assert_eq!(p.session().last_display(), None);

        // a rejected window leaves the cached point alone
        assert!(p.acquire().unwrap().is_err());
        assert_eq!(p.session().last_raw(), Some(Coordinate::new(1800, 2200)));
    }

    #[test]
    fn test_acquire_stops_at_nine() {
        let t = MockTransport::with_gestures([Gesture::steady(1000, 1000, 20)]);
        let mut p = Panel::new(t);
        assert!(p.acquire().unwrap().is_ok());
        assert_eq!(p.transport().touch_frames(), 18);
    }

    #[test]
    fn test_acquire_early_lift() {
        let t = MockTransport::with_gestures([Gesture::steady(1000, 1000, 5)]);
        let mut p = Panel::new(t);
        assert_eq!(
            p.acquire().unwrap(),
            Err(Rejection::Incomplete { collected: 5 })
        );
    }

    #[test]
    fn test_acquire_untouched() {
        let mut p = Panel::new(MockTransport::new());
        assert_eq!(
            p.acquire().unwrap(),
            Err(Rejection::Incomplete { collected: 0 })
        );
        assert_eq!(p.transport().touch_frames(), 0);
    }

    #[test]
    fn test_acquire_noisy() {
        let xs = [100, 101, 102, 500, 501, 499, 900, 901, 902];
        let samples: Vec<(u16, u16)> = xs.iter().map(|&x| (x, 2000)).collect();
        let t = MockTransport::with_gestures([Gesture::new(&samples)]);
        let mut p = Panel::new(t);
        assert_eq!(p.acquire().unwrap(), Err(Rejection::Noisy));
        assert_eq!(p.session().last_raw(), None);
    }

    #[test]
    fn test_custom_threshold() {
        let xs = [100, 100, 100, 104, 104, 104, 108, 108, 108];
        let samples: Vec<(u16, u16)> = xs.iter().map(|&x| (x, 2000)).collect();
        let t = MockTransport::with_gestures([Gesture::new(&samples)]);
        let mut p = Panel::new(t).with_touch_settings(TouchSettings {
            threshold: 4,
            ..TouchSettings::default()
        });
        // averages 100, 104, 108: m0 = m1 = 4, so the later pair wins
        assert_eq!(p.acquire().unwrap(), Ok(Coordinate::new(106, 2000)));
    }
}
