//! Bus and control-line access.
//!
//! The display controller and the touch ADC share one SPI bus on separate
//! chip selects, each with its own clock rate. A [`Channel`] names the
//! sub-device for an exchange, so a touch read can never leave the bus
//! configured for the wrong device.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};
use embedded_hal::spi::SpiDevice;

use crate::{Error, Result};

/// SPI sub-device addressed by an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// ILI9320 display controller (chip select 0, fast clock).
    Display,
    /// ADS7843 touch ADC (chip select 1, slow clock).
    Touch,
}

/// GPIO lines used by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPin {
    /// Controller reset, active low.
    Reset,
    /// Backlight enable, active high.
    Backlight,
    /// Touch-ready (pen interrupt) signal, asserted low while pressed.
    TouchReady,
}

impl std::fmt::Display for ControlPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlPin::Reset => write!(f, "reset"),
            ControlPin::Backlight => write!(f, "backlight"),
            ControlPin::TouchReady => write!(f, "touch-ready"),
        }
    }
}

/// Logic level of a control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Blocking access to the shared bus and the three control lines.
pub trait Transport {
    /// Full-duplex exchange: `buf` is sent and overwritten with the reply.
    fn exchange(&mut self, channel: Channel, buf: &mut [u8]) -> Result<()>;

    /// Drives an output line.
    fn write_pin(&mut self, pin: ControlPin, level: Level) -> Result<()>;

    /// Samples the level of a line.
    fn read_pin(&mut self, pin: ControlPin) -> Result<Level>;

    /// Blocks for at least `us` microseconds.
    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }

    /// Blocks for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn exchange(&mut self, channel: Channel, buf: &mut [u8]) -> Result<()> {
        (**self).exchange(channel, buf)
    }

    fn write_pin(&mut self, pin: ControlPin, level: Level) -> Result<()> {
        (**self).write_pin(pin, level)
    }

    fn read_pin(&mut self, pin: ControlPin) -> Result<Level> {
        (**self).read_pin(pin)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// [`Transport`] over `embedded-hal` 1.0 devices.
///
/// Each SPI device carries its own chip select and clock configuration.
pub struct HalTransport<D, T, R, B, I, W> {
    display: D,
    touch: T,
    reset: R,
    backlight: B,
    touch_ready: I,
    delay: W,
}

impl<D, T, R, B, I, W> HalTransport<D, T, R, B, I, W>
where
    D: SpiDevice,
    T: SpiDevice,
    R: OutputPin,
    B: OutputPin,
    I: InputPin,
    W: DelayNs,
{
    /// Bundles the panel's devices into a transport.
    pub fn new(display: D, touch: T, reset: R, backlight: B, touch_ready: I, delay: W) -> Self {
        Self {
            display,
            touch,
            reset,
            backlight,
            touch_ready,
            delay,
        }
    }
}

fn pin_error(pin: ControlPin, err: impl embedded_hal::digital::Error) -> Error {
    Error::Pin {
        pin,
        reason: format!("{:?}", err.kind()),
    }
}

fn bus_error(channel: Channel, err: impl embedded_hal::spi::Error) -> Error {
    Error::Bus(format!("{:?} exchange failed: {:?}", channel, err.kind()))
}

impl<D, T, R, B, I, W> Transport for HalTransport<D, T, R, B, I, W>
where
    D: SpiDevice,
    T: SpiDevice,
    R: OutputPin,
    B: OutputPin,
    I: InputPin,
    W: DelayNs,
{
    fn exchange(&mut self, channel: Channel, buf: &mut [u8]) -> Result<()> {
        match channel {
            Channel::Display => self
                .display
                .transfer_in_place(buf)
                .map_err(|e| bus_error(channel, e)),
            Channel::Touch => self
                .touch
                .transfer_in_place(buf)
                .map_err(|e| bus_error(channel, e)),
        }
    }

    fn write_pin(&mut self, pin: ControlPin, level: Level) -> Result<()> {
        let state = PinState::from(level == Level::High);
        match pin {
            ControlPin::Reset => self.reset.set_state(state).map_err(|e| pin_error(pin, e)),
            ControlPin::Backlight => self
                .backlight
                .set_state(state)
                .map_err(|e| pin_error(pin, e)),
            // Input only.
            ControlPin::TouchReady => Err(Error::Pin {
                pin,
                reason: "line is configured as input".to_string(),
            }),
        }
    }

    fn read_pin(&mut self, pin: ControlPin) -> Result<Level> {
        match pin {
            ControlPin::TouchReady => self
                .touch_ready
                .is_high()
                .map(Level::from)
                .map_err(|e| pin_error(pin, e)),
            _ => Err(Error::Pin {
                pin,
                reason: "line is configured as output".to_string(),
            }),
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    struct LoopbackSpi;

    impl embedded_hal::spi::ErrorType for LoopbackSpi {
        type Error = Infallible;
    }

    impl SpiDevice for LoopbackSpi {
        fn transaction(
            &mut self,
            operations: &mut [embedded_hal::spi::Operation<'_, u8>],
        ) -> std::result::Result<(), Infallible> {
            for op in operations {
                if let embedded_hal::spi::Operation::TransferInPlace(words) = op {
                    words.iter_mut().for_each(|w| *w = !*w);
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePin {
        high: bool,
    }

    impl embedded_hal::digital::ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> std::result::Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> std::result::Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> std::result::Result<bool, Infallible> {
            Ok(self.high)
        }

        fn is_low(&mut self) -> std::result::Result<bool, Infallible> {
            Ok(!self.high)
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn transport() -> HalTransport<LoopbackSpi, LoopbackSpi, FakePin, FakePin, FakePin, NoDelay> {
        HalTransport::new(
            LoopbackSpi,
            LoopbackSpi,
            FakePin::default(),
            FakePin::default(),
            FakePin { high: true },
            NoDelay,
        )
    }

    #[test]
    fn test_exchange_is_in_place() {
        let mut t = transport();
        let mut buf = [0x00, 0xFF, 0x0F];
        t.exchange(Channel::Touch, &mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0x00, 0xF0]);
    }

    #[test]
    fn test_pin_directions() {
        let mut t = transport();
        t.write_pin(ControlPin::Backlight, Level::High).unwrap();
        assert!(t.backlight.high);
        assert_eq!(t.read_pin(ControlPin::TouchReady).unwrap(), Level::High);
        assert!(t.write_pin(ControlPin::TouchReady, Level::Low).is_err());
        assert!(t.read_pin(ControlPin::Reset).is_err());
    }
}
