//! Panel controller: reset, initialization and pixel access.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Size};
use tracing::{debug, info, warn};

use super::protocol::{Register, RegisterAccess};
use super::raster::PixelSink;
use crate::color::Color;
use crate::orientation::Orientation;
use crate::session::Session;
use crate::touch::TouchSettings;
use crate::transport::{ControlPin, Level, Transport};
use crate::{Error, Result, PANEL_HEIGHT, PANEL_WIDTH};

/// Display control 1 value with the panel showing GRAM.
const DISPLAY_ON: u16 = 0x0173;

/// Display control 1 value with the panel blanked.
const DISPLAY_OFF: u16 = 0x0000;

#[derive(Debug, Clone, Copy)]
enum InitStep {
    Write(u8, u16),
    EntryMode,
    Pause(u32),
}

use InitStep::{EntryMode, Pause, Write};

/// ILI9320 power-up sequence.
const INIT_SEQUENCE: &[InitStep] = &[
    Write(0x00, 0x0000),
    Write(0x01, 0x0100), // driver output control
    Write(0x02, 0x0700), // driving waveform
    EntryMode,
    Write(0x04, 0x0000), // resize
    Write(0x08, 0x0202), // display control 2
    Write(0x09, 0x0000), // display control 3
    Write(0x0A, 0x0000), // frame cycle
    Write(0x0C, 0x0001), // RGB interface 1
    Write(0x0D, 0x0000), // frame marker
    Write(0x0F, 0x0000), // RGB interface 2
    Pause(50),
    Write(0x07, 0x0101),
    Pause(50),
    Write(0x10, (1 << 12) | (1 << 7) | (1 << 6)), // power control 1
    Write(0x11, 0x0007),
    Write(0x12, (1 << 8) | (1 << 4)),
    Write(0x13, 0x0B00),
    Write(0x29, 0x0000), // power control 7
    Write(0x2B, (1 << 14) | (1 << 4)),
    Write(0x50, 0), // window x start
    Write(0x51, PANEL_WIDTH - 1),
    Write(0x52, 0), // window y start
    Write(0x53, PANEL_HEIGHT - 1),
    Pause(50),
    Write(0x60, 0x2700), // gate scan
    Write(0x61, 0x0001),
    Write(0x6A, 0x0000), // vertical scroll
    Write(0x80, 0x0000), // partial image 1
    Write(0x81, 0x0000),
    Write(0x82, 0x0000),
    Write(0x83, 0x0000), // partial image 2
    Write(0x84, 0x0000),
    Write(0x85, 0x0000),
    Write(0x90, 16), // panel interface
    Write(0x92, 0x0000),
    Write(0x93, 0x0001),
    Write(0x95, 0x0110),
    Write(0x97, 0x0000),
    Write(0x98, 0x0000),
    Write(0x07, 0x0133),
    Pause(100),
];

/// Controller identity read back from register 0x00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerIdentity {
    Ili9320,
    Ili9300,
    /// Some compatible controllers report other codes.
    Unknown(u16),
}

impl ControllerIdentity {
    pub fn from_code(code: u16) -> Self {
        match code {
            0x9320 => ControllerIdentity::Ili9320,
            0x9300 => ControllerIdentity::Ili9300,
            other => ControllerIdentity::Unknown(other),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ControllerIdentity::Unknown(_))
    }
}

/// Outcome of [`Panel::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    pub device_code: u16,
    pub identity: ControllerIdentity,
}

/// HY28A panel: display controller plus touch controller on one transport.
pub struct Panel<T> {
    transport: T,
    session: Session,
    touch: TouchSettings,
}

impl<T: Transport> Panel<T> {
    /// Wraps a transport. The controller is untouched until [`Panel::init`].
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            session: Session::default(),
            touch: TouchSettings::default(),
        }
    }

    /// Overrides the touch sampling settings.
    pub fn with_touch_settings(mut self, settings: TouchSettings) -> Self {
        self.touch = settings;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn touch_settings(&self) -> &TouchSettings {
        &self.touch
    }

    /// Gets the current orientation.
    pub fn orientation(&self) -> Orientation {
        self.session.orientation()
    }

    /// Pulses the active-low reset line.
    pub fn reset(&mut self) -> Result<()> {
        self.transport.write_pin(ControlPin::Reset, Level::High)?;
        self.transport.delay_ms(5);
        self.transport.write_pin(ControlPin::Reset, Level::Low)?;
        self.transport.delay_ms(15);
        self.transport.write_pin(ControlPin::Reset, Level::High)?;
        self.transport.delay_ms(15);
        debug!("Controller reset");
        Ok(())
    }

    /// Switches the backlight on, identifies the controller and runs the
    /// power-up register sequence for `orientation`.
    ///
    /// An unrecognised device code is logged and reported, not fatal.
    pub fn init(&mut self, orientation: Orientation) -> Result<InitReport> {
        self.set_backlight(true)?;

        let device_code = self.transport.read_reg(Register::DeviceCode)?;
        let identity = ControllerIdentity::from_code(device_code);
        if identity.is_known() {
            info!("Controller {:?} (device code {:04X})", identity, device_code);
        } else {
            warn!(
                "Unexpected device code {:04X}, continuing with ILI9320 sequence",
                device_code
            );
        }

        for step in INIT_SEQUENCE {
            match *step {
                Write(reg, value) => self.transport.write_reg(reg, value)?,
                EntryMode => self
                    .transport
                    .write_reg(Register::EntryMode, orientation.entry_mode())?,
                Pause(ms) => self.transport.delay_ms(ms),
            }
        }

        self.session.set_orientation(orientation);
        info!("Panel initialized in {} orientation", orientation);

        Ok(InitReport {
            device_code,
            identity,
        })
    }

    pub fn display_on(&mut self) -> Result<()> {
        self.transport
            .write_reg(Register::DisplayControl1, DISPLAY_ON)
    }

    pub fn display_off(&mut self) -> Result<()> {
        self.transport
            .write_reg(Register::DisplayControl1, DISPLAY_OFF)
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<()> {
        self.transport
            .write_pin(ControlPin::Backlight, Level::from(on))
    }

    /// Points the GRAM address counter at a native coordinate.
    pub fn set_cursor(&mut self, x: u16, y: u16) -> Result<()> {
        self.transport.write_reg(Register::CursorX, x)?;
        self.transport.write_reg(Register::CursorY, y)
    }

    /// Returns true if the native coordinate is inside GRAM.
    pub fn in_bounds(x: u16, y: u16) -> bool {
        x < PANEL_WIDTH && y < PANEL_HEIGHT
    }

    /// Writes one pixel. Out-of-range coordinates are a no-op with no bus
    /// traffic.
    pub fn set_point(&mut self, x: u16, y: u16, color: Color) -> Result<()> {
        if !Self::in_bounds(x, y) {
            return Ok(());
        }
        self.set_cursor(x, y)?;
        self.transport
            .write_reg(Register::PixelData, color.into_raw())
    }

    /// Reads one pixel back from GRAM; `None` outside the panel.
    pub fn get_point(&mut self, x: u16, y: u16) -> Result<Option<Color>> {
        if !Self::in_bounds(x, y) {
            return Ok(None);
        }
        self.set_cursor(x, y)?;
        self.transport.write_index(Register::PixelData.into())?;
        // First read after an index write returns stale pipeline data.
        let _ = self.transport.read_data()?;
        let native = self.transport.read_data()?;
        Ok(Some(Color::from_native(native)))
    }

    /// Fills the whole panel, relying on the controller's address
    /// auto-increment after the first pixel.
    pub fn clear(&mut self, color: Color) -> Result<()> {
        self.set_point(0, 0, color)?;
        let remaining = PANEL_WIDTH as u32 * PANEL_HEIGHT as u32 - 1;
        for _ in 0..remaining {
            self.transport.write_data(color.into_raw())?;
        }
        debug!("Cleared display to {}", color);
        Ok(())
    }
}

impl<T: Transport> PixelSink for Panel<T> {
    fn set_point(&mut self, x: u16, y: u16, color: Color) -> Result<()> {
        Panel::set_point(self, x, y, color)
    }

    fn orientation(&self) -> Orientation {
        self.session.orientation()
    }
}

impl<T: Transport> OriginDimensions for Panel<T> {
    fn size(&self) -> Size {
        Size::new(PANEL_WIDTH as u32, PANEL_HEIGHT as u32)
    }
}

impl<T: Transport> DrawTarget for Panel<T> {
    type Color = Rgb565;
    type Error = Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<()>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u16::try_from(point.x), u16::try_from(point.y)) {
                Panel::set_point(self, x, y, color.into())?;
            }
        }
        Ok(())
    }
}
