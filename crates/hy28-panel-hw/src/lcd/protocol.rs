//! ILI9320 register protocol over SPI.
//!
//! Frame structure:
//! - Start byte: 0x70 prefix | RS (0x02 data, 0x00 index) | RW (0x01 read)
//! - Index write: start, 0x00, register address
//! - Data write: start, value high byte, value low byte
//! - Data read: start, then three clocked-out bytes; the value is the last two
//!
//! Replies are not validated; callers sanity-check what they read.

use crate::transport::{Channel, Transport};
use crate::Result;

/// Fixed start-byte prefix.
pub const SPI_START: u8 = 0x70;

/// RW bit: read.
pub const SPI_RD: u8 = 0x01;

/// RW bit: write.
pub const SPI_WR: u8 = 0x00;

/// RS bit: data register.
pub const SPI_DATA: u8 = 0x02;

/// RS bit: index register.
pub const SPI_INDEX: u8 = 0x00;

/// Write frame length.
pub const WRITE_FRAME_LEN: usize = 3;

/// Read frame length.
pub const READ_FRAME_LEN: usize = 4;

/// Controller registers used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    /// Device code read / oscillator start.
    DeviceCode = 0x00,
    /// Entry mode: color order and scan direction.
    EntryMode = 0x03,
    /// Display control 1: on/off.
    DisplayControl1 = 0x07,
    /// GRAM horizontal address (cursor X).
    CursorX = 0x20,
    /// GRAM vertical address (cursor Y).
    CursorY = 0x21,
    /// GRAM data.
    PixelData = 0x22,
}

impl From<Register> for u8 {
    fn from(reg: Register) -> u8 {
        reg as u8
    }
}

/// Builds an index-write frame.
pub fn build_index_frame(index: u8) -> [u8; WRITE_FRAME_LEN] {
    [SPI_START | SPI_WR | SPI_INDEX, 0, index]
}

/// Builds a data-write frame.
pub fn build_data_frame(value: u16) -> [u8; WRITE_FRAME_LEN] {
    [SPI_START | SPI_WR | SPI_DATA, (value >> 8) as u8, (value & 0xFF) as u8]
}

/// Builds a data-read frame.
pub fn build_read_frame() -> [u8; READ_FRAME_LEN] {
    [SPI_START | SPI_RD | SPI_DATA, 0, 0, 0]
}

/// Extracts the 16-bit value from a completed read frame.
pub fn decode_read_frame(frame: &[u8; READ_FRAME_LEN]) -> u16 {
    ((frame[2] as u16) << 8) | frame[3] as u16
}

/// Register-level access, available on every [`Transport`].
pub trait RegisterAccess: Transport {
    /// Selects the register the next data access targets.
    fn write_index(&mut self, index: u8) -> Result<()> {
        let mut frame = build_index_frame(index);
        self.exchange(Channel::Display, &mut frame)
    }

    /// Writes a value to the selected register.
    fn write_data(&mut self, value: u16) -> Result<()> {
        let mut frame = build_data_frame(value);
        self.exchange(Channel::Display, &mut frame)
    }

    /// Reads a value from the selected register.
    fn read_data(&mut self) -> Result<u16> {
        let mut frame = build_read_frame();
        self.exchange(Channel::Display, &mut frame)?;
        Ok(decode_read_frame(&frame))
    }

    /// Writes a register.
    fn write_reg(&mut self, reg: impl Into<u8>, value: u16) -> Result<()> {
        self.write_index(reg.into())?;
        self.write_data(value)
    }

    /// Reads a register.
    fn read_reg(&mut self, reg: impl Into<u8>) -> Result<u16> {
        self.write_index(reg.into())?;
        self.read_data()
    }
}

impl<T: Transport + ?Sized> RegisterAccess for T {}
