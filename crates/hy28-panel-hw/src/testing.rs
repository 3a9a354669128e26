//! In-memory panel for unit tests: an emulated ILI9320 on the display
//! channel and a scripted ADS7843 on the touch channel.

use std::collections::VecDeque;

use crate::color::Color;
use crate::lcd::protocol::{SPI_DATA, SPI_RD, SPI_START};
use crate::touch::sampler::CMD_READ_X;
use crate::transport::{Channel, ControlPin, Level, Transport};
use crate::{Result, PANEL_HEIGHT, PANEL_WIDTH};

/// A frame as it was sent on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Display(Vec<u8>),
    Touch(Vec<u8>),
}

/// One press: raw (x, y) ADC readings, then a number of pin polls that see
/// the line released before the next press begins.
#[derive(Debug, Clone)]
pub struct Gesture {
    pub samples: VecDeque<(u16, u16)>,
    pub release_polls: usize,
}

impl Gesture {
    pub fn new(samples: &[(u16, u16)]) -> Self {
        Self {
            samples: samples.iter().copied().collect(),
            release_polls: 2,
        }
    }

    pub fn steady(x: u16, y: u16, count: usize) -> Self {
        Self::new(&vec![(x, y); count])
    }
}

pub struct MockTransport {
    pub frames: Vec<Frame>,
    pub pins: Vec<(ControlPin, Level)>,
    pub device_code: u16,
    pub registers: [u16; 256],
    pub gram: Vec<u16>,
    pub gestures: VecDeque<Gesture>,
    pub delays_us: u64,
    index: u8,
    cursor: (u16, u16),
    read_primed: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            pins: Vec::new(),
            device_code: 0x9320,
            registers: [0; 256],
            gram: vec![0; PANEL_WIDTH as usize * PANEL_HEIGHT as usize],
            gestures: VecDeque::new(),
            delays_us: 0,
            index: 0,
            cursor: (0, 0),
            read_primed: false,
        }
    }

    pub fn with_gestures(gestures: impl IntoIterator<Item = Gesture>) -> Self {
        let mut t = Self::new();
        t.gestures.extend(gestures);
        t
    }

    /// Color stored in GRAM at a native coordinate.
    pub fn pixel(&self, x: u16, y: u16) -> Color {
        Color::from_native(self.gram[y as usize * PANEL_WIDTH as usize + x as usize])
    }

    pub fn display_frames(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| matches!(f, Frame::Display(_)))
            .count()
    }

    pub fn touch_frames(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| matches!(f, Frame::Touch(_)))
            .count()
    }

    /// (register, value) pairs in the order they were written.
    pub fn register_writes(&self) -> Vec<(u8, u16)> {
        let mut writes = Vec::new();
        let mut index = 0u8;
        for frame in &self.frames {
            if let Frame::Display(bytes) = frame {
                match bytes[0] {
                    0x70 => index = bytes[2],
                    0x72 => writes.push((index, ((bytes[1] as u16) << 8) | bytes[2] as u16)),
                    _ => {}
                }
            }
        }
        writes
    }

    fn advance_cursor(&mut self) {
        self.cursor.0 += 1;
        if self.cursor.0 >= PANEL_WIDTH {
            self.cursor.0 = 0;
            self.cursor.1 = (self.cursor.1 + 1) % PANEL_HEIGHT;
        }
    }

    fn gram_index(&self) -> Option<usize> {
        let (x, y) = self.cursor;
        (x < PANEL_WIDTH && y < PANEL_HEIGHT)
            .then(|| y as usize * PANEL_WIDTH as usize + x as usize)
    }

    fn display_exchange(&mut self, buf: &mut [u8]) {
        let start = buf[0];
        if start == SPI_START {
            self.index = buf[2];
            self.read_primed = false;
        } else if start == SPI_START | SPI_DATA {
            let value = ((buf[1] as u16) << 8) | buf[2] as u16;
            self.registers[self.index as usize] = value;
            match self.index {
                0x20 => self.cursor.0 = value,
                0x21 => self.cursor.1 = value,
                0x22 => {
                    if let Some(i) = self.gram_index() {
                        self.gram[i] = Color::from_raw(value).to_native();
                    }
                    self.advance_cursor();
                }
                _ => {}
            }
        } else if start == SPI_START | SPI_DATA | SPI_RD {
            let value = match self.index {
                0x00 => self.device_code,
                0x22 if !self.read_primed => {
                    self.read_primed = true;
                    0xDEAD
                }
                0x22 => {
                    let v = self.gram_index().map(|i| self.gram[i]).unwrap_or(0);
                    self.advance_cursor();
                    v
                }
                i => self.registers[i as usize],
            };
            buf[1] = 0xAA;
            buf[2] = (value >> 8) as u8;
            buf[3] = (value & 0xFF) as u8;
        }
    }

    fn touch_exchange(&mut self, buf: &mut [u8]) {
        let command = buf[0];
        let value = match self.gestures.front_mut() {
            Some(g) => {
                if command == CMD_READ_X {
                    g.samples.front().map(|s| s.0).unwrap_or(0)
                } else {
                    g.samples.pop_front().map(|s| s.1).unwrap_or(0)
                }
            }
            None => 0,
        };
        let shifted = value << 4;
        buf[1] = (shifted >> 8) as u8;
        buf[2] = (shifted & 0xFF) as u8;
    }
}

impl Transport for MockTransport {
    fn exchange(&mut self, channel: Channel, buf: &mut [u8]) -> Result<()> {
        match channel {
            Channel::Display => {
                self.frames.push(Frame::Display(buf.to_vec()));
                self.display_exchange(buf);
            }
            Channel::Touch => {
                self.frames.push(Frame::Touch(buf.to_vec()));
                self.touch_exchange(buf);
            }
        }
        Ok(())
    }

    fn write_pin(&mut self, pin: ControlPin, level: Level) -> Result<()> {
        self.pins.push((pin, level));
        Ok(())
    }

    fn read_pin(&mut self, _pin: ControlPin) -> Result<Level> {
        let Some(g) = self.gestures.front_mut() else {
            return Ok(Level::High);
        };
        if !g.samples.is_empty() {
            return Ok(Level::Low);
        }
        g.release_polls = g.release_polls.saturating_sub(1);
        if g.release_polls == 0 {
            self.gestures.pop_front();
        }
        Ok(Level::High)
    }

    fn delay_us(&mut self, us: u32) {
        self.delays_us += us as u64;
    }
}
