//! Opens the panel on Linux spidev and GPIO character devices.

use anyhow::{Context, Result};
use hy28_panel_hw::{HalTransport, Panel};
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, Delay, SpidevDevice};
use tracing::{debug, info};

use crate::config::Config;

pub type LinuxTransport =
    HalTransport<SpidevDevice, SpidevDevice, CdevPin, CdevPin, CdevPin, Delay>;

pub type LinuxPanel = Panel<LinuxTransport>;

fn open_spi(path: &str, hz: u32, mode: SpiModeFlags) -> Result<SpidevDevice> {
    let mut spi =
        SpidevDevice::open(path).with_context(|| format!("opening SPI device {}", path))?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(hz)
        .mode(mode)
        .build();
    spi.configure(&options)
        .with_context(|| format!("configuring SPI device {}", path))?;
    debug!("Opened {} at {} Hz", path, hz);
    Ok(spi)
}

fn request_line(
    chip: &mut Chip,
    offset: u32,
    flags: LineRequestFlags,
    default: u8,
    consumer: &str,
) -> Result<CdevPin> {
    let line = chip
        .get_line(offset)
        .with_context(|| format!("getting GPIO line {}", offset))?;
    let handle = line
        .request(flags, default, consumer)
        .with_context(|| format!("requesting GPIO line {} for {}", offset, consumer))?;
    CdevPin::new(handle).with_context(|| format!("creating pin for GPIO line {}", offset))
}

/// Opens both SPI channels and the three control lines.
pub fn open(config: &Config) -> Result<LinuxPanel> {
    let display = open_spi(
        &config.spi.display_device,
        config.spi.display_hz,
        SpiModeFlags::SPI_MODE_3,
    )?;
    let touch = open_spi(
        &config.spi.touch_device,
        config.spi.touch_hz,
        SpiModeFlags::SPI_MODE_0,
    )?;

    let mut chip = Chip::new(&config.gpio.chip)
        .with_context(|| format!("opening GPIO chip {}", config.gpio.chip))?;
    let reset = request_line(
        &mut chip,
        config.gpio.reset,
        LineRequestFlags::OUTPUT,
        1,
        "hy28panel-reset",
    )?;
    let backlight = request_line(
        &mut chip,
        config.gpio.backlight,
        LineRequestFlags::OUTPUT,
        0,
        "hy28panel-backlight",
    )?;
    let touch_ready = request_line(
        &mut chip,
        config.gpio.touch_ready,
        LineRequestFlags::INPUT,
        0,
        "hy28panel-touch",
    )?;

    info!(
        "Panel on {} + {}, GPIO reset={} backlight={} touch={}",
        config.spi.display_device,
        config.spi.touch_device,
        config.gpio.reset,
        config.gpio.backlight,
        config.gpio.touch_ready
    );

    let transport = HalTransport::new(display, touch, reset, backlight, touch_ready, Delay {});
    Ok(Panel::new(transport).with_touch_settings(config.touch.settings()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires HY28A hardware on a Raspberry Pi
    fn test_open_and_init() {
        let mut panel = open(&Config::default()).unwrap();
        panel.reset().unwrap();
        let report = panel.init(Default::default()).unwrap();
        assert!(report.identity.is_known());
    }
}
