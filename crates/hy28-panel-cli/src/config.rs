//! Configuration management.

use anyhow::{Context, Result};
use hy28_panel_hw::{Orientation, TouchSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Display orientation: "portrait" or "landscape"
    #[serde(default = "default_orientation")]
    pub orientation: String,

    /// SPI bus configuration
    #[serde(default)]
    pub spi: SpiConfig,

    /// GPIO line configuration
    #[serde(default)]
    pub gpio: GpioConfig,

    /// Touch sampling configuration
    #[serde(default)]
    pub touch: TouchConfig,
}

/// SPI device configuration. Each controller has its own chip select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiConfig {
    /// spidev node for the LCD controller
    #[serde(default = "default_display_device")]
    pub display_device: String,

    /// spidev node for the touch controller
    #[serde(default = "default_touch_device")]
    pub touch_device: String,

    /// LCD clock in Hz
    #[serde(default = "default_display_hz")]
    pub display_hz: u32,

    /// Touch clock in Hz
    #[serde(default = "default_touch_hz")]
    pub touch_hz: u32,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            display_device: default_display_device(),
            touch_device: default_touch_device(),
            display_hz: default_display_hz(),
            touch_hz: default_touch_hz(),
        }
    }
}

/// GPIO configuration, BCM line offsets on one chip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpioConfig {
    /// GPIO character device
    #[serde(default = "default_gpio_chip")]
    pub chip: String,

    #[serde(default = "default_reset_line")]
    pub reset: u32,

    #[serde(default = "default_backlight_line")]
    pub backlight: u32,

    /// Pen-down line, low while pressed
    #[serde(default = "default_touch_ready_line")]
    pub touch_ready: u32,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            chip: default_gpio_chip(),
            reset: default_reset_line(),
            backlight: default_backlight_line(),
            touch_ready: default_touch_ready_line(),
        }
    }
}

/// Touch sampling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchConfig {
    /// Outlier threshold in raw ADC counts
    #[serde(default = "default_threshold")]
    pub threshold: u16,

    /// Give up calibrating after this long; waits forever when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_timeout_ms: Option<u64>,

    /// Pause between touch polls in microseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_us: u32,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            calibration_timeout_ms: None,
            poll_interval_us: default_poll_interval(),
        }
    }
}

impl TouchConfig {
    pub fn settings(&self) -> TouchSettings {
        TouchSettings {
            threshold: self.threshold,
            poll_interval_us: self.poll_interval_us,
        }
    }

    pub fn calibration_timeout(&self) -> Option<Duration> {
        self.calibration_timeout_ms.map(Duration::from_millis)
    }
}

// Default value functions
fn default_orientation() -> String {
    "portrait".to_string()
}

fn default_display_device() -> String {
    "/dev/spidev0.0".to_string()
}

fn default_touch_device() -> String {
    "/dev/spidev0.1".to_string()
}

fn default_display_hz() -> u32 {
    31_250_000 // 250 MHz core / 8
}

fn default_touch_hz() -> u32 {
    3_906_250 // 250 MHz core / 64
}

fn default_gpio_chip() -> String {
    "/dev/gpiochip0".to_string()
}

fn default_reset_line() -> u32 {
    25
}

fn default_backlight_line() -> u32 {
    18
}

fn default_touch_ready_line() -> u32 {
    24
}

fn default_threshold() -> u16 {
    2
}

fn default_poll_interval() -> u32 {
    1000
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
        Ok(())
    }

    /// Parsed orientation.
    pub fn orientation(&self) -> Result<Orientation> {
        self.orientation
            .parse()
            .with_context(|| format!("Invalid orientation in configuration: {}", self.orientation))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orientation: default_orientation(),
            spi: SpiConfig::default(),
            gpio: GpioConfig::default(),
            touch: TouchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.orientation().unwrap(), Orientation::Portrait);
        assert_eq!(config.spi.display_device, "/dev/spidev0.0");
        assert_eq!(config.gpio.touch_ready, 24);
        assert_eq!(config.touch.calibration_timeout(), None);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            orientation = "landscape"

            [spi]
            touch_hz = 2000000

            [touch]
            threshold = 5
            calibration_timeout_ms = 30000
            "#,
        )
        .unwrap();
        assert_eq!(config.orientation().unwrap(), Orientation::Landscape);
        assert_eq!(config.spi.touch_hz, 2_000_000);
        assert_eq!(config.spi.display_hz, 31_250_000);
        assert_eq!(config.touch.settings().threshold, 5);
        assert_eq!(config.touch.settings().poll_interval_us, 1000);
        assert_eq!(
            config.touch.calibration_timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_bad_orientation() {
        let config: Config = toml::from_str(r#"orientation = "sideways""#).unwrap();
        assert!(config.orientation().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("hy28panel-{}.toml", std::process::id()));
        let mut config = Config::default();
        config.gpio.reset = 17;
        config.touch.calibration_timeout_ms = Some(5000);
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
