//! HY28 Panel Driver
//!
//! Drives the HY28A-LCDB touch panel on a Raspberry Pi: initialization,
//! touch calibration, drawing and touch tracking.

mod config;
mod device;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hy28_panel_hw::{
    Bitmap, Color, DrawBitmap, InitReport, MonoFontGlyphs, Orientation, Rasterizer, Transport,
};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use device::LinuxPanel;

#[derive(Parser)]
#[command(name = "hy28panel")]
#[command(about = "Driver for the HY28A touch panel")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured orientation: portrait or landscape
    #[arg(long)]
    orientation: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show controller information
    Info,
    /// Clear the display to a solid color
    Clear {
        /// Color in hex format (e.g., #FF0000 for red)
        #[arg(long, default_value = "#000000")]
        color: String,
    },
    /// Run touch calibration and print the matrix
    Calibrate,
    /// Draw the test pattern
    Demo {
        /// Bitmap to draw at (50, 200) after the shapes
        #[arg(long)]
        image: Option<PathBuf>,

        /// Pause between steps in milliseconds
        #[arg(long, default_value = "1000")]
        step_ms: u64,
    },
    /// Calibrate, then draw a dot wherever the panel is touched
    Track,
    /// Draw a 24-bit BMP file
    Image {
        /// BMP file path
        path: PathBuf,

        #[arg(long, default_value = "0")]
        x: u16,

        #[arg(long, default_value = "0")]
        y: u16,
    },
    /// Write the effective configuration to a file
    WriteConfig {
        /// Output file path
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            info!("Loaded configuration from: {}", path.display());
            config
        }
        None => Config::default(),
    };
    if let Some(orientation) = cli.orientation {
        config.orientation = orientation;
    }
    let orientation = config.orientation()?;

    match cli.command {
        Commands::Info => {
            let (_, report) = open_panel(&config, orientation)?;
            let (width, height) = orientation.dimensions();
            println!("Device code: 0x{:04X}", report.device_code);
            println!("Controller:  {:?}", report.identity);
            println!("Orientation: {} ({}x{})", orientation, width, height);
            if !report.identity.is_known() {
                warn!("Controller did not identify as ILI9320/ILI9300");
            }
        }
        Commands::Clear { color } => {
            let color: Color = color.parse()?;
            let (mut panel, _) = open_panel(&config, orientation)?;
            panel.clear(color)?;
            println!("Display cleared to: {}", color);
        }
        Commands::Calibrate => {
            let (mut panel, _) = open_panel(&config, orientation)?;
            let glyphs = MonoFontGlyphs::new();
            let matrix = panel.calibrate(&glyphs, config.touch.calibration_timeout())?;
            let [a, b, c, d, e, f] = matrix.coefficients();
            println!("divider: {}", matrix.divider());
            println!("x = ({} * xs + {} * ys + {}) / divider", a, b, c);
            println!("y = ({} * xs + {} * ys + {}) / divider", d, e, f);
        }
        Commands::Demo { image, step_ms } => {
            let (mut panel, _) = open_panel(&config, orientation)?;
            run_demo(&mut panel, image.as_deref(), Duration::from_millis(step_ms))?;
        }
        Commands::Track => {
            let (mut panel, _) = open_panel(&config, orientation)?;
            let glyphs = MonoFontGlyphs::new();
            panel.calibrate(&glyphs, config.touch.calibration_timeout())?;
            info!("Calibrated, tracking touches");
            track(&mut panel)?;
        }
        Commands::Image { path, x, y } => {
            let bitmap = Bitmap::open(&path)
                .with_context(|| format!("Failed to load bitmap {}", path.display()))?;
            let (mut panel, _) = open_panel(&config, orientation)?;
            panel.put_image(x, y, &bitmap)?;
            println!("Drew {} at ({}, {})", path.display(), x, y);
        }
        Commands::WriteConfig { output } => {
            config.save(&output)?;
            println!("Configuration written to: {}", output.display());
        }
    }

    Ok(())
}

/// Opens, resets and initializes the panel.
fn open_panel(config: &Config, orientation: Orientation) -> Result<(LinuxPanel, InitReport)> {
    let mut panel = device::open(config).context("Failed to open panel devices")?;
    panel.reset().context("Failed to reset panel")?;
    let report = panel
        .init(orientation)
        .context("Failed to initialize panel")?;
    Ok((panel, report))
}

/// Text, line, box and circle, then a display off/on cycle and an optional
/// bitmap.
fn run_demo(panel: &mut LinuxPanel, image: Option<&Path>, step: Duration) -> Result<()> {
    let glyphs = MonoFontGlyphs::new();
    panel.draw_text(&glyphs, 50, 50, "Testing touch!", Color::MAGENTA, Color::YELLOW)?;
    panel.draw_line(0, 0, 240, 320, Color::WHITE)?;
    panel.draw_box(10, 5, 30, 20, Color::WHITE, Some(Color::BLUE))?;
    panel.draw_circle_fill(100, 100, 31, Color::BLUE, Color::WHITE)?;
    thread::sleep(step);

    panel.display_off()?;
    thread::sleep(step);
    panel.display_on()?;
    thread::sleep(step);

    if let Some(path) = image {
        let bitmap = Bitmap::open(path)
            .with_context(|| format!("Failed to load bitmap {}", path.display()))?;
        panel.put_image(50, 200, &bitmap)?;
    }
    Ok(())
}

/// Draws a feedback dot at every accepted touch, forever.
fn track(panel: &mut LinuxPanel) -> Result<()> {
    let interval = panel.touch_settings().poll_interval_us;
    loop {
        match panel.poll_touch()? {
            Some(point) => {
                panel.draw_touch_point(point.x as i32, point.y as i32, Color::RED)?;
            }
            None => panel.transport_mut().delay_us(interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_image() {
        let cli = Cli::parse_from(["hy28panel", "image", "test2.bmp", "--x", "50", "--y", "200"]);
        match cli.command {
            Commands::Image { path, x, y } => {
                assert_eq!(path, PathBuf::from("test2.bmp"));
                assert_eq!((x, y), (50, 200));
            }
            _ => panic!("expected image command"),
        }
    }

    #[test]
    fn test_orientation_override() {
        let cli = Cli::parse_from(["hy28panel", "--orientation", "landscape", "-v", "info"]);
        assert!(cli.verbose);
        let mut config = Config::default();
        config.orientation = cli.orientation.unwrap();
        assert_eq!(config.orientation().unwrap(), Orientation::Landscape);
    }
}
