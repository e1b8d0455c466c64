//! Command-line interface for MercSim
//!
//! Headless simulation of configured battles, or a check of the data files.

use clap::Parser;
use std::path::PathBuf;

/// Auto-battle simulation core
#[derive(Parser, Debug)]
#[command(name = "mercsim")]
#[command(about = "Auto-battle simulation core")]
#[command(version)]
pub struct Args {
    /// Run in headless mode with the specified JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Unit templates file (overrides the match config)
    #[arg(long, value_name = "UNITS_FILE")]
    pub units: Option<PathBuf>,

    /// Stages file (overrides the match config)
    #[arg(long, value_name = "STAGES_FILE")]
    pub stages: Option<PathBuf>,

    /// Output path for match log (headless mode only)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum match duration in seconds (headless mode only)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Tick at wall-clock speed inside a bevy app instead of as fast as possible
    #[arg(long)]
    pub realtime: bool,

    /// Playback speed multiplier for --realtime (0.5 = half, 2.0 = double)
    #[arg(long, default_value_t = 1.0, value_parser = parse_speed)]
    pub speed: f32,
}

pub fn parse_args() -> Args {
    Args::parse()
}

/// A realtime match at speed 0 would never advance, so only positive speeds
/// are accepted.
fn parse_speed(value: &str) -> Result<f32, String> {
    let speed: f32 = value.parse().map_err(|e| format!("{}", e))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("speed must be a positive number, got {}", value))
    }
}
