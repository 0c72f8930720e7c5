//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();
/// Watchdog limit of the current run (for JSON error details).
pub static LAST_MAX_RUN_MS: OnceLock<u64> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "blinds", version, about = "Time-based blinds controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/blinds.toml")]
    pub config: PathBuf,

    /// Log and print results as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Commands {
    /// Fully open the cover
    Open,
    /// Fully close the cover
    Close,
    /// Stop any motion
    Stop,
    /// Move the cover to a position (0 = closed, 100 = open)
    SetPosition {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        position: u8,
    },
    /// Fully open the slats
    OpenTilt,
    /// Fully close the slats
    CloseTilt,
    /// Move the slats to a tilt position
    SetTilt {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        position: u8,
    },
    /// Overwrite the estimated position without moving (after manual calibration)
    SetKnownPosition {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        position: u8,
    },
    /// Overwrite the estimated tilt position without moving
    SetKnownTilt {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        position: u8,
    },
    /// Print the saved state
    Status,
    /// Quick health check (switch backend and config)
    SelfCheck,
}

impl Commands {
    pub fn name(self) -> &'static str {
        match self {
            Commands::Open => "open",
            Commands::Close => "close",
            Commands::Stop => "stop",
            Commands::SetPosition { .. } => "set-position",
            Commands::OpenTilt => "open-tilt",
            Commands::CloseTilt => "close-tilt",
            Commands::SetTilt { .. } => "set-tilt",
            Commands::SetKnownPosition { .. } => "set-known-position",
            Commands::SetKnownTilt { .. } => "set-known-tilt",
            Commands::Status => "status",
            Commands::SelfCheck => "self-check",
        }
    }
}
