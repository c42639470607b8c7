//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::RaceMode;
use std::path::PathBuf;

/// Race Lights - serial race-timing traffic-light controller
#[derive(Parser, Debug)]
#[command(
    name = "race-lights",
    author,
    version,
    about = "Race-timing traffic-light controller",
    long_about = "Drives the start-light controller over its serial link: sends light \n\
                  commands, decodes acknowledgements and sensor triggers, and turns \n\
                  controller tick counts into elapsed race times for acceleration, \n\
                  skidpad, and gymkhana runs."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RACE_LIGHTS_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RACE_LIGHTS_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to the controller and time a run
    Run(RunArgs),

    /// Validate configuration file without connecting
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "race.toml", env = "RACE_LIGHTS_CONFIG")]
    pub config: PathBuf,

    /// Override serial port path from configuration
    #[arg(long, env = "RACE_LIGHTS_PORT")]
    pub port: Option<String>,

    /// Override baud rate from configuration
    #[arg(long, env = "RACE_LIGHTS_BAUD")]
    pub baud: Option<u32>,

    /// Override race discipline from configuration
    #[arg(long, value_enum, env = "RACE_LIGHTS_MODE")]
    pub mode: Option<ModeArg>,

    /// Run against the built-in mock controller instead of a serial port
    #[arg(long)]
    pub mock: bool,

    /// Stop after this many seconds (0 = run until Ctrl-C)
    #[arg(long, default_value = "0", env = "RACE_LIGHTS_DURATION")]
    pub duration: u64,

    /// Show a live elapsed clock while a run is active (display only)
    #[arg(long)]
    pub live_clock: bool,

    /// Metrics server port (0 = use config, which defaults to disabled)
    #[arg(long, default_value = "0", env = "RACE_LIGHTS_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "race.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "race.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Race discipline argument
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg {
    /// Acceleration run (start gate defines time zero)
    Accel,
    /// Skidpad (start gate defines time zero)
    Skidpad,
    /// Gymkhana (green light defines time zero)
    Gymkhana,
}

impl From<ModeArg> for RaceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Accel => RaceMode::Accel,
            ModeArg::Skidpad => RaceMode::Skidpad,
            ModeArg::Gymkhana => RaceMode::Gymkhana,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
