//! Configuration schemas shared between the config loader, session, and CLI.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::RaceMode;

/// Default serial baud rate for the traffic-light controller.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Default sensor cooldown window in milliseconds.
pub const DEFAULT_COOLDOWN_MS: u64 = 1_000;

/// Default session event channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Top-level configuration for a timing session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RaceConfig {
    /// Serial port parameters
    #[validate(nested)]
    pub port: PortConfig,

    /// Timing behavior
    #[validate(nested)]
    #[serde(default)]
    pub timing: TimingConfig,

    /// Session plumbing
    #[validate(nested)]
    #[serde(default)]
    pub session: SessionSection,

    /// Metrics exporter (None = disabled)
    #[serde(default)]
    pub metrics: MetricsSection,

    /// Record sink selection
    #[serde(default)]
    pub sinks: SinksSection,
}

/// Serial port parameters (transport configuration, not protocol state).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PortConfig {
    /// Device path, e.g. `/dev/ttyUSB0`
    #[validate(length(min = 1, message = "port path must not be empty"))]
    pub path: String,

    /// Baud rate; the controller speaks 115200 8N1
    #[serde(default = "default_baud")]
    #[validate(range(min = 9600, max = 921_600, message = "baud out of range"))]
    pub baud: u32,
}

fn default_baud() -> u32 {
    DEFAULT_BAUD
}

/// Timing behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TimingConfig {
    /// Race discipline; selects the start-reference policy
    #[serde(default = "default_mode")]
    pub mode: RaceMode,

    /// Sensor cooldown window in milliseconds
    #[serde(default = "default_cooldown_ms")]
    #[validate(range(min = 1, message = "cooldown must be at least 1 ms"))]
    pub cooldown_ms: u64,
}

fn default_mode() -> RaceMode {
    RaceMode::Accel
}

fn default_cooldown_ms() -> u64 {
    DEFAULT_COOLDOWN_MS
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

/// Session plumbing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionSection {
    /// Event channel capacity
    #[serde(default = "default_channel_capacity")]
    #[validate(range(min = 1, message = "channel capacity must be at least 1"))]
    pub channel_capacity: usize,

    /// Optional bound on the HELLO -> HI handshake in milliseconds.
    /// Absent = wait forever, matching the controller's observed behavior.
    #[serde(default)]
    pub handshake_timeout_ms: Option<u64>,
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            handshake_timeout_ms: None,
        }
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSection {
    /// Prometheus listener port (None = disabled)
    #[serde(default)]
    pub port: Option<u16>,
}

/// Record sink selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinksSection {
    /// Print records to the console
    #[serde(default = "default_true")]
    pub console: bool,

    /// Append records as JSON lines to this file
    #[serde(default)]
    pub jsonl: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for SinksSection {
    fn default() -> Self {
        Self {
            console: true,
            jsonl: None,
        }
    }
}

/// Runtime session configuration derived from [`RaceConfig`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sensor cooldown window
    pub cooldown: Duration,

    /// Optional handshake bound (None = no timeout)
    pub handshake_timeout: Option<Duration>,

    /// Event channel capacity
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
            handshake_timeout: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl RaceConfig {
    /// Derive the runtime session configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            cooldown: Duration::from_millis(self.timing.cooldown_ms),
            handshake_timeout: self
                .session
                .handshake_timeout_ms
                .map(Duration::from_millis),
            channel_capacity: self.session.channel_capacity,
        }
    }
}
