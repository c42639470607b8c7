//! Light state and tick/host clock correlation anchors.

use std::time::Instant;

use chrono::{DateTime, Utc};

/// Controller tick count.
///
/// Monotonically increasing counter maintained by the controller's own
/// hardware timer, one tick per millisecond. Immune to host scheduling
/// jitter, which is why tick deltas (not host timestamp deltas) are the
/// timing of record.
pub type Tick = u64;

/// A (tick, host time) pair captured at the instant a controller
/// acknowledgement was observed.
///
/// This is the single bridge between the controller's tick domain and the
/// host clock domain for one run: `at` feeds monotonic host-side math
/// (debounce, live clock), `wall` feeds logging and record sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickAnchor {
    /// Controller tick at the moment of observation
    pub tick: Tick,

    /// Host monotonic clock at the moment of observation
    pub at: Instant,

    /// Host wall clock at the moment of observation
    pub wall: DateTime<Utc>,
}

impl TickAnchor {
    /// Capture an anchor for `tick` at the current host time.
    pub fn now(tick: Tick) -> Self {
        Self {
            tick,
            at: Instant::now(),
            wall: Utc::now(),
        }
    }
}

/// Traffic light state as acknowledged by the controller.
///
/// Mutated only by decoded controller messages routed through the timing
/// state machine. `Green` carries the correlation anchor for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightState {
    /// Light off, no run active
    #[default]
    Off,

    /// Run active; anchor captured when `OK G<tick>` was received
    Green(TickAnchor),

    /// Run ended by red light
    Red,
}

impl LightState {
    /// Whether a run is currently active.
    pub fn is_green(&self) -> bool {
        matches!(self, Self::Green(_))
    }

    /// The green anchor, if a run is active.
    pub fn green_anchor(&self) -> Option<&TickAnchor> {
        match self {
            Self::Green(anchor) => Some(anchor),
            _ => None,
        }
    }

    /// Short label for logs and displays.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Green(_) => "green",
            Self::Red => "red",
        }
    }
}
