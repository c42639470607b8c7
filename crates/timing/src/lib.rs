//! # Timing
//!
//! Race timing core: light/run state machine, tick-domain clock
//! correlation, and sensor debounce.
//!
//! The state machine consumes decoded controller messages in strict
//! arrival order and produces at most one session event per message.
//! Elapsed times are pure tick arithmetic against the run's start
//! reference; host clocks are used for debounce and display only.

mod clock;
mod cooldown;
mod state;

pub use clock::{elapsed_ticks, format_clock};
pub use cooldown::CooldownGate;
pub use state::RaceTimer;
