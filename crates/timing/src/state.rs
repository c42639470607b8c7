//! Light/run state machine.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use contracts::{
    ControllerMessage, LightState, RaceMode, SensorId, SensorRecord, SessionEvent, TickAnchor,
};
use tracing::{debug, instrument, trace};

use crate::clock;
use crate::cooldown::CooldownGate;

/// Race timer state machine.
///
/// Consumes decoded controller messages in strict arrival order and
/// produces at most one [`SessionEvent`] per message. All per-run state
/// (light beyond off, start reference, record history) is scoped to one
/// light cycle: created on green, discarded on the next green, red, off,
/// explicit reset, or disconnect.
#[derive(Debug)]
pub struct RaceTimer {
    mode: RaceMode,
    light: LightState,
    start: Option<TickAnchor>,
    records: Vec<SensorRecord>,
    cooldown: CooldownGate,
    handshaken: bool,
}

impl RaceTimer {
    /// Create a timer for the given discipline and cooldown window.
    pub fn new(mode: RaceMode, cooldown_window: Duration) -> Self {
        Self {
            mode,
            light: LightState::Off,
            start: None,
            records: Vec::new(),
            cooldown: CooldownGate::new(cooldown_window),
            handshaken: false,
        }
    }

    /// Apply a decoded message, observing host time now.
    pub fn apply(&mut self, message: ControllerMessage) -> Option<SessionEvent> {
        self.apply_at(message, Instant::now(), Utc::now())
    }

    /// Apply a decoded message with an explicit host observation time.
    #[instrument(level = "trace", name = "race_timer_apply", skip(self, at, wall))]
    pub fn apply_at(
        &mut self,
        message: ControllerMessage,
        at: Instant,
        wall: DateTime<Utc>,
    ) -> Option<SessionEvent> {
        match message {
            ControllerMessage::Hi => self.on_handshake(),
            ControllerMessage::Green { tick } => Some(self.on_green(TickAnchor { tick, at, wall })),
            ControllerMessage::Red => Some(self.on_light(LightState::Red)),
            ControllerMessage::Off => Some(self.on_light(LightState::Off)),
            ControllerMessage::Sensor { sensor, tick } => self.on_sensor(sensor, tick, at, wall),
            ControllerMessage::ProtocolError => {
                metrics::counter!("timing_protocol_errors_total").increment(1);
                Some(SessionEvent::ProtocolError)
            }
        }
    }

    /// Handshake acknowledgement; idempotent after the first.
    fn on_handshake(&mut self) -> Option<SessionEvent> {
        if self.handshaken {
            trace!("duplicate handshake acknowledgement");
            return None;
        }
        self.handshaken = true;
        debug!("controller handshake complete");
        Some(SessionEvent::Connected)
    }

    /// Green always resets run state, by contract: a duplicate green is a
    /// fresh run, not a no-op.
    fn on_green(&mut self, anchor: TickAnchor) -> SessionEvent {
        self.clear_run();
        self.light = LightState::Green(anchor);
        if self.mode.starts_at_green() {
            self.start = Some(anchor);
        }

        debug!(tick = anchor.tick, mode = %self.mode, "light green, run armed");
        metrics::counter!("timing_light_transitions_total", "state" => "green").increment(1);
        SessionEvent::LightChanged(self.light)
    }

    /// Red/off end the run; record history is retained until the next
    /// green or an explicit reset.
    fn on_light(&mut self, state: LightState) -> SessionEvent {
        self.light = state;
        debug!(state = state.label(), "light changed, run ended");
        metrics::counter!("timing_light_transitions_total", "state" => state.label()).increment(1);
        SessionEvent::LightChanged(self.light)
    }

    fn on_sensor(
        &mut self,
        sensor: SensorId,
        tick: u64,
        at: Instant,
        wall: DateTime<Utc>,
    ) -> Option<SessionEvent> {
        // Events outside a run are ignored entirely, not merely debounced.
        let Some(&green) = self.light.green_anchor() else {
            trace!(%sensor, tick, "sensor trigger outside green, ignored");
            metrics::counter!("timing_sensor_ignored_total").increment(1);
            return None;
        };

        if !self.cooldown.accept(sensor, at) {
            trace!(%sensor, tick, "sensor trigger within cooldown, suppressed");
            metrics::counter!("timing_sensor_suppressed_total").increment(1);
            return None;
        }

        // The first start-gate trigger defines time zero for disciplines
        // that do not start at green, so its own record reads elapsed 0.
        if self.start.is_none() && sensor == SensorId::START_GATE && !self.mode.starts_at_green() {
            self.start = Some(TickAnchor { tick, at, wall });
            debug!(tick, "start reference set by start gate");
        }

        let elapsed_ticks = clock::elapsed_ticks(tick, self.start.as_ref(), &green);
        let record = SensorRecord {
            sensor,
            tick,
            elapsed_ticks,
            wall,
        };
        self.records.push(record);

        debug!(%sensor, tick, elapsed_ticks, "sensor record");
        metrics::counter!("timing_records_total", "sensor" => sensor.to_string()).increment(1);
        Some(SessionEvent::Record(record))
    }

    /// Clear per-run state without touching the light (explicit reset;
    /// the session also transmits `X`).
    pub fn reset_run(&mut self) {
        self.clear_run();
        debug!("run state reset");
    }

    /// Force idle after a transport disconnect: light off, handshake and
    /// all per-run state cleared.
    pub fn handle_disconnect(&mut self) {
        self.light = LightState::Off;
        self.handshaken = false;
        self.clear_run();
        debug!("state forced idle by disconnect");
    }

    fn clear_run(&mut self) {
        self.records.clear();
        self.start = None;
        self.cooldown.clear();
    }

    /// Change discipline. Callers set this before a run; changing it
    /// mid-run does not retroactively move the start reference.
    pub fn set_mode(&mut self, mode: RaceMode) {
        self.mode = mode;
    }

    /// Current discipline.
    pub fn mode(&self) -> RaceMode {
        self.mode
    }

    /// Current light state.
    pub fn light(&self) -> LightState {
        self.light
    }

    /// Records accumulated in the current run, oldest first.
    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    /// The run's start reference, if set.
    pub fn start_reference(&self) -> Option<&TickAnchor> {
        self.start.as_ref()
    }

    /// Whether the controller acknowledged the handshake.
    pub fn is_handshaken(&self) -> bool {
        self.handshaken
    }
}
