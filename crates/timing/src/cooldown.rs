//! Sensor trigger debounce.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use contracts::SensorId;

/// Per-sensor cooldown gate filtering mechanical bounce.
///
/// A trigger is suppressed when it lands strictly inside the cooldown
/// window of the sensor's last accepted trigger; one landing exactly at
/// the window boundary is accepted. Entries are overwritten on accept,
/// never removed individually.
#[derive(Debug)]
pub struct CooldownGate {
    window: Duration,
    last_accepted: HashMap<SensorId, Instant>,
}

impl CooldownGate {
    /// Create a gate with the given cooldown window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: HashMap::new(),
        }
    }

    /// Whether a trigger observed at `at` passes the gate. Accepting
    /// records `at` as the sensor's new last-accepted time.
    pub fn accept(&mut self, sensor: SensorId, at: Instant) -> bool {
        if let Some(&prev) = self.last_accepted.get(&sensor) {
            if at.duration_since(prev) < self.window {
                return false;
            }
        }
        self.last_accepted.insert(sensor, at);
        true
    }

    /// Forget all cooldown state (new run or explicit reset).
    pub fn clear(&mut self) {
        self.last_accepted.clear();
    }

    /// The configured cooldown window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(1000);

    fn sensor(id: u8) -> SensorId {
        SensorId::new(id).unwrap()
    }

    #[test]
    fn test_first_trigger_accepted() {
        let mut gate = CooldownGate::new(WINDOW);
        assert!(gate.accept(sensor(1), Instant::now()));
    }

    #[test]
    fn test_within_window_suppressed() {
        let mut gate = CooldownGate::new(WINDOW);
        let t0 = Instant::now();
        assert!(gate.accept(sensor(1), t0));
        assert!(!gate.accept(sensor(1), t0 + Duration::from_millis(999)));
    }

    #[test]
    fn test_boundary_accepted() {
        let mut gate = CooldownGate::new(WINDOW);
        let t0 = Instant::now();
        assert!(gate.accept(sensor(1), t0));
        // Exactly at the window boundary counts as past it.
        assert!(gate.accept(sensor(1), t0 + WINDOW));
    }

    #[test]
    fn test_sensors_independent() {
        let mut gate = CooldownGate::new(WINDOW);
        let t0 = Instant::now();
        assert!(gate.accept(sensor(1), t0));
        assert!(gate.accept(sensor(2), t0 + Duration::from_millis(10)));
    }

    #[test]
    fn test_suppressed_trigger_does_not_extend_window() {
        let mut gate = CooldownGate::new(WINDOW);
        let t0 = Instant::now();
        assert!(gate.accept(sensor(1), t0));
        assert!(!gate.accept(sensor(1), t0 + Duration::from_millis(900)));
        // Window still measured from t0, not the suppressed trigger.
        assert!(gate.accept(sensor(1), t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn test_clear_forgets_history() {
        let mut gate = CooldownGate::new(WINDOW);
        let t0 = Instant::now();
        assert!(gate.accept(sensor(1), t0));
        gate.clear();
        assert!(gate.accept(sensor(1), t0 + Duration::from_millis(1)));
    }
}
