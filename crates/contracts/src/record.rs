//! Sensor identifiers and timed run records.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Tick;

/// Single-digit track sensor identifier (0-9).
///
/// The wire grammar reserves exactly one decimal digit for the sensor id;
/// anything else is a decode failure, never remapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(u8);

impl SensorId {
    /// The start-gate sensor for acceleration and skidpad runs.
    pub const START_GATE: SensorId = SensorId(1);

    /// Create a sensor id, rejecting anything outside 0-9.
    pub fn new(id: u8) -> Option<Self> {
        (id <= 9).then_some(Self(id))
    }

    /// Create a sensor id from a single ASCII digit.
    pub fn from_ascii_digit(byte: u8) -> Option<Self> {
        byte.is_ascii_digit().then(|| Self(byte - b'0'))
    }

    /// The numeric id (0-9).
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One timed sensor trigger within a run.
///
/// Append-only per run; the sequence is cleared on every green transition
/// and on explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Which track sensor fired
    pub sensor: SensorId,

    /// Raw controller tick of the trigger
    pub tick: Tick,

    /// Ticks elapsed since the run's start reference (or green anchor
    /// when no start reference was set)
    pub elapsed_ticks: u64,

    /// Host wall clock when the trigger was observed (logging/display only)
    pub wall: DateTime<Utc>,
}

impl SensorRecord {
    /// Elapsed race time. One tick is one millisecond.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_id_range() {
        assert_eq!(SensorId::new(0).unwrap().get(), 0);
        assert_eq!(SensorId::new(9).unwrap().get(), 9);
        assert!(SensorId::new(10).is_none());
    }

    #[test]
    fn test_sensor_id_from_ascii() {
        assert_eq!(SensorId::from_ascii_digit(b'3').unwrap().get(), 3);
        assert!(SensorId::from_ascii_digit(b'x').is_none());
        assert!(SensorId::from_ascii_digit(b' ').is_none());
    }

    #[test]
    fn test_record_elapsed() {
        let record = SensorRecord {
            sensor: SensorId::START_GATE,
            tick: 1500,
            elapsed_ticks: 500,
            wall: Utc::now(),
        };
        assert_eq!(record.elapsed(), Duration::from_millis(500));
    }

    #[test]
    fn test_record_serde() {
        let record = SensorRecord {
            sensor: SensorId::new(2).unwrap(),
            tick: 2000,
            elapsed_ticks: 1000,
            wall: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: SensorRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
