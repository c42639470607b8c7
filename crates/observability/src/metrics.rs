//! Session event metrics and per-run summaries.

use std::collections::HashMap;
use std::time::Duration;

use contracts::{SensorId, SensorRecord, SessionEvent};

/// Bump the pipeline metrics for one session event.
///
/// The lower layers already count their own internals (frames, decode
/// failures, suppressed triggers); this covers the caller-visible stream.
pub fn record_session_event(event: &SessionEvent) {
    match event {
        SessionEvent::Connected => {
            metrics::counter!("session_connects_total").increment(1);
        }
        SessionEvent::Disconnected { .. } => {
            // Counted by the session itself; nothing extra here.
        }
        SessionEvent::ProtocolError => {
            metrics::counter!("controller_protocol_errors_total").increment(1);
        }
        SessionEvent::LightChanged(state) => {
            metrics::counter!("light_changes_total", "state" => state.label()).increment(1);
        }
        SessionEvent::Record(record) => {
            metrics::counter!("sensor_records_total", "sensor" => record.sensor.to_string())
                .increment(1);
            metrics::histogram!("sensor_elapsed_seconds").record(record.elapsed().as_secs_f64());
        }
        SessionEvent::DecodeFailure { .. } => {
            metrics::counter!("decode_failures_total").increment(1);
        }
    }
}

/// Per-sensor aggregate over one run.
#[derive(Debug, Clone, Default)]
pub struct SensorSummary {
    /// Accepted trigger count
    pub count: u64,
    /// Fastest elapsed time seen
    pub best: Option<Duration>,
    /// Slowest elapsed time seen
    pub worst: Option<Duration>,
}

/// Folds the record stream into end-of-run statistics.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    sensors: HashMap<SensorId, SensorSummary>,
    total_records: u64,
    decode_failures: u64,
    protocol_errors: u64,
}

impl RunSummary {
    /// Create an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the summary.
    pub fn update(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Record(record) => self.add_record(record),
            SessionEvent::DecodeFailure { .. } => self.decode_failures += 1,
            SessionEvent::ProtocolError => self.protocol_errors += 1,
            _ => {}
        }
    }

    fn add_record(&mut self, record: &SensorRecord) {
        self.total_records += 1;
        let elapsed = record.elapsed();
        let entry = self.sensors.entry(record.sensor).or_default();
        entry.count += 1;
        entry.best = Some(entry.best.map_or(elapsed, |b| b.min(elapsed)));
        entry.worst = Some(entry.worst.map_or(elapsed, |w| w.max(elapsed)));
    }

    /// Total accepted records.
    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    /// Decode failures observed.
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures
    }

    /// Controller protocol errors observed.
    pub fn protocol_errors(&self) -> u64 {
        self.protocol_errors
    }

    /// Per-sensor summaries, sorted by sensor id.
    pub fn sensors(&self) -> Vec<(SensorId, &SensorSummary)> {
        let mut sensors: Vec<_> = self.sensors.iter().map(|(id, s)| (*id, s)).collect();
        sensors.sort_by_key(|(id, _)| id.get());
        sensors
    }
}
