//! RecordSink trait - record consumer interface
//!
//! Defines the abstract interface for timed-record consumers.

use crate::{ControllerError, SensorRecord};

/// Record output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(RecordSink: Send)]
pub trait LocalRecordSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one timed record
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, record: &SensorRecord) -> Result<(), ControllerError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ControllerError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ControllerError>;
}
