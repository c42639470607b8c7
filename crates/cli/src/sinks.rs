//! Record sinks: console table and JSON-lines file.

use std::path::Path;

use contracts::{ControllerError, RecordSink, SensorRecord};
use timing::format_clock;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, instrument};

/// Sink that prints one human-readable line per record.
pub struct ConsoleSink {
    name: String,
}

impl ConsoleSink {
    /// Create a new ConsoleSink with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl RecordSink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, record: &SensorRecord) -> Result<(), ControllerError> {
        println!(
            "  sensor {}  {}  (tick {}, {})",
            record.sensor,
            format_clock(record.elapsed()),
            record.tick,
            record.wall.format("%H:%M:%S%.3f"),
        );
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ControllerError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ControllerError> {
        Ok(())
    }
}

/// Sink that appends one JSON object per record to a file.
///
/// The local stand-in for the controller-log endpoint the race officials
/// archive records to.
pub struct JsonlSink {
    name: String,
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Open (or create) the file and append from its end.
    pub async fn open(name: impl Into<String>, path: &Path) -> Result<Self, ControllerError> {
        let name = name.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| ControllerError::sink_write(&name, e.to_string()))?;

        info!(sink = %name, path = %path.display(), "jsonl sink opened");
        Ok(Self {
            name,
            writer: BufWriter::new(file),
        })
    }
}

impl RecordSink for JsonlSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "jsonl_sink_write", skip(self, record), fields(sink = %self.name))]
    async fn write(&mut self, record: &SensorRecord) -> Result<(), ControllerError> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| ControllerError::sink_write(&self.name, e.to_string()))?;
        line.push('\n');

        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ControllerError::sink_write(&self.name, e.to_string()))
    }

    async fn flush(&mut self) -> Result<(), ControllerError> {
        self.writer
            .flush()
            .await
            .map_err(|e| ControllerError::sink_write(&self.name, e.to_string()))
    }

    async fn close(&mut self) -> Result<(), ControllerError> {
        self.flush().await?;
        info!(sink = %self.name, "jsonl sink closed");
        Ok(())
    }
}

/// The set of sinks configured for a run.
pub struct RecordSinks {
    console: Option<ConsoleSink>,
    jsonl: Option<JsonlSink>,
}

impl RecordSinks {
    /// Build sinks from configuration.
    pub async fn from_config(config: &contracts::SinksSection) -> Result<Self, ControllerError> {
        let console = config.console.then(|| ConsoleSink::new("console"));
        let jsonl = match &config.jsonl {
            Some(path) => Some(JsonlSink::open("jsonl", Path::new(path)).await?),
            None => None,
        };
        Ok(Self { console, jsonl })
    }

    /// Fan one record out to every configured sink. Sink failures are
    /// logged, never fatal to the run.
    pub async fn write(&mut self, record: &SensorRecord) {
        if let Some(sink) = &mut self.console {
            if let Err(e) = sink.write(record).await {
                tracing::error!(sink = sink.name(), error = %e, "record write failed");
            }
        }
        if let Some(sink) = &mut self.jsonl {
            if let Err(e) = sink.write(record).await {
                tracing::error!(sink = sink.name(), error = %e, "record write failed");
            }
        }
    }

    /// Flush and close all sinks.
    pub async fn close(&mut self) {
        if let Some(sink) = &mut self.console {
            let _ = sink.close().await;
        }
        if let Some(sink) = &mut self.jsonl {
            let _ = sink.close().await;
        }
    }
}
