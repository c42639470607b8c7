//! Layered error definitions
//!
//! Categorized by source: transport / protocol / config / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ControllerError {
    // ===== Transport Errors =====
    /// No duplex transport capability is present (e.g. serial support not
    /// compiled in); not retriable without user action
    #[error("transport unavailable: {message}")]
    TransportUnavailable { message: String },

    /// Opening the transport failed (device busy, missing, permission);
    /// the caller may retry connect
    #[error("failed to open transport '{port}': {message}")]
    TransportOpen { port: String, message: String },

    /// Mid-session link loss; forces the session to idle, never retried
    /// automatically
    #[error("transport disconnected: {message}")]
    TransportDisconnect { message: String },

    /// A single outbound write failed; the session remains open
    #[error("write failed: {message}")]
    Write { message: String },

    // ===== Protocol Errors =====
    /// A frame matched no known message shape
    #[error("unrecognized frame: {frame:?}")]
    Decode { frame: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sink Errors =====
    /// Record sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ControllerError {
    /// Create transport-unavailable error
    pub fn transport_unavailable(message: impl Into<String>) -> Self {
        Self::TransportUnavailable {
            message: message.into(),
        }
    }

    /// Create transport-open error
    pub fn transport_open(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportOpen {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Create disconnect error
    pub fn disconnect(message: impl Into<String>) -> Self {
        Self::TransportDisconnect {
            message: message.into(),
        }
    }

    /// Create write error
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
