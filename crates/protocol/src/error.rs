//! Protocol decode errors.

use thiserror::Error;

/// Frame decode error
///
/// Never fatal: the session reports the offending frame and keeps
/// processing subsequent traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Frame carried no payload bytes
    #[error("empty frame")]
    EmptyFrame,

    /// Payload matched no recognized prefix
    #[error("unrecognized frame: {payload:?}")]
    UnknownPrefix {
        /// Offending payload (lossy UTF-8)
        payload: String,
    },

    /// A tick field was missing or not a decimal integer
    #[error("invalid tick in frame: {payload:?}")]
    InvalidTick {
        /// Offending payload (lossy UTF-8)
        payload: String,
    },

    /// The sensor id was not a single decimal digit
    #[error("invalid sensor id in frame: {payload:?}")]
    InvalidSensorId {
        /// Offending payload (lossy UTF-8)
        payload: String,
    },
}

/// Protocol Result type alias
pub type Result<T> = std::result::Result<T, DecodeError>;
