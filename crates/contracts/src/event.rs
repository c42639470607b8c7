//! Session events delivered to the external caller.

use std::fmt;

use bytes::Bytes;

use crate::{LightState, SensorRecord};

/// Why a session left the connected state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The transport reached end-of-stream
    Eof,
    /// A transport-level read error
    Io(String),
    /// No `HI` arrived within the configured handshake window
    HandshakeTimeout,
    /// The caller closed the session
    Closed,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eof => write!(f, "transport closed"),
            Self::Io(message) => write!(f, "transport error: {message}"),
            Self::HandshakeTimeout => write!(f, "handshake timed out"),
            Self::Closed => write!(f, "session closed by caller"),
        }
    }
}

/// Typed event stream from the transport session to its single subscriber.
///
/// Replaces the callback style of the source system: the caller holds the
/// one receiver handed out at connect time and matches on these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Handshake acknowledged by the controller
    Connected,

    /// Session left the connected state; emitted exactly once per session
    Disconnected { reason: DisconnectReason },

    /// Controller reported a protocol error (`$E`); the session stays
    /// open, the controller expects a power cycle
    ProtocolError,

    /// Light acknowledgement applied to the state machine
    LightChanged(LightState),

    /// A debounce-accepted sensor trigger with computed elapsed time
    Record(SensorRecord),

    /// A frame that matched no known message shape; state unchanged
    DecodeFailure { frame: Bytes },
}
