//! Session error types.

use thiserror::Error;

/// Session error
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session's worker tasks have shut down; no further commands are
    /// accepted
    #[error("session closed")]
    Closed,

    /// A single outbound write failed; the session remains open and the
    /// caller may retry the command
    #[error("write failed: {message}")]
    WriteFailed {
        /// Underlying transport error
        message: String,
    },

    /// A pending write was abandoned because the session shut down
    #[error("write abandoned during shutdown")]
    WriteAbandoned,
}

/// Session Result type alias
pub type Result<T> = std::result::Result<T, SessionError>;
