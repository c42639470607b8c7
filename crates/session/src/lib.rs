//! # Session
//!
//! Transport session for the traffic-light controller.
//!
//! Responsibilities:
//! - Own the duplex transport for its whole lifetime
//! - Run one continuous read task: bytes -> framer -> decoder -> race timer
//! - Serialize all outbound writes through a single-writer command queue
//! - Issue the `HELLO` handshake on open; surface `HI` as `Connected`
//! - Detect transport loss, force the timer idle, and report it exactly once
//!
//! The session is transport-generic: anything `AsyncRead + AsyncWrite`
//! works, which is how the in-memory mock controller and the real serial
//! port share every line of session code.
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::{Command, RaceMode, SessionConfig};
//! use session::{ControllerSession, MockController, MockControllerConfig};
//!
//! let (transport, _mock) = MockController::duplex(MockControllerConfig::default());
//! let (handle, mut events) = ControllerSession::connect(
//!     transport,
//!     RaceMode::Accel,
//!     SessionConfig::default(),
//! );
//!
//! handle.send_green().await?;
//! while let Some(event) = events.recv().await {
//!     // react to light changes and records
//! }
//! handle.shutdown().await;
//! ```

mod error;
mod mock;
mod session;
mod transport;

pub use error::SessionError;
pub use mock::{MockController, MockControllerConfig, MockTrigger};
pub use session::{ControllerSession, SessionHandle};
pub use transport::Transport;

#[cfg(feature = "real-serial")]
pub use transport::serial;
