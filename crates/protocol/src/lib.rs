//! # Protocol
//!
//! Serial wire protocol for the traffic-light controller.
//!
//! Responsibilities:
//! - Extract complete `$<payload>!` frames from a fragmented byte stream
//! - Decode frame payloads into typed [`contracts::ControllerMessage`]s
//!
//! The framer tolerates arbitrary chunk boundaries: a frame may be split
//! across reads or share a chunk with others, and the emitted payload
//! sequence is identical regardless of how the boundaries fall.

mod decode;
mod error;
mod framer;

pub use decode::decode;
pub use error::{DecodeError, Result};
pub use framer::FrameSplitter;

/// Start-of-frame marker on the controller-to-host direction.
pub const START_MARKER: u8 = b'$';

/// End-of-frame marker on the controller-to-host direction.
pub const END_MARKER: u8 = b'!';
