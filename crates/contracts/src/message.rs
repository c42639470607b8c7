//! Wire protocol messages and outbound commands.
//!
//! Controller-to-host traffic is framed `$<payload>!`; host-to-controller
//! commands are bare `$`-prefixed literals with no terminator.

use crate::{SensorId, Tick};

/// A decoded controller-to-host message.
///
/// Produced once per frame by the protocol decoder, then matched
/// exhaustively by the timing state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerMessage {
    /// `HI` - handshake acknowledged
    Hi,

    /// `E` - controller-reported protocol error; the controller expects a
    /// physical power cycle
    ProtocolError,

    /// `OK G<tick>` - light turned green at the given controller tick
    Green { tick: Tick },

    /// `OK R` - light turned red
    Red,

    /// `OK X` - light turned off
    Off,

    /// `S<id><tick>` - track sensor triggered at the given controller tick
    Sensor { sensor: SensorId, tick: Tick },
}

/// A host-to-controller command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Handshake request, sent once on connect
    Hello,
    /// Turn the light green (controller acknowledges with `OK G<tick>`)
    Green,
    /// Turn the light red
    Red,
    /// Turn the light off
    Off,
}

impl Command {
    /// The exact bytes written to the wire for this command.
    pub fn literal(&self) -> &'static str {
        match self {
            Self::Hello => "$HELLO",
            Self::Green => "$G",
            Self::Red => "$R",
            Self::Off => "$X",
        }
    }
}
