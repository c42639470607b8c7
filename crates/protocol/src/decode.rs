//! Frame payload decoding.
//!
//! One tagged-enum decode per frame; downstream consumers match
//! exhaustively instead of re-inspecting string prefixes.

use contracts::{ControllerMessage, SensorId};

use crate::error::{DecodeError, Result};

/// Decode a frame payload (markers already stripped) into a typed message.
///
/// Prefixes are case-sensitive literals. Unrecognized payloads are a
/// recoverable [`DecodeError`]; the session reports them and moves on.
pub fn decode(payload: &[u8]) -> Result<ControllerMessage> {
    if payload.is_empty() {
        return Err(DecodeError::EmptyFrame);
    }

    if payload.starts_with(b"E") {
        Ok(ControllerMessage::ProtocolError)
    } else if payload.starts_with(b"HI") {
        Ok(ControllerMessage::Hi)
    } else if let Some(rest) = payload.strip_prefix(b"OK G") {
        let tick = parse_tick(rest).ok_or_else(|| DecodeError::InvalidTick {
            payload: lossy(payload),
        })?;
        Ok(ControllerMessage::Green { tick })
    } else if payload.starts_with(b"OK R") {
        Ok(ControllerMessage::Red)
    } else if payload.starts_with(b"OK X") {
        Ok(ControllerMessage::Off)
    } else if let Some(rest) = payload.strip_prefix(b"S") {
        decode_sensor(payload, rest)
    } else {
        Err(DecodeError::UnknownPrefix {
            payload: lossy(payload),
        })
    }
}

/// `S<id:1 digit><tick>` - the id is exactly one decimal digit; anything
/// else (multi-digit ids included) is rejected rather than guessed.
fn decode_sensor(payload: &[u8], rest: &[u8]) -> Result<ControllerMessage> {
    let (&id_byte, tick_bytes) = rest
        .split_first()
        .ok_or_else(|| DecodeError::InvalidSensorId {
            payload: lossy(payload),
        })?;

    let sensor = SensorId::from_ascii_digit(id_byte).ok_or_else(|| DecodeError::InvalidSensorId {
        payload: lossy(payload),
    })?;

    let tick = parse_tick(tick_bytes).ok_or_else(|| DecodeError::InvalidTick {
        payload: lossy(payload),
    })?;

    Ok(ControllerMessage::Sensor { sensor, tick })
}

/// Parse a decimal tick field, tolerating surrounding ASCII whitespace
/// (the controller pads some fields with a space).
fn parse_tick(bytes: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(bytes).ok()?;
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace());
    if text.is_empty() {
        return None;
    }
    text.parse().ok()
}

fn lossy(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).into_owned()
}
