//! Serial Session Example
//!
//! Connects to a real traffic-light controller over its serial port and
//! prints timed records for one gymkhana run.
//!
//! Run with: cargo run --bin serial_session -- /dev/ttyUSB0

use contracts::{LightState, RaceMode, SessionConfig, SessionEvent, DEFAULT_BAUD};
use session::ControllerSession;
use timing::format_clock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    tracing::info!(path = %path, "Opening serial port");
    let transport = session::serial::open(&path, DEFAULT_BAUD)?;

    let (handle, mut events) =
        ControllerSession::connect(transport, RaceMode::Gymkhana, SessionConfig::default());

    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Connected => {
                tracing::info!("Controller connected, sending green");
                handle.send_green().await?;
            }
            SessionEvent::LightChanged(LightState::Green(anchor)) => {
                tracing::info!(tick = anchor.tick, "Run armed, clock starts at green");
            }
            SessionEvent::LightChanged(state) => {
                tracing::info!(state = state.label(), "Light changed");
            }
            SessionEvent::Record(record) => {
                println!(
                    "sensor {} -> {}",
                    record.sensor,
                    format_clock(record.elapsed())
                );
            }
            SessionEvent::ProtocolError => {
                tracing::error!("Controller protocol error - power-cycle the controller");
            }
            SessionEvent::DecodeFailure { frame } => {
                tracing::warn!(frame = %String::from_utf8_lossy(&frame), "Bad frame");
            }
            SessionEvent::Disconnected { reason } => {
                tracing::warn!(%reason, "Disconnected");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
