//! Mock Session Example
//!
//! Times a scripted acceleration run against the built-in mock
//! controller. Runs without any hardware attached.
//!
//! Run with: cargo run --bin mock_session --no-default-features

use std::time::Duration;

use contracts::{LightState, RaceMode, SessionConfig, SessionEvent};
use session::{ControllerSession, MockController, MockControllerConfig, MockTrigger};
use timing::format_clock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Session Demo");

    // ==== Stage 1: Script a controller ====
    // Green at tick 1000, start gate 0.8s later, finish gate at 4.2s of
    // race time. The duplicate start-gate trigger is mechanical bounce.
    let script = MockControllerConfig {
        green_tick: 1_000,
        triggers: vec![
            MockTrigger {
                after: Duration::from_millis(800),
                sensor: 1,
                tick: 1_800,
            },
            MockTrigger {
                after: Duration::from_millis(840),
                sensor: 1,
                tick: 1_840,
            },
            MockTrigger {
                after: Duration::from_millis(5_000),
                sensor: 2,
                tick: 6_000,
            },
        ],
        fragment: Some(4),
    };
    let (transport, mock) = MockController::duplex(script);

    // ==== Stage 2: Connect the session ====
    let (handle, mut events) =
        ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

    // ==== Stage 3: Drive one run ====
    let deadline = tokio::time::sleep(Duration::from_secs(8));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    SessionEvent::Connected => {
                        tracing::info!("Controller connected, sending green");
                        handle.send_green().await?;
                    }
                    SessionEvent::LightChanged(LightState::Green(anchor)) => {
                        tracing::info!(tick = anchor.tick, "Run armed");
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
                        // The finish gate ends the run
                        if record.sensor.get() == 2 {
                            handle.send_red().await?;
                        }
                    }
                    SessionEvent::Disconnected { reason } => {
                        tracing::warn!(%reason, "Disconnected");
                        break;
                    }
                    other => tracing::debug!(?other, "event"),
                }
            }
        }
    }

    // ==== Stage 4: Shutdown ====
    handle.shutdown().await;
    mock.join().await;

    tracing::info!("Mock Session Demo finished");
    Ok(())
}
