//! # Integration Tests
//!
//! End-to-end tests over an in-memory duplex link.
//!
//! Covers:
//! - Full accel/gymkhana runs against the scripted mock controller
//! - Frame fragmentation across the transport
//! - Malformed-frame and mid-run-disconnect recovery
//! - Config-to-session plumbing

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        // The contracts crate is the frozen interface; keep it buildable.
        let _ = contracts::RaceMode::Accel;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use contracts::{
        DisconnectReason, LightState, RaceMode, SensorId, SessionConfig, SessionEvent,
    };
    use session::{ControllerSession, MockController, MockControllerConfig, MockTrigger};
    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    async fn recv(events: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
        timeout(WAIT, events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    async fn recv_record(events: &mut mpsc::Receiver<SessionEvent>) -> contracts::SensorRecord {
        match recv(events).await {
            SessionEvent::Record(record) => record,
            other => panic!("expected record, got {other:?}"),
        }
    }

    /// End-to-end accel run: handshake, green, start gate (with bounce),
    /// finish gate, red.
    #[tokio::test]
    async fn test_e2e_accel_run() {
        let script = MockControllerConfig {
            green_tick: 1_000,
            triggers: vec![
                MockTrigger {
                    after: Duration::from_millis(20),
                    sensor: 1,
                    tick: 1_500,
                },
                // Bounce on the start gate, inside the 1s cooldown
                MockTrigger {
                    after: Duration::from_millis(30),
                    sensor: 1,
                    tick: 1_510,
                },
                MockTrigger {
                    after: Duration::from_millis(60),
                    sensor: 2,
                    tick: 1_900,
                },
            ],
            fragment: None,
        };
        let (transport, mock) = MockController::duplex(script);
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

        assert_eq!(recv(&mut events).await, SessionEvent::Connected);

        handle.send_green().await.unwrap();
        match recv(&mut events).await {
            SessionEvent::LightChanged(LightState::Green(anchor)) => {
                assert_eq!(anchor.tick, 1_000);
            }
            other => panic!("expected green, got {other:?}"),
        }

        // Start gate sets time zero; its own record reads 0.
        let first = recv_record(&mut events).await;
        assert_eq!(first.sensor, SensorId::new(1).unwrap());
        assert_eq!(first.elapsed_ticks, 0);

        // The bounce is suppressed; next record is the finish gate.
        let finish = recv_record(&mut events).await;
        assert_eq!(finish.sensor, SensorId::new(2).unwrap());
        assert_eq!(finish.elapsed_ticks, 400);

        handle.send_red().await.unwrap();
        assert_eq!(
            recv(&mut events).await,
            SessionEvent::LightChanged(LightState::Red)
        );

        handle.shutdown().await;
        mock.join().await;
    }

    /// Gymkhana: the green light is time zero, no start gate needed.
    #[tokio::test]
    async fn test_e2e_gymkhana_starts_at_green() {
        let script = MockControllerConfig {
            green_tick: 500,
            triggers: vec![MockTrigger {
                after: Duration::from_millis(20),
                sensor: 3,
                tick: 800,
            }],
            fragment: None,
        };
        let (transport, mock) = MockController::duplex(script);
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Gymkhana, SessionConfig::default());

        assert_eq!(recv(&mut events).await, SessionEvent::Connected);
        handle.send_green().await.unwrap();
        assert!(matches!(
            recv(&mut events).await,
            SessionEvent::LightChanged(LightState::Green(_))
        ));

        let record = recv_record(&mut events).await;
        assert_eq!(record.sensor, SensorId::new(3).unwrap());
        assert_eq!(record.elapsed_ticks, 300);

        handle.shutdown().await;
        mock.join().await;
    }

    /// Single-byte fragments on the wire must not change what the host
    /// decodes.
    #[tokio::test]
    async fn test_e2e_fragmented_transport() {
        let script = MockControllerConfig {
            green_tick: 1_000,
            triggers: vec![MockTrigger {
                after: Duration::from_millis(20),
                sensor: 1,
                tick: 1_250,
            }],
            fragment: Some(1),
        };
        let (transport, mock) = MockController::duplex(script);
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

        assert_eq!(recv(&mut events).await, SessionEvent::Connected);
        handle.send_green().await.unwrap();
        assert!(matches!(
            recv(&mut events).await,
            SessionEvent::LightChanged(LightState::Green(_))
        ));

        let record = recv_record(&mut events).await;
        assert_eq!(record.elapsed_ticks, 0);

        handle.shutdown().await;
        mock.join().await;
    }

    /// A malformed frame is reported and the stream keeps working.
    #[tokio::test]
    async fn test_e2e_malformed_frame_recovery() {
        let (transport, mut peer) = tokio::io::duplex(256);
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

        peer.write_all(b"$HI!$ZZZ!$OK G100!").await.unwrap();

        assert_eq!(recv(&mut events).await, SessionEvent::Connected);
        match recv(&mut events).await {
            SessionEvent::DecodeFailure { frame } => assert_eq!(&frame[..], b"ZZZ"),
            other => panic!("expected decode failure, got {other:?}"),
        }
        assert!(matches!(
            recv(&mut events).await,
            SessionEvent::LightChanged(LightState::Green(_))
        ));

        handle.shutdown().await;
    }

    /// Mid-run link loss: one Disconnected event, then silence.
    #[tokio::test]
    async fn test_e2e_disconnect_mid_run() {
        let (transport, mut peer) = tokio::io::duplex(256);
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

        peer.write_all(b"$HI!$OK G1000!$S1 1050!$S2 1100!")
            .await
            .unwrap();

        assert_eq!(recv(&mut events).await, SessionEvent::Connected);
        assert!(matches!(
            recv(&mut events).await,
            SessionEvent::LightChanged(LightState::Green(_))
        ));
        recv_record(&mut events).await;
        recv_record(&mut events).await;

        drop(peer);
        assert_eq!(
            recv(&mut events).await,
            SessionEvent::Disconnected {
                reason: DisconnectReason::Eof
            }
        );

        // Exactly once: the channel ends without another disconnect.
        let trailing = timeout(Duration::from_millis(200), events.recv()).await;
        assert!(matches!(trailing, Ok(None) | Err(_)), "got {trailing:?}");

        handle.shutdown().await;
    }

    /// Duplicate green resets the run: records before it never leak into
    /// the new run.
    #[tokio::test]
    async fn test_e2e_duplicate_green_resets_run() {
        let (transport, mut peer) = tokio::io::duplex(256);
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Gymkhana, SessionConfig::default());

        peer.write_all(b"$HI!$OK G100!$S1 400!").await.unwrap();
        assert_eq!(recv(&mut events).await, SessionEvent::Connected);
        assert!(matches!(
            recv(&mut events).await,
            SessionEvent::LightChanged(LightState::Green(_))
        ));
        assert_eq!(recv_record(&mut events).await.elapsed_ticks, 300);

        // Second green: fresh anchor, cooldown cleared, elapsed restarts.
        peer.write_all(b"$OK G1000!$S1 1100!").await.unwrap();
        match recv(&mut events).await {
            SessionEvent::LightChanged(LightState::Green(anchor)) => {
                assert_eq!(anchor.tick, 1_000);
            }
            other => panic!("expected green, got {other:?}"),
        }
        assert_eq!(recv_record(&mut events).await.elapsed_ticks, 100);

        handle.shutdown().await;
    }

    /// Config file -> session plumbing: cooldown and mode flow through.
    #[tokio::test]
    async fn test_e2e_config_driven_session() {
        let config = config_loader::ConfigLoader::load_from_str(
            r#"
[port]
path = "mock"

[timing]
mode = "gymkhana"
cooldown_ms = 100

[session]
channel_capacity = 8
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let script = MockControllerConfig {
            green_tick: 100,
            triggers: vec![
                MockTrigger {
                    after: Duration::from_millis(10),
                    sensor: 5,
                    tick: 200,
                },
                // 400ms later: well outside the configured 100ms cooldown
                MockTrigger {
                    after: Duration::from_millis(410),
                    sensor: 5,
                    tick: 300,
                },
            ],
            fragment: None,
        };
        let (transport, mock) = MockController::duplex(script);
        let (handle, mut events) = ControllerSession::connect(
            transport,
            config.timing.mode,
            config.session_config(),
        );

        assert_eq!(recv(&mut events).await, SessionEvent::Connected);
        handle.send_green().await.unwrap();
        assert!(matches!(
            recv(&mut events).await,
            SessionEvent::LightChanged(LightState::Green(_))
        ));

        // Both triggers pass the shortened cooldown.
        assert_eq!(recv_record(&mut events).await.elapsed_ticks, 100);
        assert_eq!(recv_record(&mut events).await.elapsed_ticks, 200);

        handle.shutdown().await;
        mock.join().await;
    }

    /// Reset clears run state and commands the light off.
    #[tokio::test]
    async fn test_e2e_reset_turns_light_off() {
        let (transport, mock) = MockController::duplex(MockControllerConfig::default());
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

        assert_eq!(recv(&mut events).await, SessionEvent::Connected);
        handle.send_green().await.unwrap();
        assert!(matches!(
            recv(&mut events).await,
            SessionEvent::LightChanged(LightState::Green(_))
        ));

        handle.reset().await.unwrap();
        assert_eq!(
            recv(&mut events).await,
            SessionEvent::LightChanged(LightState::Off)
        );

        handle.shutdown().await;
        mock.join().await;
    }
}
