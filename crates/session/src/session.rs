//! ControllerSession - owns the duplex link and its worker tasks.

use contracts::{Command, DisconnectReason, RaceMode, SessionConfig, SessionEvent};
use protocol::FrameSplitter;
use timing::RaceTimer;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::{Result, SessionError};
use crate::transport::Transport;

const COMMAND_QUEUE_CAPACITY: usize = 16;
const CONTROL_QUEUE_CAPACITY: usize = 8;
const READ_CHUNK: usize = 256;

/// A queued outbound command with its per-call acknowledgement slot.
type CommandRequest = (Command, oneshot::Sender<std::io::Result<()>>);

/// Control messages into the read task (which owns the race timer).
enum Control {
    SetMode(RaceMode),
    ClearRun,
}

/// Connection entry point.
///
/// The session owns its transport exclusively: after
/// [`connect`](Self::connect) all interaction goes through the returned
/// [`SessionHandle`] (commands in) and event receiver (events out). The
/// receiver is the single subscription slot; it is handed out once.
pub struct ControllerSession;

impl ControllerSession {
    /// Take ownership of an open duplex transport and start the session.
    ///
    /// Spawns the read task (framer -> decoder -> race timer -> events)
    /// and the single-writer command task, then queues the `HELLO`
    /// handshake. `SessionEvent::Connected` arrives once the controller
    /// answers with `HI`.
    #[instrument(name = "session_connect", skip(transport, config), fields(mode = %mode))]
    pub fn connect<T: Transport>(
        transport: T,
        mode: RaceMode,
        config: SessionConfig,
    ) -> (SessionHandle, mpsc::Receiver<SessionEvent>) {
        let (read_half, write_half) = tokio::io::split(transport);

        let (event_tx, event_rx) = mpsc::channel(config.channel_capacity);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (ctrl_tx, ctrl_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Handshake goes out before anything else the caller might queue.
        let (hello_ack, _) = oneshot::channel();
        let _ = cmd_tx.try_send((Command::Hello, hello_ack));

        let timer = RaceTimer::new(mode, config.cooldown);
        let reader = tokio::spawn(read_loop(
            read_half,
            ctrl_rx,
            shutdown_rx.clone(),
            event_tx,
            timer,
            config,
        ));
        let writer = tokio::spawn(write_loop(write_half, cmd_rx, shutdown_rx));

        info!("session started");
        (
            SessionHandle {
                cmd_tx,
                ctrl_tx,
                shutdown: shutdown_tx,
                reader,
                writer,
            },
            event_rx,
        )
    }
}

/// Handle to a running session.
///
/// Dropping the handle (or calling [`shutdown`](Self::shutdown)) cancels
/// the in-flight read, abandons pending writes, and releases the
/// transport.
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<CommandRequest>,
    ctrl_tx: mpsc::Sender<Control>,
    shutdown: watch::Sender<bool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl SessionHandle {
    /// Queue one command for the wire and wait for its write result.
    ///
    /// Writes go through a single-owner queue, so concurrent callers can
    /// never interleave bytes. A failed write is reported here per call
    /// and does not close the session.
    pub async fn transmit(&self, command: Command) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.cmd_tx
            .send((command, ack_tx))
            .await
            .map_err(|_| SessionError::Closed)?;

        match ack_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SessionError::WriteFailed {
                message: e.to_string(),
            }),
            Err(_) => Err(SessionError::WriteAbandoned),
        }
    }

    /// Command the light green; the controller acknowledges with `OK G<tick>`.
    pub async fn send_green(&self) -> Result<()> {
        self.transmit(Command::Green).await
    }

    /// Command the light red.
    pub async fn send_red(&self) -> Result<()> {
        self.transmit(Command::Red).await
    }

    /// Command the light off.
    pub async fn send_off(&self) -> Result<()> {
        self.transmit(Command::Off).await
    }

    /// Select the discipline for the next run. Not intended mid-run.
    pub async fn set_mode(&self, mode: RaceMode) -> Result<()> {
        self.ctrl_tx
            .send(Control::SetMode(mode))
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Clear all per-run state and command the light off.
    pub async fn reset(&self) -> Result<()> {
        self.ctrl_tx
            .send(Control::ClearRun)
            .await
            .map_err(|_| SessionError::Closed)?;
        self.transmit(Command::Off).await
    }

    /// Shut the session down gracefully: cancel the read task, abandon
    /// pending writes, and join both workers.
    #[instrument(name = "session_shutdown", skip(self))]
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        drop(self.cmd_tx);
        drop(self.ctrl_tx);

        if let Err(e) = self.reader.await {
            error!(error = ?e, "read task panicked");
        }
        if let Err(e) = self.writer.await {
            error!(error = ?e, "write task panicked");
        }
        debug!("session shutdown complete");
    }
}

/// Continuous read loop: transport bytes through framer, decoder, and
/// race timer, in strict arrival order.
#[instrument(name = "session_read_loop", skip_all)]
async fn read_loop<R: AsyncRead + Send + Unpin>(
    mut read_half: R,
    mut ctrl_rx: mpsc::Receiver<Control>,
    mut shutdown: watch::Receiver<bool>,
    event_tx: mpsc::Sender<SessionEvent>,
    mut timer: RaceTimer,
    config: SessionConfig,
) {
    let mut splitter = FrameSplitter::new();
    let mut buf = [0u8; READ_CHUNK];

    let handshake_deadline = config
        .handshake_timeout
        .map(|timeout| tokio::time::Instant::now() + timeout);

    debug!("read loop started");

    loop {
        let deadline = handshake_deadline.unwrap_or_else(tokio::time::Instant::now);

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    finish(&mut timer, &event_tx, DisconnectReason::Closed).await;
                    break;
                }
            }

            Some(control) = ctrl_rx.recv() => match control {
                Control::SetMode(mode) => {
                    debug!(mode = %mode, "mode selected");
                    timer.set_mode(mode);
                }
                Control::ClearRun => timer.reset_run(),
            },

            _ = tokio::time::sleep_until(deadline),
                if handshake_deadline.is_some() && !timer.is_handshaken() =>
            {
                warn!("no HI within handshake window");
                finish(&mut timer, &event_tx, DisconnectReason::HandshakeTimeout).await;
                break;
            }

            result = read_half.read(&mut buf) => match result {
                Ok(0) => {
                    info!("transport reached end of stream");
                    finish(&mut timer, &event_tx, DisconnectReason::Eof).await;
                    break;
                }
                Ok(n) => {
                    if !process_chunk(&buf[..n], &mut splitter, &mut timer, &event_tx).await {
                        warn!("event subscriber dropped, stopping read loop");
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "transport read failed");
                    finish(&mut timer, &event_tx, DisconnectReason::Io(e.to_string())).await;
                    break;
                }
            },
        }
    }

    debug!("read loop stopped");
}

/// Feed one chunk through the pipeline. Returns false once the event
/// subscriber is gone.
async fn process_chunk(
    chunk: &[u8],
    splitter: &mut FrameSplitter,
    timer: &mut RaceTimer,
    event_tx: &mpsc::Sender<SessionEvent>,
) -> bool {
    splitter.extend(chunk);

    while let Some(frame) = splitter.next_frame() {
        // Every controller frame is logged raw, matching the controller
        // log the race officials keep.
        debug!(frame = %String::from_utf8_lossy(&frame), "controller frame");

        let event = match protocol::decode(&frame) {
            Ok(message) => timer.apply(message),
            Err(e) => {
                warn!(error = %e, "frame decode failed");
                metrics::counter!("session_decode_failures_total").increment(1);
                Some(SessionEvent::DecodeFailure { frame })
            }
        };

        if let Some(event) = event {
            if event_tx.send(event).await.is_err() {
                return false;
            }
        }
    }

    true
}

/// Force the timer idle and report the disconnect exactly once.
async fn finish(
    timer: &mut RaceTimer,
    event_tx: &mpsc::Sender<SessionEvent>,
    reason: DisconnectReason,
) {
    timer.handle_disconnect();
    metrics::counter!("session_disconnects_total").increment(1);
    let _ = event_tx
        .send(SessionEvent::Disconnected { reason })
        .await;
}

/// Single-writer command loop: one write in flight at a time, each
/// acknowledged back to its caller.
#[instrument(name = "session_write_loop", skip_all)]
async fn write_loop<W: AsyncWrite + Send + Unpin>(
    mut write_half: W,
    mut cmd_rx: mpsc::Receiver<CommandRequest>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("write loop started");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }

            request = cmd_rx.recv() => {
                let Some((command, ack)) = request else { break };

                trace!(command = command.literal(), "writing command");
                let mut result = write_half.write_all(command.literal().as_bytes()).await;
                if result.is_ok() {
                    result = write_half.flush().await;
                }

                if let Err(ref e) = result {
                    warn!(command = command.literal(), error = %e, "command write failed");
                    metrics::counter!("session_write_failures_total").increment(1);
                }
                let _ = ack.send(result);
            }
        }
    }

    debug!("write loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const TICK: Duration = Duration::from_millis(500);

    async fn recv(events: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
        timeout(TICK, events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_connect_sends_hello() {
        let (transport, mut peer) = tokio::io::duplex(256);
        let (handle, _events) =
            ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

        let mut buf = [0u8; 6];
        timeout(TICK, peer.read_exact(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf, b"$HELLO");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_hi_emits_connected_once() {
        let (transport, mut peer) = tokio::io::duplex(256);
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

        peer.write_all(b"$HI!$HI!").await.unwrap();
        assert_eq!(recv(&mut events).await, SessionEvent::Connected);

        // The duplicate HI is swallowed; next event is the light change.
        peer.write_all(b"$OK R!").await.unwrap();
        assert!(matches!(
            recv(&mut events).await,
            SessionEvent::LightChanged(contracts::LightState::Red)
        ));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_concurrent_writes_never_interleave() {
        let (transport, mut peer) = tokio::io::duplex(1024);
        let (handle, _events) =
            ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

        let (a, b, c) = tokio::join!(handle.send_green(), handle.send_red(), handle.send_off());
        a.unwrap();
        b.unwrap();
        c.unwrap();

        let mut received = Vec::new();
        let mut buf = [0u8; 64];
        // HELLO + three single-letter commands.
        while received.len() < 6 + 2 * 3 {
            let n = timeout(TICK, peer.read(&mut buf)).await.unwrap().unwrap();
            received.extend_from_slice(&buf[..n]);
        }

        let mut text = String::from_utf8(received).unwrap();
        assert!(text.starts_with("$HELLO"));
        text.drain(..6);
        // Whatever the queue order, each literal must appear intact.
        for _ in 0..3 {
            assert_eq!(&text[..1], "$");
            assert!(matches!(&text[1..2], "G" | "R" | "X"));
            text.drain(..2);
        }
        assert!(text.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_peer_close_reports_eof_disconnect() {
        let (transport, mut peer) = tokio::io::duplex(256);
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

        peer.write_all(b"$HI!").await.unwrap();
        assert_eq!(recv(&mut events).await, SessionEvent::Connected);

        drop(peer);
        assert_eq!(
            recv(&mut events).await,
            SessionEvent::Disconnected {
                reason: DisconnectReason::Eof
            }
        );

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_handshake_timeout() {
        let (transport, peer) = tokio::io::duplex(256);
        let config = SessionConfig {
            handshake_timeout: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Accel, config);

        // Peer stays silent.
        assert_eq!(
            recv(&mut events).await,
            SessionEvent::Disconnected {
                reason: DisconnectReason::HandshakeTimeout
            }
        );

        drop(peer);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_decode_failure_does_not_stop_session() {
        let (transport, mut peer) = tokio::io::duplex(256);
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

        peer.write_all(b"$ZZZ!$HI!").await.unwrap();

        assert!(matches!(
            recv(&mut events).await,
            SessionEvent::DecodeFailure { .. }
        ));
        assert_eq!(recv(&mut events).await, SessionEvent::Connected);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_transmit_after_shutdown_rejected() {
        let (transport, _peer) = tokio::io::duplex(256);
        let (handle, mut events) =
            ControllerSession::connect(transport, RaceMode::Accel, SessionConfig::default());

        let _ = handle.shutdown.send(true);
        // Reader announces the caller-driven close.
        assert!(matches!(
            recv(&mut events).await,
            SessionEvent::Disconnected {
                reason: DisconnectReason::Closed
            }
        ));

        // Writer has stopped; the queued command is abandoned, not retried.
        let result = handle.transmit(Command::Green).await;
        assert!(matches!(
            result,
            Err(SessionError::WriteAbandoned) | Err(SessionError::Closed)
        ));

        handle.shutdown().await;
    }
}
