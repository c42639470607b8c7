//! Scripted mock controller for tests and demos.
//!
//! Sits on the far end of an in-memory duplex link and speaks the
//! controller's side of the protocol: answers the handshake, acknowledges
//! light commands, and plays back scripted sensor triggers after green.

use std::collections::VecDeque;
use std::time::Duration;

use contracts::{Command, Tick};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// One scripted sensor trigger, played back after the green ack.
#[derive(Debug, Clone)]
pub struct MockTrigger {
    /// Delay after the green acknowledgement
    pub after: Duration,
    /// Sensor digit (0-9)
    pub sensor: u8,
    /// Controller tick reported for the trigger
    pub tick: Tick,
}

/// Mock controller behavior.
#[derive(Debug, Clone)]
pub struct MockControllerConfig {
    /// Tick reported in the green acknowledgement
    pub green_tick: Tick,

    /// Sensor triggers fired after each green
    pub triggers: Vec<MockTrigger>,

    /// Max bytes per write (None = whole frames); small values exercise
    /// the host framer against fragmented reads
    pub fragment: Option<usize>,
}

impl Default for MockControllerConfig {
    fn default() -> Self {
        Self {
            green_tick: 1000,
            triggers: Vec::new(),
            fragment: None,
        }
    }
}

/// Handle to a running mock controller task.
pub struct MockController {
    task: Option<JoinHandle<()>>,
}

impl MockController {
    /// Spawn a mock controller on the far half of a duplex link.
    pub fn spawn(peer: DuplexStream, config: MockControllerConfig) -> Self {
        let task = tokio::spawn(run(peer, config));
        Self { task: Some(task) }
    }

    /// Create an in-memory link with a mock controller on the far end,
    /// returning the host-side transport.
    pub fn duplex(config: MockControllerConfig) -> (DuplexStream, Self) {
        let (host, peer) = tokio::io::duplex(1024);
        (host, Self::spawn(peer, config))
    }

    /// Wait for the controller task to finish (it stops once the host
    /// side of the link is dropped).
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MockController {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

async fn run(mut peer: DuplexStream, config: MockControllerConfig) {
    let mut inbound: Vec<u8> = Vec::new();
    let mut buf = [0u8; 64];
    let mut pending: VecDeque<(tokio::time::Instant, MockTrigger)> = VecDeque::new();

    debug!("mock controller started");

    loop {
        let next_fire = pending.front().map(|(at, _)| *at);
        let sleep_at = next_fire.unwrap_or_else(tokio::time::Instant::now);

        tokio::select! {
            result = peer.read(&mut buf) => match result {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    inbound.extend_from_slice(&buf[..n]);
                    while let Some(command) = next_command(&mut inbound) {
                        trace!(command = command.literal(), "mock received command");
                        match command {
                            Command::Hello => {
                                if send(&mut peer, b"$HI!", config.fragment).await.is_err() {
                                    return;
                                }
                            }
                            Command::Green => {
                                let ack = format!("$OK G{}!", config.green_tick);
                                if send(&mut peer, ack.as_bytes(), config.fragment).await.is_err() {
                                    return;
                                }
                                let now = tokio::time::Instant::now();
                                pending = config
                                    .triggers
                                    .iter()
                                    .cloned()
                                    .map(|trigger| (now + trigger.after, trigger))
                                    .collect();
                            }
                            Command::Red => {
                                pending.clear();
                                if send(&mut peer, b"$OK R!", config.fragment).await.is_err() {
                                    return;
                                }
                            }
                            Command::Off => {
                                pending.clear();
                                if send(&mut peer, b"$OK X!", config.fragment).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                }
            },

            _ = tokio::time::sleep_until(sleep_at), if next_fire.is_some() => {
                let (_, trigger) = pending.pop_front().expect("pending trigger");
                let frame = format!("$S{} {}!", trigger.sensor, trigger.tick);
                trace!(frame = %frame, "mock firing sensor");
                if send(&mut peer, frame.as_bytes(), config.fragment).await.is_err() {
                    return;
                }
            }
        }
    }

    debug!("mock controller stopped");
}

/// Parse the next outbound command from the unterminated host->controller
/// byte stream (`$HELLO`, `$G`, `$R`, `$X`).
fn next_command(buf: &mut Vec<u8>) -> Option<Command> {
    loop {
        let start = buf.iter().position(|&b| b == b'$')?;
        buf.drain(..start);

        match *buf.get(1)? {
            b'G' => {
                buf.drain(..2);
                return Some(Command::Green);
            }
            b'R' => {
                buf.drain(..2);
                return Some(Command::Red);
            }
            b'X' => {
                buf.drain(..2);
                return Some(Command::Off);
            }
            b'H' => {
                if buf.len() < 6 {
                    return None;
                }
                if buf.starts_with(b"$HELLO") {
                    buf.drain(..6);
                    return Some(Command::Hello);
                }
                buf.drain(..1);
            }
            _ => {
                buf.drain(..1);
            }
        }
    }
}

async fn send(peer: &mut DuplexStream, frame: &[u8], fragment: Option<usize>) -> std::io::Result<()> {
    match fragment {
        Some(size) if size > 0 => {
            for chunk in frame.chunks(size) {
                peer.write_all(chunk).await?;
                peer.flush().await?;
                // Give the host a chance to observe the partial frame.
                tokio::task::yield_now().await;
            }
            Ok(())
        }
        _ => {
            peer.write_all(frame).await?;
            peer.flush().await
        }
    }
}
