//! `run` command implementation.
//!
//! Supports both the real serial controller and a built-in mock via the
//! `real-serial` feature and the `--mock` flag.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{
    LightState, MetricsSection, PortConfig, RaceConfig, RaceMode, SessionEvent, SessionSection,
    SinksSection, TimingConfig, DEFAULT_BAUD,
};
use observability::{record_session_event, RunSummary};
use session::{ControllerSession, MockController, MockControllerConfig, MockTrigger, SessionHandle};
use timing::format_clock;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::sinks::RecordSinks;

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    let mut config = load_config(args)?;

    // Apply CLI overrides
    if let Some(ref port) = args.port {
        info!(port = %port, "Overriding serial port from CLI");
        config.port.path = port.clone();
    }
    if let Some(baud) = args.baud {
        info!(baud, "Overriding baud rate from CLI");
        config.port.baud = baud;
    }
    if let Some(mode) = args.mode {
        config.timing.mode = mode.into();
    }
    let mode = config.timing.mode;

    info!(
        port = %config.port.path,
        baud = config.port.baud,
        mode = %mode,
        cooldown_ms = config.timing.cooldown_ms,
        "Configuration loaded"
    );

    // Initialize Metrics (optional)
    let metrics_port = if args.metrics_port != 0 {
        Some(args.metrics_port)
    } else {
        config.metrics.port
    };
    if let Some(port) = metrics_port {
        observability::init_metrics_only(port)?;
        info!("Metrics endpoint available on port {}", port);
    }

    let session_config = config.session_config();
    let mut sinks = RecordSinks::from_config(&config.sinks)
        .await
        .context("Failed to open record sinks")?;

    let start_time = Instant::now();

    let summary = if args.mock {
        info!("Running in MOCK mode (no controller required)");
        let (transport, mock) = MockController::duplex(demo_script());
        let (handle, events) = ControllerSession::connect(transport, mode, session_config);
        let summary = drive(handle, events, &mut sinks, args, mode).await;
        mock.join().await;
        summary
    } else {
        run_serial(&config, mode, session_config, &mut sinks, args).await?
    };

    sinks.close().await;
    print_summary(&summary, start_time.elapsed());

    info!("Race Lights finished");
    Ok(())
}

/// Connect over the real serial port.
#[cfg(feature = "real-serial")]
async fn run_serial(
    config: &RaceConfig,
    mode: RaceMode,
    session_config: contracts::SessionConfig,
    sinks: &mut RecordSinks,
    args: &RunArgs,
) -> Result<RunSummary> {
    info!(port = %config.port.path, "Opening serial port...");
    let transport = session::serial::open(&config.port.path, config.port.baud)
        .with_context(|| format!("Failed to open serial port {}", config.port.path))?;

    let (handle, events) = ControllerSession::connect(transport, mode, session_config);
    Ok(drive(handle, events, sinks, args, mode).await)
}

#[cfg(not(feature = "real-serial"))]
async fn run_serial(
    _config: &RaceConfig,
    _mode: RaceMode,
    _session_config: contracts::SessionConfig,
    _sinks: &mut RecordSinks,
    _args: &RunArgs,
) -> Result<RunSummary> {
    Err(CliError::transport_unavailable(
        "serial support not compiled in; rebuild with the `real-serial` feature or use --mock",
    )
    .into())
}

/// Consume session events until disconnect, Ctrl-C, or the duration bound.
async fn drive(
    handle: SessionHandle,
    mut events: mpsc::Receiver<SessionEvent>,
    sinks: &mut RecordSinks,
    args: &RunArgs,
    mode: RaceMode,
) -> RunSummary {
    let mut summary = RunSummary::new();

    // Live clock: wall-clock interpolation, display only.
    let (clock_tx, clock_rx) = watch::channel::<Option<Instant>>(None);
    let clock_task = args
        .live_clock
        .then(|| tokio::spawn(live_clock(clock_rx)));

    let shutdown_signal = setup_shutdown_signal();
    tokio::pin!(shutdown_signal);

    let run_deadline = async {
        if args.duration > 0 {
            tokio::time::sleep(Duration::from_secs(args.duration)).await
        } else {
            std::future::pending::<()>().await
        }
    };
    tokio::pin!(run_deadline);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                warn!("Received shutdown signal, stopping session...");
                break;
            }

            _ = &mut run_deadline => {
                info!(seconds = args.duration, "Run duration elapsed");
                break;
            }

            event = events.recv() => {
                let Some(event) = event else { break };
                record_session_event(&event);
                summary.update(&event);

                match event {
                    SessionEvent::Connected => {
                        info!("Controller handshake complete");
                        println!("🚦 controller connected, arming the light");
                        if let Err(e) = handle.send_green().await {
                            warn!(error = %e, "Failed to send green command");
                        }
                    }
                    SessionEvent::LightChanged(state) => {
                        match state {
                            LightState::Green(anchor) => {
                                println!("🟢 light green (tick {})", anchor.tick);
                                // Gymkhana times from the green light; the
                                // other disciplines wait for the start gate.
                                let zero = mode.starts_at_green().then_some(anchor.at);
                                let _ = clock_tx.send(zero);
                            }
                            LightState::Red => {
                                println!("🔴 light red");
                                let _ = clock_tx.send(None);
                            }
                            LightState::Off => {
                                println!("⚫ light off");
                                let _ = clock_tx.send(None);
                            }
                        }
                    }
                    SessionEvent::Record(record) => {
                        // Resync the display clock against the tick domain.
                        if let Some(zero) = Instant::now().checked_sub(record.elapsed()) {
                            let _ = clock_tx.send(Some(zero));
                        }
                        sinks.write(&record).await;
                    }
                    SessionEvent::DecodeFailure { frame } => {
                        warn!(
                            frame = %String::from_utf8_lossy(&frame),
                            "Unrecognized frame dropped"
                        );
                    }
                    SessionEvent::ProtocolError => {
                        error!("Controller protocol error - power-cycle the controller");
                    }
                    SessionEvent::Disconnected { reason } => {
                        warn!(%reason, "Controller disconnected");
                        break;
                    }
                }
            }
        }
    }

    // Best effort: clear run state and turn the light off before closing.
    if let Err(e) = handle.reset().await {
        debug!(error = %e, "Reset skipped during shutdown");
    }
    handle.shutdown().await;

    if let Some(task) = clock_task {
        task.abort();
        println!();
    }

    summary
}

/// Redraw the elapsed clock on a short fixed period. Interpolated from
/// the host clock; the recorded times come from controller ticks only.
async fn live_clock(rx: watch::Receiver<Option<Instant>>) {
    use std::io::Write as _;

    let mut interval = tokio::time::interval(Duration::from_millis(50));
    loop {
        interval.tick().await;
        if let Some(started) = *rx.borrow() {
            print!("\r⏱  {} ", format_clock(started.elapsed()));
            let _ = std::io::stdout().flush();
        }
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn load_config(args: &RunArgs) -> Result<RaceConfig> {
    if args.config.exists() {
        return config_loader::ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()));
    }

    if args.mock {
        info!("No configuration file found, using defaults for mock run");
        return Ok(RaceConfig {
            port: PortConfig {
                path: "mock".to_string(),
                baud: DEFAULT_BAUD,
            },
            timing: TimingConfig::default(),
            session: SessionSection::default(),
            metrics: MetricsSection::default(),
            sinks: SinksSection::default(),
        });
    }

    Err(CliError::config_not_found(args.config.display().to_string()).into())
}

/// Script for the built-in mock controller: a believable acceleration run
/// with a start-gate bounce that the cooldown filter suppresses.
fn demo_script() -> MockControllerConfig {
    MockControllerConfig {
        green_tick: 1_000,
        triggers: vec![
            MockTrigger {
                after: Duration::from_millis(800),
                sensor: 1,
                tick: 1_800,
            },
            // Mechanical bounce on the start gate, inside the cooldown
            MockTrigger {
                after: Duration::from_millis(850),
                sensor: 1,
                tick: 1_850,
            },
            MockTrigger {
                after: Duration::from_millis(4_950),
                sensor: 2,
                tick: 5_950,
            },
        ],
        // Fragment writes to exercise the framer like a real UART does
        fragment: Some(3),
    }
}

fn print_summary(summary: &RunSummary, duration: Duration) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Session Statistics                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📊 Overview");
    println!("   ├─ Duration: {:.2}s", duration.as_secs_f64());
    println!("   ├─ Records: {}", summary.total_records());
    println!("   ├─ Decode failures: {}", summary.decode_failures());
    println!("   └─ Protocol errors: {}", summary.protocol_errors());

    let sensors = summary.sensors();
    if !sensors.is_empty() {
        println!("\n⏱  Sensors");
        for (i, (sensor, stats)) in sensors.iter().enumerate() {
            let prefix = if i == sensors.len() - 1 { "└─" } else { "├─" };
            let best = stats.best.map(format_clock).unwrap_or_default();
            println!(
                "   {} sensor {}: {} triggers, best {}",
                prefix, sensor, stats.count, best
            );
        }
    }

    println!();
}
