//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    port: PortInfo,
    timing: TimingInfo,
    session: SessionInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_port: Option<u16>,
}

#[derive(Serialize)]
struct PortInfo {
    path: String,
    baud: u32,
}

#[derive(Serialize)]
struct TimingInfo {
    mode: String,
    starts_at_green: bool,
    cooldown_ms: u64,
}

#[derive(Serialize)]
struct SessionInfo {
    channel_capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    handshake_timeout_ms: Option<u64>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

fn build_config_info(config: &contracts::RaceConfig) -> ConfigInfo {
    let mut sinks = Vec::new();
    if config.sinks.console {
        sinks.push("console".to_string());
    }
    if let Some(path) = &config.sinks.jsonl {
        sinks.push(format!("jsonl ({path})"));
    }

    ConfigInfo {
        port: PortInfo {
            path: config.port.path.clone(),
            baud: config.port.baud,
        },
        timing: TimingInfo {
            mode: config.timing.mode.to_string(),
            starts_at_green: config.timing.mode.starts_at_green(),
            cooldown_ms: config.timing.cooldown_ms,
        },
        session: SessionInfo {
            channel_capacity: config.session.channel_capacity,
            handshake_timeout_ms: config.session.handshake_timeout_ms,
        },
        sinks,
        metrics_port: config.metrics.port,
    }
}

fn print_config_info(config: &contracts::RaceConfig) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                Race Lights Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🔌 Port");
    println!("   ├─ Path: {}", config.port.path);
    println!("   └─ Baud: {} (8N1)", config.port.baud);

    println!("\n⏱  Timing");
    println!("   ├─ Mode: {}", config.timing.mode);
    if config.timing.mode.starts_at_green() {
        println!("   ├─ Start: at green light");
    } else {
        println!("   ├─ Start: first start-gate trigger (sensor 1)");
    }
    println!("   └─ Sensor cooldown: {} ms", config.timing.cooldown_ms);

    println!("\n⚙️  Session");
    println!("   ├─ Event channel capacity: {}", config.session.channel_capacity);
    match config.session.handshake_timeout_ms {
        Some(timeout) => println!("   └─ Handshake timeout: {} ms", timeout),
        None => println!("   └─ Handshake timeout: none (wait forever)"),
    }

    println!("\n📤 Sinks");
    let jsonl = config.sinks.jsonl.as_deref();
    match (config.sinks.console, jsonl) {
        (true, Some(path)) => {
            println!("   ├─ console");
            println!("   └─ jsonl: {}", path);
        }
        (true, None) => println!("   └─ console"),
        (false, Some(path)) => println!("   └─ jsonl: {}", path),
        (false, None) => println!("   └─ (none)"),
    }

    if let Some(port) = config.metrics.port {
        println!("\n📈 Metrics on port {}", port);
    }

    println!();
}
