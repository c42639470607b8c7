//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::DEFAULT_BAUD;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    port: String,
    baud: u32,
    mode: String,
    cooldown_ms: u64,
    sinks: Vec<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    port: config.port.path.clone(),
                    baud: config.port.baud,
                    mode: config.timing.mode.to_string(),
                    cooldown_ms: config.timing.cooldown_ms,
                    sinks: sink_names(&config),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &contracts::RaceConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.port.baud != DEFAULT_BAUD {
        warnings.push(format!(
            "Controller firmware speaks {} baud; configured {}",
            DEFAULT_BAUD, config.port.baud
        ));
    }

    if !config.sinks.console && config.sinks.jsonl.is_none() {
        warnings.push("No sinks configured - records will only appear in logs".to_string());
    }

    if let Some(timeout) = config.session.handshake_timeout_ms {
        if timeout < 500 {
            warnings.push(format!(
                "Handshake timeout of {timeout} ms is tight for a cold controller"
            ));
        }
    }

    warnings
}

fn sink_names(config: &contracts::RaceConfig) -> Vec<String> {
    let mut sinks = Vec::new();
    if config.sinks.console {
        sinks.push("console".to_string());
    }
    if let Some(path) = &config.sinks.jsonl {
        sinks.push(format!("jsonl ({path})"));
    }
    sinks
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Port: {} @ {} baud", summary.port, summary.baud);
            println!("  Mode: {}", summary.mode);
            println!("  Cooldown: {} ms", summary.cooldown_ms);
            println!("  Sinks: {}", summary.sinks.join(", "));
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
