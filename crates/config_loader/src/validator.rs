//! Configuration validation.
//!
//! Rules:
//! - field-level ranges (baud, cooldown, channel capacity) via derive
//! - handshake timeout, when present, must be non-zero
//! - jsonl sink path, when present, must not be empty

use contracts::{ControllerError, RaceConfig};
use validator::Validate;

/// Validate a parsed configuration.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &RaceConfig) -> Result<(), ControllerError> {
    validate_fields(config)?;
    validate_handshake(config)?;
    validate_sinks(config)?;
    Ok(())
}

/// Run the derive-based field validators.
fn validate_fields(config: &RaceConfig) -> Result<(), ControllerError> {
    config.validate().map_err(|errors| {
        let (field, messages) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string());
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
        ControllerError::config_validation(field, messages)
    })
}

fn validate_handshake(config: &RaceConfig) -> Result<(), ControllerError> {
    if config.session.handshake_timeout_ms == Some(0) {
        return Err(ControllerError::config_validation(
            "session.handshake_timeout_ms",
            "handshake timeout must be non-zero; omit the field to wait forever",
        ));
    }
    Ok(())
}

fn validate_sinks(config: &RaceConfig) -> Result<(), ControllerError> {
    if let Some(path) = &config.sinks.jsonl {
        if path.trim().is_empty() {
            return Err(ControllerError::config_validation(
                "sinks.jsonl",
                "jsonl path cannot be empty",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_toml, ConfigFormat};
    use crate::ConfigLoader;

    fn minimal_config() -> RaceConfig {
        parse_toml("[port]\npath = \"/dev/ttyUSB0\"\n").unwrap()
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_zero_cooldown_rejected() {
        let mut config = minimal_config();
        config.timing.cooldown_ms = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cooldown"), "got: {err}");
    }

    #[test]
    fn test_baud_out_of_range() {
        let mut config = minimal_config();
        config.port.baud = 300;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("baud"), "got: {err}");
    }

    #[test]
    fn test_zero_handshake_timeout_rejected() {
        let mut config = minimal_config();
        config.session.handshake_timeout_ms = Some(0);
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("handshake"), "got: {err}");
    }

    #[test]
    fn test_empty_jsonl_path_rejected() {
        let mut config = minimal_config();
        config.sinks.jsonl = Some("  ".to_string());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("jsonl"), "got: {err}");
    }

    #[test]
    fn test_loader_surfaces_validation() {
        let content = r#"
[port]
path = "/dev/ttyUSB0"

[timing]
cooldown_ms = 0
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
    }
}
