//! Race discipline modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Race discipline, selecting the start-reference policy for a run.
///
/// Set by the caller before a run begins and never changed mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceMode {
    /// Acceleration run: time zero is the first start-gate trigger
    Accel,
    /// Skidpad: time zero is the first start-gate trigger
    Skidpad,
    /// Gymkhana: time zero is the green light itself
    Gymkhana,
}

impl RaceMode {
    /// Whether this discipline starts its clock at the green light rather
    /// than waiting for the start-gate sensor.
    pub fn starts_at_green(&self) -> bool {
        matches!(self, Self::Gymkhana)
    }
}

impl fmt::Display for RaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Accel => "accel",
            Self::Skidpad => "skidpad",
            Self::Gymkhana => "gymkhana",
        };
        write!(f, "{name}")
    }
}

impl FromStr for RaceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accel" => Ok(Self::Accel),
            "skidpad" => Ok(Self::Skidpad),
            "gymkhana" => Ok(Self::Gymkhana),
            other => Err(format!("unknown race mode: {other}")),
        }
    }
}
