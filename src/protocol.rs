use serde::{Deserialize, Serialize};

use crate::limits::*;
use crate::model::*;

/// One parsed request line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Validate against the property's stored rule set.
    Validate {
        booking: BookingRequest,
        #[serde(default)]
        occupancy: Vec<OccupancySample>,
    },
    /// Validate against a rule set sent with the request.
    ValidateWith {
        booking: BookingRequest,
        config: RuleSetConfig,
        #[serde(default)]
        occupancy: Vec<OccupancySample>,
    },
    RulesForPeriod {
        property_id: String,
        start: Day,
        end: Day,
    },
    Lint {
        property_id: String,
    },
    Reload {
        property_id: String,
    },
}

impl Command {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Validate { .. } => "validate",
            Command::ValidateWith { .. } => "validate_with",
            Command::RulesForPeriod { .. } => "rules_for_period",
            Command::Lint { .. } => "lint",
            Command::Reload { .. } => "reload",
        }
    }
}

/// Response line. Exactly one of `result`/`error` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn ok(result: serde_json::Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(error: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.to_string()),
        }
    }
}

pub fn parse_command(line: &str) -> Result<Command, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }
    if trimmed.len() > MAX_LINE_LEN {
        return Err(ProtocolError::LineTooLong);
    }

    let cmd: Command =
        serde_json::from_str(trimmed).map_err(|e| ProtocolError::Parse(e.to_string()))?;

    check_limits(&cmd)?;
    Ok(cmd)
}

fn check_limits(cmd: &Command) -> Result<(), ProtocolError> {
    match cmd {
        Command::Validate { occupancy, .. } => check_samples(occupancy),
        Command::ValidateWith {
            config, occupancy, ..
        } => {
            check_samples(occupancy)?;
            if config.minimum_stay_rules.len() > MAX_RULES_PER_FAMILY
                || config.booking_window_rules.len() > MAX_RULES_PER_FAMILY
            {
                return Err(ProtocolError::LimitExceeded("too many rules"));
            }
            Ok(())
        }
        Command::RulesForPeriod { start, end, .. } => {
            let days = days_between(*start, *end);
            if days < 0 {
                return Err(ProtocolError::InvalidPeriod);
            }
            if days > MAX_PERIOD_DAYS {
                return Err(ProtocolError::LimitExceeded("period too wide"));
            }
            Ok(())
        }
        Command::Lint { .. } | Command::Reload { .. } => Ok(()),
    }
}

fn check_samples(occupancy: &[OccupancySample]) -> Result<(), ProtocolError> {
    if occupancy.len() > MAX_OCCUPANCY_SAMPLES {
        return Err(ProtocolError::LimitExceeded("too many occupancy samples"));
    }
    Ok(())
}

#[derive(Debug)]
pub enum ProtocolError {
    Parse(String),
    Empty,
    LineTooLong,
    InvalidPeriod,
    LimitExceeded(&'static str),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::Parse(s) => write!(f, "parse error: {s}"),
            ProtocolError::Empty => write!(f, "empty request"),
            ProtocolError::LineTooLong => write!(f, "request line too long"),
            ProtocolError::InvalidPeriod => write!(f, "period end is before its start"),
            ProtocolError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for ProtocolError {}
