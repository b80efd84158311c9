//! Configuration and simulation errors

use std::fmt;

/// Errors raised while building or loading a [`crate::SimConfig`].
///
/// A config that fails here never reaches the step loop.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read
    Io(std::io::Error),
    /// Config file is not valid JSON for `SimConfig`
    Parse(serde_json::Error),
    /// A value is outside its allowed range
    Invalid {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
    /// Unknown preset name
    UnknownPreset(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, value: impl fmt::Debug, reason: &'static str) -> Self {
        ConfigError::Invalid {
            field,
            value: format!("{value:?}"),
            reason,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Config parse error: {}", e),
            ConfigError::Invalid {
                field,
                value,
                reason,
            } => write!(f, "Invalid `{}` = {}: {}", field, value, reason),
            ConfigError::UnknownPreset(name) => write!(f, "Unknown preset: {}", name),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors raised by the simulation itself
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Edge index outside 0..6
    IndexOutOfRange(usize),
    /// Ball state became non-finite after a step (debug builds only)
    InvariantViolation { tick: u64, detail: String },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::IndexOutOfRange(i) => write!(f, "Edge index {} out of range 0..6", i),
            SimError::InvariantViolation { tick, detail } => {
                write!(f, "Physics invariant violated at tick {}: {}", tick, detail)
            }
        }
    }
}

impl std::error::Error for SimError {}

/// Errors that stop a driver run
#[derive(Debug)]
pub enum RunError {
    Sim(SimError),
    /// The frame sink failed to accept a frame
    Sink(std::io::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Sim(e) => write!(f, "{}", e),
            RunError::Sink(e) => write!(f, "Frame sink error: {}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Sim(e) => Some(e),
            RunError::Sink(e) => Some(e),
        }
    }
}

impl From<SimError> for RunError {
    fn from(e: SimError) -> Self {
        RunError::Sim(e)
    }
}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        RunError::Sink(e)
    }
}
