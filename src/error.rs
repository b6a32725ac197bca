// src/error.rs
use std::time::Duration;
use thiserror::Error;

/// A single source's fetch failure. Isolated per source by the ingest fan-out.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("authentication rejected by {source_name}: {message}")]
    Auth {
        source_name: String,
        message: String,
    },
    #[error("{source_name} rate limit exceeded")]
    RateLimited { source_name: String },
    #[error("transport failure talking to {source_name}: {message}")]
    Transport {
        source_name: String,
        message: String,
    },
    #[error("could not parse {source_name} response: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
    #[error("{source_name} did not finish within {timeout:?}")]
    Timeout {
        source_name: String,
        timeout: Duration,
    },
    #[error("{source_name} fetch task aborted: {message}")]
    Panicked {
        source_name: String,
        message: String,
    },
}

impl SourceError {
    pub fn source_name(&self) -> &str {
        match self {
            Self::Auth { source_name, .. }
            | Self::RateLimited { source_name }
            | Self::Transport { source_name, .. }
            | Self::Parse { source_name, .. }
            | Self::Timeout { source_name, .. }
            | Self::Panicked { source_name, .. } => source_name,
        }
    }

    /// Short machine-friendly label used as a metrics/log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limited",
            Self::Transport { .. } => "transport",
            Self::Parse { .. } => "parse",
            Self::Timeout { .. } => "timeout",
            Self::Panicked { .. } => "panicked",
        }
    }
}

/// Rejected host rate settings.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("{field} must be a finite, positive amount (got {value})")]
    InvalidRate { field: &'static str, value: f64 },
    #[error("min rate {min} exceeds max rate {max}")]
    InvertedBounds { min: f64, max: f64 },
}
