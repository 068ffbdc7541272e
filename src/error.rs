//! Error types for the measurement tool.

use std::fmt;

use thiserror::Error;

use crate::instrument::InstrumentError;
use crate::procedure::State;

/// Result type for measurement operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which instrument interaction failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Identify,
    Configure,
    HotMeasurement,
    ColdMeasurement,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stage::Connect => "connect",
            Stage::Identify => "identify",
            Stage::Configure => "configure",
            Stage::HotMeasurement => "hot measurement",
            Stage::ColdMeasurement => "cold measurement",
        };
        write!(f, "{}", name)
    }
}

/// Errors that can occur while setting up or running a measurement.
///
/// A non-physical Y-factor is not an error, see
/// [`Validity`](crate::measurement::Validity).
#[derive(Debug, Error)]
pub enum Error {
    /// Operator or file supplied settings that cannot be measured with.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The instrument failed to connect or respond.
    #[error("instrument failure during {stage}: {source}")]
    Instrument {
        stage: Stage,
        #[source]
        source: InstrumentError,
    },

    /// Reading prompts from or writing to the console failed.
    #[error("operator console error: {0}")]
    Operator(#[source] std::io::Error),

    /// The procedure was driven out of order.
    #[error("invalid procedure transition from {from:?} to {to:?}")]
    InvalidTransition { from: State, to: State },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub fn instrument(stage: Stage, source: InstrumentError) -> Error {
        Error::Instrument { stage, source }
    }

    pub fn invalid(message: impl Into<String>) -> Error {
        Error::InvalidConfiguration(message.into())
    }
}
