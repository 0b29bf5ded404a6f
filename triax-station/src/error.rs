//! Station-level errors
//!
//! Operator input problems never show up here: they are reported per
//! command as [`CommandOutcome::Rejected`](crate::command::CommandOutcome).
//! Everything in [`StationError`] means the station itself cannot go on.

use thiserror::Error;
use triax_core::ConfigError;

/// Errors that stop the station
#[derive(Debug, Error)]
pub enum StationError {
    /// File system or log file failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON for [`StationConfig`](crate::config::StationConfig)
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration values are inconsistent
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Acquisition worker could not be started
    #[error("Failed to spawn acquisition worker: {0}")]
    Spawn(std::io::Error),

    /// Acquisition worker panicked
    #[error("Acquisition worker panicked")]
    WorkerPanicked,

    /// Power transition or other driver access failed
    #[error("Acquisition error: {0}")]
    Acquisition(String),

    /// Actuator DAC rejected a write
    #[error("DAC write failed: {0}")]
    Dac(String),

    /// Driver still shared when the pins were to be released
    #[error("Driver still in use at shutdown")]
    DriverInUse,
}

/// Result alias for station operations
pub type StationResult<T> = Result<T, StationError>;
