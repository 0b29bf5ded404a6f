//! Time-Related Constants
//!
//! Unit conversions and the default firing intervals of the main-loop
//! subsystems.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

// ===== SUBSYSTEM INTERVALS =====

/// Default aggregation / display update interval (milliseconds).
///
/// Each update drains every sample queue and publishes one median per channel.
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 1000;

/// Default CSV record interval (milliseconds).
pub const DEFAULT_RECORD_INTERVAL_MS: u64 = 1000;

/// Default control period (milliseconds).
///
/// Also the `period` term of the creep correction.
pub const DEFAULT_CONTROL_INTERVAL_MS: u64 = 500;

/// Longest the main loop waits for an operator command per iteration (milliseconds).
pub const COMMAND_POLL_TIMEOUT_MS: u64 = 1;
