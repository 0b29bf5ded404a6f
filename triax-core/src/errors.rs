//! Error Types for Acquisition, Operator Input and Rig Configuration
//!
//! ## Design Philosophy
//!
//! The rig's error system follows the same rules as the rest of the core:
//!
//! 1. **Small Size**: Variants carry only indices and `&'static str` tags so
//!    they can be returned from the acquisition hot path and logged cheaply.
//!
//! 2. **No Heap Allocation**: No `String` payloads. Operator text that fails
//!    to parse is reported by field name, not echoed back.
//!
//! 3. **Copy Semantics**: `ConfigError` and `InputError` are `Copy`.
//!    `AcquisitionError` is generic over the pin error and is `Copy` whenever
//!    that error is.
//!
//! ## Error Categories
//!
//! ### Fatal at construction
//! - `ConfigError`: the driver or station cannot be built as declared
//!   (pin count mismatch, too many devices, bad interval).
//!
//! ### Reported, never propagated
//! - `InputError`: operator typed something that is not a number. The
//!   edited field keeps its previous value.
//!
//! ### Runtime acquisition
//! - `AcquisitionError::Pin`: the GPIO layer failed.
//! - `AcquisitionError::Stalled`: a device never signalled ready within the
//!   configured poll budget (only with `StallPolicy::Bounded`).
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use triax_core::{AcquisitionError, InputError};
//!
//! fn on_input(result: Result<(), InputError>) {
//!     match result {
//!         Ok(()) => {}
//!         Err(InputError::NotANumber { field }) => {
//!             // show the field as invalid, keep the old value
//!             let _ = field;
//!         }
//!         Err(_) => {}
//!     }
//! }
//!
//! fn on_read(result: Result<(), AcquisitionError<core::convert::Infallible>>) {
//!     if let Err(AcquisitionError::Stalled { channel }) = result {
//!         // that bridge is unplugged or unpowered
//!         let _ = channel;
//!     }
//! }
//! ```

use core::fmt;

use thiserror_no_std::Error;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for operator input
pub type InputResult<T> = Result<T, InputError>;

/// Configuration errors - fatal when building a driver or station
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Number of data-line pins differs from the declared device count
    #[error("Declared {expected} devices but {actual} data pins were supplied")]
    PinCountMismatch {
        /// Declared device count
        expected: usize,
        /// Number of data pins handed to the driver
        actual: usize,
    },

    /// More devices than the shared clock line supports
    #[error("{requested} devices requested, at most {max} supported")]
    TooManyDevices {
        /// Requested device count
        requested: usize,
        /// Compile-time maximum
        max: usize,
    },

    /// Amplifier gain of zero
    #[error("Gain {gain} is not a valid amplifier gain")]
    InvalidGain {
        /// Rejected gain
        gain: u8,
    },

    /// A period or interval that must be positive was not
    #[error("Interval '{name}' must be positive")]
    NonPositiveInterval {
        /// Name of the offending setting
        name: &'static str,
    },

    /// A capacity that must be non-zero was zero
    #[error("Capacity '{name}' must be non-zero")]
    ZeroCapacity {
        /// Name of the offending setting
        name: &'static str,
    },

    /// Bounded stall policy with no polls to spend
    #[error("Stall budget must allow at least one poll")]
    ZeroStallBudget,
}

/// Operator input errors - the edited value is left untouched
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// Text did not parse as a finite number
    #[error("Field '{field}' is not a valid number")]
    NotANumber {
        /// Field the text was meant for
        field: &'static str,
    },

    /// Number parsed but must be greater than zero
    #[error("Field '{field}' must be positive")]
    NotPositive {
        /// Field the text was meant for
        field: &'static str,
    },

    /// Row/column or channel index outside the addressed table
    #[error("Index {index} out of range for '{field}' (len {len})")]
    IndexOutOfRange {
        /// Table being addressed
        field: &'static str,
        /// Requested index
        index: usize,
        /// Table length along that axis
        len: usize,
    },
}

/// Errors raised while clocking data out of the bridge ADCs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionError<E> {
    /// GPIO read or write failed
    Pin(E),

    /// A device did not signal ready within the poll budget
    Stalled {
        /// First device still unready when the budget ran out
        channel: usize,
    },
}

impl<E: fmt::Debug> fmt::Display for AcquisitionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "GPIO access failed: {e:?}"),
            Self::Stalled { channel } => {
                write!(f, "Bridge {channel} never signalled data ready")
            }
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for AcquisitionError<E> {}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::PinCountMismatch { expected, actual } =>
                defmt::write!(fmt, "Declared {} devices, got {} pins", expected, actual),
            Self::TooManyDevices { requested, max } =>
                defmt::write!(fmt, "{} devices requested, max {}", requested, max),
            Self::InvalidGain { gain } =>
                defmt::write!(fmt, "Invalid gain {}", gain),
            Self::NonPositiveInterval { name } =>
                defmt::write!(fmt, "Interval {} must be positive", name),
            Self::ZeroCapacity { name } =>
                defmt::write!(fmt, "Capacity {} must be non-zero", name),
            Self::ZeroStallBudget =>
                defmt::write!(fmt, "Stall budget must be non-zero"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InputError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NotANumber { field } =>
                defmt::write!(fmt, "Field {} is not a number", field),
            Self::NotPositive { field } =>
                defmt::write!(fmt, "Field {} must be positive", field),
            Self::IndexOutOfRange { field, index, len } =>
                defmt::write!(fmt, "Index {} out of range for {} ({})", index, field, len),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for AcquisitionError<E> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Pin(e) => defmt::write!(fmt, "GPIO error: {}", e),
            Self::Stalled { channel } => defmt::write!(fmt, "Bridge {} stalled", channel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stall_message_names_channel() {
        let err: AcquisitionError<()> = AcquisitionError::Stalled { channel: 2 };
        assert_eq!(format!("{}", err), "Bridge 2 never signalled data ready");
    }

    #[test]
    fn config_error_message() {
        let err = ConfigError::PinCountMismatch { expected: 3, actual: 2 };
        assert_eq!(
            format!("{}", err),
            "Declared 3 devices but 2 data pins were supplied"
        );
    }
}
