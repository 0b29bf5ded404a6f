//! Acquisition and load-control core for triaxial test rigs
//!
//! Reads several strain-gauge bridges in lockstep over one bit-banged clock
//! line, reduces the samples to denoised channel values, derives specimen
//! stress, strain and drainage volumes, and runs the load-control law that
//! drives the hydraulic actuator DAC.
//!
//! Key constraints:
//! - Runs without `std` (GPIO through `embedded-hal` 1.0 traits)
//! - No heap allocation in the acquisition path
//! - Every actuator write is clamped to the DAC range
//!
//! ```no_run
//! use triax_core::{
//!     ActuatorGovernor, Channel, ChannelBank, CalibrationMap, DerivedMetrics,
//!     SpecimenGeometry,
//! };
//! use triax_core::sim::RecordingDac;
//!
//! let calibration = CalibrationMap::default();
//! let geometry = SpecimenGeometry::default();
//! let mut bank = ChannelBank::new();
//!
//! bank.publish(Channel::AxialLoad, &mut [1.2, 1.1, 1.3], &calibration);
//! let metrics = DerivedMetrics::compute(bank.physicals(), &geometry);
//!
//! let mut governor = ActuatorGovernor::new(RecordingDac::new());
//! governor.drive(70_000).unwrap(); // clamped to 65535
//! # let _ = metrics;
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod acquisition;
pub mod calibration;
pub mod channels;
pub mod constants;
pub mod control;
pub mod errors;
pub mod governor;
pub mod input;
pub mod metrics;
pub mod specimen;
pub mod time;
pub mod traits;

#[cfg(feature = "std")]
pub mod sim;

// Public API
pub use acquisition::{
    Conversion, DriverConfig, Gain, OutputUnit, StallPolicy, SyncAcquisitionDriver,
};
pub use calibration::{Calibration, CalibrationMap};
pub use channels::{median, Channel, ChannelBank};
pub use control::{
    ControlMode, ControlParameterTable, ControlSettings, ControlStep, LoadControlEngine,
    ModeExit,
};
pub use errors::{AcquisitionError, ConfigError, ConfigResult, InputError, InputResult};
pub use governor::ActuatorGovernor;
pub use metrics::DerivedMetrics;
pub use specimen::{GeometryField, SpecimenDimensions, SpecimenGeometry};
pub use time::{IntervalTimer, TimeSource, Timestamp};
pub use traits::{Dac, VoltageAdc};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
