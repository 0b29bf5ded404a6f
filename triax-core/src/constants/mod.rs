//! Constants for the Triaxial Rig Core
//!
//! Centralised numeric values used throughout the acquisition and control
//! path. Each value states its unit in the name where one applies.
//!
//! ## Organization
//!
//! - **Acquisition**: bridge ADC protocol widths, gains, queue sizes
//! - **Specimen**: default specimen and drain-tank geometry, physical constants
//! - **Control**: actuator scaling and control-law constants
//! - **Time**: unit conversions and default subsystem intervals
//!
//! ## Usage Guidelines
//!
//! 1. Use these constants instead of magic numbers
//! 2. Put the unit in the name (`_MM`, `_MS`, `_V`)
//! 3. Group related constants together

/// Bridge ADC protocol and sample-queue constants.
pub mod acquisition;

/// Specimen geometry defaults and physical constants.
pub mod specimen;

/// Actuator scaling and control-law constants.
pub mod control;

/// Time-related constants for intervals and unit conversion.
pub mod time;

// Re-export commonly used constants for convenience
pub use acquisition::{
    CONVERSION_BITS, MAX_CODE, MAX_DEVICES, DEFAULT_DEVICE_COUNT, CHANNEL_COUNT,
    SAMPLE_QUEUE_CAPACITY,
};

pub use specimen::{
    DEFAULT_SPECIMEN_HEIGHT_MM, DEFAULT_SPECIMEN_DIAMETER_MM,
    DEFAULT_DRAIN_TANK_DIAMETER_MM, DEFAULT_GRAIN_DENSITY,
};

pub use control::{
    DAC_MAX_CODE, DAC_FULL_SCALE_V, DAC_COUNTS, DEFAULT_AMP_FACTOR_N_PER_V,
    DEFAULT_ELASTIC_MODULUS_KPA,
};

pub use time::{
    MS_PER_SECOND, DEFAULT_UPDATE_INTERVAL_MS, DEFAULT_RECORD_INTERVAL_MS,
    DEFAULT_CONTROL_INTERVAL_MS,
};
