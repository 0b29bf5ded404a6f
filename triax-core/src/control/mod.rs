//! Closed-loop load control
//!
//! [`params`] holds the operator's 6×4 table, [`engine`] turns it plus the
//! latest metrics into actuator codes once per control period.

pub mod engine;
pub mod params;

pub use engine::{
    creep_correction, monotonic_increment, voltage_to_code, ControlMode, ControlSettings,
    ControlStep, LoadControlEngine, ModeExit,
};
pub use params::{
    ControlParameterTable, CreepParams, LoadDirection, MonotonicParams, Threshold,
};
