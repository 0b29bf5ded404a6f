//! Actuator governor
//!
//! Last stop before the DAC. Whatever a control law or the operator asks
//! for, the code written is clamped to `[0, 65535]`.

use crate::constants::control::{DAC_COUNTS, DAC_FULL_SCALE_V, DAC_MAX_CODE};
use crate::traits::Dac;

/// Clamp a requested code into the DAC range
///
/// ```rust
/// use triax_core::governor::clamp_code;
///
/// assert_eq!(clamp_code(-5), 0);
/// assert_eq!(clamp_code(70_000), 65_535);
/// assert_eq!(clamp_code(1234), 1234);
/// ```
pub fn clamp_code(requested: i64) -> u16 {
    requested.clamp(0, i64::from(DAC_MAX_CODE)) as u16
}

/// Nominal output voltage for a code
pub fn code_to_volts(code: u16) -> f32 {
    f32::from(code) * DAC_FULL_SCALE_V / DAC_COUNTS
}

/// Owns the DAC and remembers the last code written
pub struct ActuatorGovernor<D> {
    dac: D,
    last: u16,
}

impl<D: Dac> ActuatorGovernor<D> {
    /// Wrap a DAC; nothing is written until the first [`drive`](Self::drive)
    pub fn new(dac: D) -> Self {
        Self { dac, last: 0 }
    }

    /// Clamp `requested`, write it and return the code actually written
    pub fn drive(&mut self, requested: i64) -> Result<u16, D::Error> {
        let code = clamp_code(requested);
        if i64::from(code) != requested {
            log_debug!("actuator request {} clamped to {}", requested, code);
        }
        self.dac.write_code(code)?;
        self.last = code;
        Ok(code)
    }

    /// Last code written
    pub fn last_code(&self) -> u16 {
        self.last
    }

    /// Nominal voltage of the last code written
    pub fn voltage(&self) -> f32 {
        code_to_volts(self.last)
    }

    /// The wrapped DAC
    pub fn dac(&self) -> &D {
        &self.dac
    }

    /// Give the DAC back
    pub fn into_inner(self) -> D {
        self.dac
    }
}
