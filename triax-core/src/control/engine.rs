//! Load-control engine
//!
//! ## Modes
//!
//! ```text
//!            select_mode                 duration elapsed
//!   Idle ────────────────▶ Creep ──────────────────────────┐
//!    ▲ ▲                                                   │
//!    │ └──────────────── Monotonic ◀── select_mode         │
//!    │   stress/strain                                      │
//!    │   limit exceeded                                     │
//!    └──────────────────────────────────────────────────────┘
//!   Cyclic: selectable, no control law
//! ```
//!
//! Every tick produces a signed delta on the actuator code and hands
//! `code + delta` to the [`ActuatorGovernor`], which clamps and writes it.
//! Idle and Cyclic ticks still write the current code.
//!
//! ## Creep
//!
//! Holds stress at the target. The offset `σ_a - target` is compared with a
//! dead band:
//!
//! ```text
//!  correction
//!      ▲
//! full ┤              ┌──────────
//!      │            ╱
//!      │          ╱
//!    0 ┼────────┘
//!      └────────┬─────┬─────────▶ |offset|
//!             lower upper
//! ```
//!
//! Full-rate correction is the stress rate over one control period turned
//! into force through the specimen area, then into volts through the
//! amplifier factor, then into DAC counts:
//!
//! ```text
//! rate · period / 1000 · area / amp / 5 · 65536
//! ```
//!
//! The correction is truncated toward zero and subtracted with the sign of
//! the offset. With the strain threshold selected the offset is converted
//! to a stress offset through the base elastic modulus and nothing is
//! applied.
//!
//! ## Monotonic
//!
//! An open-loop ramp: a fixed `trunc(rate / amp / 5 · 65536)` counts per
//! tick, up for compression and down for extension, until the signed stress
//! or strain offset from its target passes its limit.

use crate::constants::control::{
    DAC_COUNTS, DAC_FULL_SCALE_V, DEFAULT_AMP_FACTOR_N_PER_V, DEFAULT_ELASTIC_MODULUS_KPA,
};
use crate::constants::specimen::{PERCENT, UNIT_SCALE};
use crate::constants::time::DEFAULT_CONTROL_INTERVAL_MS;
use crate::control::params::{ControlParameterTable, CreepParams, LoadDirection, MonotonicParams, Threshold};
use crate::governor::ActuatorGovernor;
use crate::metrics::DerivedMetrics;
use crate::specimen::SpecimenGeometry;
use crate::time::{elapsed_secs, Timestamp};
use crate::traits::Dac;

/// Operating mode, one per parameter-table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ControlMode {
    /// No control law
    #[default]
    Idle,
    /// Hold stress inside a dead band
    Creep,
    /// Fixed-rate ramp until a limit
    Monotonic,
    /// Reserved, no control law
    Cyclic,
}

impl ControlMode {
    /// Parameter-table column
    pub const fn column(self) -> usize {
        match self {
            ControlMode::Idle => 0,
            ControlMode::Creep => 1,
            ControlMode::Monotonic => 2,
            ControlMode::Cyclic => 3,
        }
    }

    /// Mode owning column `column`
    pub const fn from_column(column: usize) -> Option<ControlMode> {
        match column {
            0 => Some(ControlMode::Idle),
            1 => Some(ControlMode::Creep),
            2 => Some(ControlMode::Monotonic),
            3 => Some(ControlMode::Cyclic),
            _ => None,
        }
    }
}

/// Why an automatic mode handed back to Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeExit {
    /// Creep step ran longer than its duration
    DurationElapsed,
    /// Monotonic stress offset passed its limit
    StressLimit,
    /// Monotonic strain offset passed its limit
    StrainLimit,
}

/// Outcome of one control tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlStep {
    /// Mode that ran this tick
    pub mode: ControlMode,
    /// Signed change requested on the code
    pub delta: i64,
    /// Code written to the DAC
    pub code: u16,
    /// Set when the tick ended an automatic mode
    pub exit: Option<ModeExit>,
}

/// Fixed constants of the control law
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControlSettings {
    /// Control period (s)
    pub period_s: f32,
    /// Servo amplifier factor (N/V)
    pub amp_factor: f32,
    /// Modulus for strain-to-stress offsets (kPa)
    pub elastic_modulus: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            period_s: DEFAULT_CONTROL_INTERVAL_MS as f32 / 1000.0,
            amp_factor: DEFAULT_AMP_FACTOR_N_PER_V,
            elastic_modulus: DEFAULT_ELASTIC_MODULUS_KPA,
        }
    }
}

/// `-1`, `0` or `1`, with zero for zero
fn sign(value: f32) -> f32 {
    if value == 0.0 {
        0.0
    } else {
        value.signum()
    }
}

/// Signed creep correction for a stress offset, truncated toward zero
///
/// Positive when the offset is positive. The caller subtracts it from the
/// code. Zero inside the lower band.
pub fn creep_correction(
    offset: f32,
    params: &CreepParams,
    period_s: f32,
    area: f32,
    amp_factor: f32,
) -> i64 {
    let magnitude = offset.abs();
    let to_counts = |stress: f32| stress / UNIT_SCALE * area / amp_factor / DAC_FULL_SCALE_V * DAC_COUNTS;

    let correction = if magnitude > params.upper_band {
        to_counts(sign(offset) * params.stress_rate * period_s)
    } else if magnitude > params.lower_band {
        let fraction = (magnitude - params.lower_band) / (params.upper_band - params.lower_band);
        to_counts(sign(offset) * params.stress_rate * period_s * fraction)
    } else {
        0.0
    };
    correction as i64
}

/// Per-tick monotonic increment, before the direction sign
pub fn monotonic_increment(stress_rate: f32, amp_factor: f32) -> i64 {
    (stress_rate / amp_factor / DAC_FULL_SCALE_V * DAC_COUNTS) as i64
}

/// Code for a manual voltage request
///
/// `trunc(clamp(volts / 5, 0, 1) · 65536)`; 5 V yields 65536, which the
/// governor clamps.
pub fn voltage_to_code(volts: f32) -> i64 {
    ((volts / DAC_FULL_SCALE_V).clamp(0.0, 1.0) * DAC_COUNTS) as i64
}

/// Mode state machine plus the actuator code it owns
#[derive(Debug, Clone)]
pub struct LoadControlEngine {
    mode: ControlMode,
    step_start: Timestamp,
    output_code: u16,
    controlling: bool,
    settings: ControlSettings,
}

impl LoadControlEngine {
    /// Idle, not controlling, code zero
    pub fn new(settings: ControlSettings, now: Timestamp) -> Self {
        Self {
            mode: ControlMode::Idle,
            step_start: now,
            output_code: 0,
            controlling: false,
            settings,
        }
    }

    /// Current mode
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Current actuator code
    pub fn output_code(&self) -> u16 {
        self.output_code
    }

    /// Whether ticks are being applied
    pub fn is_controlling(&self) -> bool {
        self.controlling
    }

    /// Start of the current step
    pub fn step_start(&self) -> Timestamp {
        self.step_start
    }

    /// Control-law constants
    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    /// Switch mode and restart the step clock
    pub fn select_mode(&mut self, mode: ControlMode, now: Timestamp) {
        if mode != self.mode {
            log_info!("control mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
        self.step_start = now;
    }

    /// Begin applying ticks and restart the step clock
    pub fn start(&mut self, now: Timestamp) {
        self.controlling = true;
        self.step_start = now;
        log_info!("control started in {:?}", self.mode);
    }

    /// Stop applying ticks; the code is held
    pub fn stop(&mut self) {
        self.controlling = false;
        log_info!("control stopped at code {}", self.output_code);
    }

    /// Write a manual voltage request immediately
    pub fn override_voltage<D: Dac>(
        &mut self,
        volts: f32,
        governor: &mut ActuatorGovernor<D>,
    ) -> Result<u16, D::Error> {
        let code = governor.drive(voltage_to_code(volts))?;
        self.output_code = code;
        Ok(code)
    }

    /// Run one control period
    ///
    /// Returns `Ok(None)` without touching the DAC while not controlling.
    pub fn tick<D: Dac>(
        &mut self,
        now: Timestamp,
        metrics: &DerivedMetrics,
        geometry: &SpecimenGeometry,
        params: &ControlParameterTable,
        governor: &mut ActuatorGovernor<D>,
    ) -> Result<Option<ControlStep>, D::Error> {
        if !self.controlling {
            return Ok(None);
        }

        let mode = self.mode;
        let elapsed = elapsed_secs(self.step_start, now);
        let (delta, exit) = match mode {
            ControlMode::Idle | ControlMode::Cyclic => (0, None),
            ControlMode::Creep => self.creep_delta(elapsed, metrics, geometry, &params.creep()),
            ControlMode::Monotonic => self.monotonic_delta(metrics, &params.monotonic()),
        };

        if let Some(reason) = exit {
            log_info!("{:?} finished: {:?}", mode, reason);
            self.mode = ControlMode::Idle;
        }

        let requested = i64::from(self.output_code) + delta;
        let code = governor.drive(requested)?;
        self.output_code = code;
        log_trace!("control tick {:?} delta {} code {}", mode, delta, code);

        Ok(Some(ControlStep { mode, delta, code, exit }))
    }

    fn creep_delta(
        &self,
        elapsed: f32,
        metrics: &DerivedMetrics,
        geometry: &SpecimenGeometry,
        params: &CreepParams,
    ) -> (i64, Option<ModeExit>) {
        if elapsed > params.duration_s {
            return (0, Some(ModeExit::DurationElapsed));
        }

        match params.threshold {
            Threshold::Stress => {
                let offset = metrics.axial_stress - params.target;
                let correction = creep_correction(
                    offset,
                    params,
                    self.settings.period_s,
                    geometry.area(),
                    self.settings.amp_factor,
                );
                (-correction, None)
            }
            Threshold::Strain => {
                // Strain-held creep has no control law yet
                let offset = (metrics.axial_strain - params.target) / PERCENT
                    * self.settings.elastic_modulus;
                log_trace!("strain creep offset {} kPa, no action", offset);
                (0, None)
            }
        }
    }

    fn monotonic_delta(
        &self,
        metrics: &DerivedMetrics,
        params: &MonotonicParams,
    ) -> (i64, Option<ModeExit>) {
        let stress_offset = metrics.axial_stress - params.target_stress;
        let strain_offset = metrics.axial_strain - params.target_strain;

        if stress_offset > params.stress_limit {
            return (0, Some(ModeExit::StressLimit));
        }
        if strain_offset > params.strain_limit {
            return (0, Some(ModeExit::StrainLimit));
        }

        let step = monotonic_increment(params.stress_rate, self.settings.amp_factor);
        match params.direction {
            LoadDirection::Compression => (step, None),
            LoadDirection::Extension => (-step, None),
        }
    }
}
