//! Control parameter table
//!
//! Six rows by four columns. The column is the control mode (column 0
//! belongs to Idle and is never read); the meaning of a row depends on the
//! column.
//!
//! | row | Creep (1)          | Monotonic (2)        | Cyclic (3)   |
//! |-----|--------------------|----------------------|--------------|
//! | 0   | threshold flag     | direction flag       | reserved     |
//! | 1   | step duration (s)  | target stress (kPa)  | reserved     |
//! | 2   | target             | target strain (%)    | reserved     |
//! | 3   | lower band         | stress rate (kPa/s)  | reserved     |
//! | 4   | upper band         | stress limit (kPa)   | reserved     |
//! | 5   | stress rate (kPa/s)| strain limit (%)     | reserved     |
//!
//! A flag of exactly `0` selects the first option (stress, compression);
//! anything else the second.

use crate::constants::control::{CONTROL_PARAM_COLS, CONTROL_PARAM_ROWS};
use crate::control::engine::ControlMode;
use crate::errors::InputResult;
use crate::input::{check_index, parse_field};

/// Operator-editable control parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlParameterTable {
    cells: [[f32; CONTROL_PARAM_COLS]; CONTROL_PARAM_ROWS],
}

impl ControlParameterTable {
    /// Table with every cell at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell value
    pub fn get(&self, row: usize, col: usize) -> InputResult<f32> {
        let row = check_index(row, CONTROL_PARAM_ROWS, "control_param_row")?;
        let col = check_index(col, CONTROL_PARAM_COLS, "control_param_col")?;
        Ok(self.cells[row][col])
    }

    /// Set a cell
    pub fn set(&mut self, row: usize, col: usize, value: f32) -> InputResult<()> {
        let row = check_index(row, CONTROL_PARAM_ROWS, "control_param_row")?;
        let col = check_index(col, CONTROL_PARAM_COLS, "control_param_col")?;
        self.cells[row][col] = value;
        Ok(())
    }

    /// Parse and set a cell; on error the table is unchanged
    pub fn set_text(&mut self, row: usize, col: usize, text: &str) -> InputResult<f32> {
        let value = parse_field(text, "control_param")?;
        self.set(row, col, value)?;
        Ok(value)
    }

    /// All rows of one mode's column
    pub fn column(&self, mode: ControlMode) -> [f32; CONTROL_PARAM_ROWS] {
        let col = mode.column();
        let mut out = [0.0; CONTROL_PARAM_ROWS];
        for (slot, row) in out.iter_mut().zip(self.cells.iter()) {
            *slot = row[col];
        }
        out
    }

    /// Creep column, named
    pub fn creep(&self) -> CreepParams {
        let [flag, duration_s, target, lower_band, upper_band, stress_rate] =
            self.column(ControlMode::Creep);
        CreepParams {
            threshold: if flag == 0.0 { Threshold::Stress } else { Threshold::Strain },
            duration_s,
            target,
            lower_band,
            upper_band,
            stress_rate,
        }
    }

    /// Monotonic column, named
    pub fn monotonic(&self) -> MonotonicParams {
        let [flag, target_stress, target_strain, stress_rate, stress_limit, strain_limit] =
            self.column(ControlMode::Monotonic);
        MonotonicParams {
            direction: if flag == 0.0 { LoadDirection::Compression } else { LoadDirection::Extension },
            target_stress,
            target_strain,
            stress_rate,
            stress_limit,
            strain_limit,
        }
    }
}

/// Quantity a creep step holds constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    /// Axial stress
    Stress,
    /// Axial strain
    Strain,
}

/// Ramp direction for monotonic loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadDirection {
    /// Code increases each tick
    Compression,
    /// Code decreases each tick
    Extension,
}

/// Creep-mode parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreepParams {
    /// Held quantity
    pub threshold: Threshold,
    /// Step duration (s)
    pub duration_s: f32,
    /// Target stress (kPa) or strain (%)
    pub target: f32,
    /// Offset below which nothing is corrected
    pub lower_band: f32,
    /// Offset above which the full rate is applied
    pub upper_band: f32,
    /// Correction rate (kPa/s)
    pub stress_rate: f32,
}

/// Monotonic-mode parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonotonicParams {
    /// Ramp direction
    pub direction: LoadDirection,
    /// Stress the limit is measured from (kPa)
    pub target_stress: f32,
    /// Strain the limit is measured from (%)
    pub target_strain: f32,
    /// Ramp rate (kPa/s)
    pub stress_rate: f32,
    /// Stress offset that ends the ramp (kPa)
    pub stress_limit: f32,
    /// Strain offset that ends the ramp (%)
    pub strain_limit: f32,
}
