//! Actuator Scaling and Control-Law Constants

// ===== DAC =====

/// Largest code accepted by the 16-bit actuator DAC.
pub const DAC_MAX_CODE: u16 = u16::MAX;

/// Number of DAC steps used when converting volts to codes.
///
/// The panel maps the full 0-5 V span onto 65536 steps, so 5 V requests
/// 65536 and is clamped to [`DAC_MAX_CODE`] by the governor.
pub const DAC_COUNTS: f32 = 65536.0;

/// DAC output voltage at full scale (V).
pub const DAC_FULL_SCALE_V: f32 = 5.0;

// ===== CONTROL LAW =====

/// Servo amplifier factor (N per volt of DAC output).
pub const DEFAULT_AMP_FACTOR_N_PER_V: f32 = 100.0;

/// Base elastic modulus used to turn a strain offset into a stress offset (kPa).
pub const DEFAULT_ELASTIC_MODULUS_KPA: f32 = 10000.0;

/// Rows in the control parameter table.
pub const CONTROL_PARAM_ROWS: usize = 6;

/// Columns in the control parameter table (one per control mode).
pub const CONTROL_PARAM_COLS: usize = 4;
