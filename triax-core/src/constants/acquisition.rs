//! Bridge ADC Protocol Constants
//!
//! Values dictated by the HX711-family bridge converter and by the rig's
//! channel layout.

// ===== CONVERSION FORMAT =====

/// Data clocks per conversion.
///
/// Each conversion is shifted out MSB first as a 24-bit twos-complement word.
pub const CONVERSION_BITS: u32 = 24;

/// Largest positive conversion code (2^23 - 1).
///
/// Used as the full-scale divisor when converting codes to millivolts.
pub const MAX_CODE: i32 = (1 << (CONVERSION_BITS - 1)) - 1;

/// Sign bit of a conversion word.
pub const SIGN_BIT: u32 = 1 << (CONVERSION_BITS - 1);

/// Mask selecting the 24 data bits of a shifted-in word.
pub const WORD_MASK: u32 = (1 << CONVERSION_BITS) - 1;

// ===== GAIN SELECTION =====

/// Extra clock pulses selecting channel A, gain 128, for the next conversion.
pub const GAIN_128_PULSES: u8 = 1;

/// Extra clock pulses selecting channel A, gain 64, for the next conversion.
pub const GAIN_64_PULSES: u8 = 3;

// ===== TIMING =====

/// Clock hold time for power transitions (microseconds).
///
/// The converter powers down once the clock stays high for more than 60 µs;
/// holding 100 µs leaves margin.
pub const POWER_TRANSITION_HOLD_US: u32 = 100;

/// Default bridge excitation voltage (V).
pub const DEFAULT_INPUT_VOLTAGE_V: f32 = 5.0;

// ===== DEVICE AND CHANNEL LAYOUT =====

/// Maximum bridges sharing one clock line.
pub const MAX_DEVICES: usize = 8;

/// Bridges fitted to the rig (axial load, displacement, tank load).
pub const DEFAULT_DEVICE_COUNT: usize = 3;

/// Logical channels: three bridges plus the hydraulic-pressure ADC.
pub const CHANNEL_COUNT: usize = 4;

// ===== QUEUES =====

/// Per-channel sample queue capacity.
///
/// At roughly 80 conversions per second and a one-second update interval the
/// queue holds comfortably more than one drain period.
pub const SAMPLE_QUEUE_CAPACITY: usize = 100;
