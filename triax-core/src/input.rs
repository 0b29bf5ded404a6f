//! Operator text parsing
//!
//! Every editable number on the panel arrives as text. Parsing either yields
//! a finite `f32` or an [`InputError`] naming the field; callers only write
//! the target after a successful parse, so a bad edit never leaves a field
//! half-updated.

use crate::errors::{InputError, InputResult};

/// Parse operator text for `field` as a finite number
///
/// Leading and trailing whitespace is ignored. `NaN` and infinities are
/// rejected along with non-numeric text.
///
/// ```rust
/// use triax_core::input::parse_field;
///
/// assert_eq!(parse_field(" 2.5 ", "slope"), Ok(2.5));
/// assert!(parse_field("abc", "slope").is_err());
/// assert!(parse_field("inf", "slope").is_err());
/// ```
pub fn parse_field(text: &str, field: &'static str) -> InputResult<f32> {
    match text.trim().parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(InputError::NotANumber { field }),
    }
}

/// Parse operator text that must be a positive number
pub fn parse_positive(text: &str, field: &'static str) -> InputResult<f32> {
    let value = parse_field(text, field)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(InputError::NotPositive { field })
    }
}

/// Check `index` against a table axis of length `len`
pub fn check_index(index: usize, len: usize, field: &'static str) -> InputResult<usize> {
    if index < len {
        Ok(index)
    } else {
        Err(InputError::IndexOutOfRange { field, index, len })
    }
}
