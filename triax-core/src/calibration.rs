//! Per-channel linear calibration
//!
//! `physical = slope · input + intercept`, where `input` is the denoised
//! millivolt (or raw code) value for the bridges and the ADC voltage for
//! the pressure channel.
//!
//! ## Tare
//!
//! Taring folds the current physical reading into the intercept:
//!
//! ```text
//! intercept' = intercept - (slope · input + intercept)
//! physical'  = slope · input + intercept' = 0
//! ```
//!
//! It is a relative zero, not an absolute calibration: the slope is kept and
//! later readings move away from zero as the input does.

use crate::channels::Channel;
use crate::constants::acquisition::CHANNEL_COUNT;
use crate::errors::InputResult;
use crate::input::parse_field;

/// Slope/intercept pair for one channel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Calibration {
    /// Physical units per input unit
    pub slope: f32,
    /// Physical value at zero input
    pub intercept: f32,
}

impl Calibration {
    /// Pair with the given slope and intercept
    pub const fn new(slope: f32, intercept: f32) -> Self {
        Self { slope, intercept }
    }

    /// Map an input value to physical units
    #[inline]
    pub fn apply(&self, input: f32) -> f32 {
        self.slope * input + self.intercept
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

/// Calibration for every channel, indexed by [`Channel`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationMap {
    pairs: [Calibration; CHANNEL_COUNT],
}

impl CalibrationMap {
    /// Map built from explicit pairs in channel order
    pub const fn from_pairs(pairs: [Calibration; CHANNEL_COUNT]) -> Self {
        Self { pairs }
    }

    /// Pair for a channel
    pub fn get(&self, channel: Channel) -> Calibration {
        self.pairs[channel.index()]
    }

    /// Every pair in channel order
    pub fn pairs(&self) -> &[Calibration; CHANNEL_COUNT] {
        &self.pairs
    }

    /// Physical value of `input` on `channel`
    pub fn apply(&self, channel: Channel, input: f32) -> f32 {
        self.pairs[channel.index()].apply(input)
    }

    /// Replace the slope
    pub fn set_slope(&mut self, channel: Channel, slope: f32) {
        self.pairs[channel.index()].slope = slope;
    }

    /// Replace the intercept
    pub fn set_intercept(&mut self, channel: Channel, intercept: f32) {
        self.pairs[channel.index()].intercept = intercept;
    }

    /// Parse and apply a slope edit; on error the slope is unchanged
    pub fn set_slope_text(&mut self, channel: Channel, text: &str) -> InputResult<f32> {
        let slope = parse_field(text, "slope")?;
        self.set_slope(channel, slope);
        Ok(slope)
    }

    /// Parse and apply an intercept edit; on error the intercept is unchanged
    pub fn set_intercept_text(&mut self, channel: Channel, text: &str) -> InputResult<f32> {
        let intercept = parse_field(text, "intercept")?;
        self.set_intercept(channel, intercept);
        Ok(intercept)
    }

    /// Shift the intercept so `current_physical` reads as zero
    ///
    /// Returns the new intercept.
    pub fn tare(&mut self, channel: Channel, current_physical: f32) -> f32 {
        let pair = &mut self.pairs[channel.index()];
        pair.intercept -= current_physical;
        pair.intercept
    }
}
