//! Shared-clock bit-bang line
//!
//! One clock output fanned out to every bridge converter, one data input
//! per converter. A pulse is a rising edge followed by a falling edge; data
//! lines are sampled after the falling edge, when every converter has
//! presented its next bit.

use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;

use crate::constants::acquisition::MAX_DEVICES;

/// Clock pin plus the data pins it drives, nothing else
pub struct BitBangLine<CLK, DT> {
    clock: CLK,
    data: Vec<DT, MAX_DEVICES>,
}

impl<CLK, DT, E> BitBangLine<CLK, DT>
where
    CLK: OutputPin<Error = E>,
    DT: InputPin<Error = E>,
{
    /// Bundle a clock pin with its data pins
    pub fn new(clock: CLK, data: Vec<DT, MAX_DEVICES>) -> Self {
        Self { clock, data }
    }

    /// Number of data lines
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when no data lines are attached
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drive the clock high
    pub fn clock_high(&mut self) -> Result<(), E> {
        self.clock.set_high()
    }

    /// Drive the clock low
    pub fn clock_low(&mut self) -> Result<(), E> {
        self.clock.set_low()
    }

    /// One full clock pulse without sampling
    pub fn pulse(&mut self) -> Result<(), E> {
        self.clock.set_high()?;
        self.clock.set_low()
    }

    /// Whether data line `index` is currently low
    ///
    /// # Panics
    /// If `index` is not below [`len`](Self::len).
    pub fn is_low(&mut self, index: usize) -> Result<bool, E> {
        self.data[index].is_low()
    }

    /// Pulse once and shift the sampled level of every line into its word
    ///
    /// `words[i]` receives line `i`'s bit as its new least significant bit,
    /// so 24 calls leave an MSB-first conversion word in each slot.
    pub fn shift_in(&mut self, words: &mut [u32]) -> Result<(), E> {
        self.pulse()?;
        for (word, pin) in words.iter_mut().zip(self.data.iter_mut()) {
            *word = (*word << 1) | u32::from(pin.is_high()?);
        }
        Ok(())
    }

    /// Give the pins back
    pub fn release(self) -> (CLK, Vec<DT, MAX_DEVICES>) {
        (self.clock, self.data)
    }
}
