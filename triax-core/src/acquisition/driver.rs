//! Synchronized multi-bridge acquisition driver
//!
//! ## Protocol
//!
//! Every bridge converter holds its data line high while converting and pulls
//! it low when a 24-bit result is ready. All converters share one clock.
//!
//! ```text
//! poll:      DT0 ‾‾‾‾\___________      latch 0 ─┐
//!            DT1 ‾‾‾‾‾‾‾‾‾\______      latch 1 ─┼─ all set → read
//!            DT2 ‾‾‾‾‾‾\_________      latch 2 ─┘
//!
//! read:      SCK _/‾\_/‾\_ ... _/‾\_ | _/‾\_ (_/‾\_ _/‾\_)
//!                 24 data clocks      | gain-select clocks
//!                 sample after each   | 1 for gain 128, 3 for gain 64
//! ```
//!
//! A conversion is read only once every latch is set, so the three words
//! always come from the same conversion period. Readiness is polled without
//! blocking; a bridge that is ready early simply waits for the others.
//!
//! ## Sharing
//!
//! Every clock-line operation takes `&mut self`. A caller that needs power
//! transitions from another thread wraps the driver in a single mutex; that
//! mutex is then the only place the clock line can be driven from.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;

use crate::acquisition::bitbang::BitBangLine;
use crate::constants::acquisition::{
    CONVERSION_BITS, DEFAULT_DEVICE_COUNT, DEFAULT_INPUT_VOLTAGE_V, GAIN_128_PULSES,
    GAIN_64_PULSES, MAX_CODE, MAX_DEVICES, POWER_TRANSITION_HOLD_US, SIGN_BIT, WORD_MASK,
};
use crate::errors::{AcquisitionError, ConfigError, ConfigResult};

/// Decode an MSB-first 24-bit twos-complement word
///
/// Bits above the 24th are ignored.
///
/// ```rust
/// use triax_core::acquisition::decode_word;
///
/// assert_eq!(decode_word(0x00_0000), 0);
/// assert_eq!(decode_word(0x80_0000), -(1 << 23));
/// assert_eq!(decode_word(0x7F_FFFF), (1 << 23) - 1);
/// ```
pub fn decode_word(word: u32) -> i32 {
    let word = word & WORD_MASK;
    (word & !SIGN_BIT) as i32 - (word & SIGN_BIT) as i32
}

/// Convert a decoded code to bridge output in millivolts
pub fn code_to_millivolts(raw: i32, input_voltage: f32, gain: Gain) -> f32 {
    raw as f32 / MAX_CODE as f32 * (input_voltage / gain.multiplier()) * 1000.0
}

/// Channel A amplifier gain
///
/// The gain also decides how many clock pulses follow the 24 data clocks:
/// one for 128, three for 64 and one for anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Gain(u8);

impl Gain {
    /// Gain 128 (channel A default)
    pub const X128: Gain = Gain(128);
    /// Gain 64
    pub const X64: Gain = Gain(64);

    /// Build a gain, rejecting zero
    pub fn new(gain: u8) -> ConfigResult<Self> {
        if gain == 0 {
            Err(ConfigError::InvalidGain { gain })
        } else {
            Ok(Gain(gain))
        }
    }

    /// Amplification factor
    pub fn multiplier(self) -> f32 {
        self.0 as f32
    }

    /// Clock pulses that select this gain for the next conversion
    pub fn select_pulses(self) -> u8 {
        match self.0 {
            128 => GAIN_128_PULSES,
            64 => GAIN_64_PULSES,
            _ => GAIN_128_PULSES,
        }
    }
}

impl Default for Gain {
    fn default() -> Self {
        Gain::X128
    }
}

impl TryFrom<u8> for Gain {
    type Error = ConfigError;

    fn try_from(gain: u8) -> Result<Self, Self::Error> {
        Gain::new(gain)
    }
}

impl From<Gain> for u8 {
    fn from(gain: Gain) -> u8 {
        gain.0
    }
}

/// Unit of the values the driver hands to the sample queues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputUnit {
    /// Bridge output in millivolts
    #[default]
    Millivolts,
    /// Decoded twos-complement code
    RawCode,
}

/// What to do when a bridge never signals ready
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StallPolicy {
    /// Keep polling forever; the channel silently stops advancing
    #[default]
    Wait,
    /// Report `Stalled` after this many consecutive polls without a conversion
    Bounded {
        /// Poll budget
        max_polls: u32,
    },
}

/// Driver settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DriverConfig {
    /// Number of bridges on the shared clock
    pub device_count: usize,
    /// Channel A gain
    pub gain: Gain,
    /// Bridge excitation voltage (V)
    pub input_voltage: f32,
    /// Unit pushed to the sample queues
    pub output_unit: OutputUnit,
    /// Stall handling
    pub stall_policy: StallPolicy,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            device_count: DEFAULT_DEVICE_COUNT,
            gain: Gain::X128,
            input_voltage: DEFAULT_INPUT_VOLTAGE_V,
            output_unit: OutputUnit::Millivolts,
            stall_policy: StallPolicy::Wait,
        }
    }
}

/// One synchronized conversion across every bridge
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Conversion {
    /// Decoded codes, one per bridge
    pub raw: Vec<i32, MAX_DEVICES>,
    /// The same codes in millivolts
    pub millivolts: Vec<f32, MAX_DEVICES>,
}

impl Conversion {
    /// Value of bridge `index` in the requested unit
    pub fn value(&self, index: usize, unit: OutputUnit) -> Option<f32> {
        match unit {
            OutputUnit::Millivolts => self.millivolts.get(index).copied(),
            OutputUnit::RawCode => self.raw.get(index).map(|&code| code as f32),
        }
    }

    /// Number of bridges in the conversion
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// True for a conversion with no bridges
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Reads several bridge converters in lockstep over one clock line
pub struct SyncAcquisitionDriver<CLK, DT, D> {
    line: BitBangLine<CLK, DT>,
    delay: D,
    config: DriverConfig,
    ready: Vec<bool, MAX_DEVICES>,
    idle_polls: u32,
    last: Conversion,
}

impl<CLK, DT, D, E> SyncAcquisitionDriver<CLK, DT, D>
where
    CLK: OutputPin<Error = E>,
    DT: InputPin<Error = E>,
    D: DelayNs,
{
    /// Build a driver, checking the data pins against the declared device count
    ///
    /// No pin is touched. Call [`init`](Self::init) to power-cycle the bridges.
    pub fn new<I>(clock: CLK, data: I, delay: D, config: DriverConfig) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = DT>,
    {
        if config.device_count > MAX_DEVICES {
            return Err(ConfigError::TooManyDevices {
                requested: config.device_count,
                max: MAX_DEVICES,
            });
        }

        let mut pins: Vec<DT, MAX_DEVICES> = Vec::new();
        let mut supplied = 0;
        for pin in data {
            supplied += 1;
            // Extra pins past capacity are only counted
            let _ = pins.push(pin);
        }

        if supplied > MAX_DEVICES {
            return Err(ConfigError::TooManyDevices { requested: supplied, max: MAX_DEVICES });
        }
        if supplied != config.device_count {
            return Err(ConfigError::PinCountMismatch {
                expected: config.device_count,
                actual: supplied,
            });
        }

        let mut ready = Vec::new();
        let mut last = Conversion::default();
        for _ in 0..supplied {
            let _ = ready.push(false);
            let _ = last.raw.push(0);
            let _ = last.millivolts.push(0.0);
        }

        Ok(Self {
            line: BitBangLine::new(clock, pins),
            delay,
            config,
            ready,
            idle_polls: 0,
            last,
        })
    }

    /// Power-cycle the bridges and discard the first conversion
    pub fn init(&mut self) -> Result<(), AcquisitionError<E>> {
        self.power_down()?;
        self.power_up()
    }

    /// Driver settings
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Number of bridges
    pub fn device_count(&self) -> usize {
        self.line.len()
    }

    /// Whether bridge `index` has signalled ready since the last read
    pub fn is_latched(&self, index: usize) -> bool {
        self.ready.get(index).copied().unwrap_or(false)
    }

    /// Most recent conversion (zeros before the first read)
    pub fn last_conversion(&self) -> &Conversion {
        &self.last
    }

    /// Put every bridge into power-down by holding the clock high
    pub fn power_down(&mut self) -> Result<(), AcquisitionError<E>> {
        self.line.clock_low().map_err(AcquisitionError::Pin)?;
        self.line.clock_high().map_err(AcquisitionError::Pin)?;
        self.delay.delay_us(POWER_TRANSITION_HOLD_US);
        log_debug!("bridges powered down");
        Ok(())
    }

    /// Wake the bridges by releasing the clock, then make one throwaway read
    ///
    /// Latches from before the power cycle are stale and are cleared. The
    /// throwaway read only clocks if every bridge is already ready.
    pub fn power_up(&mut self) -> Result<(), AcquisitionError<E>> {
        self.line.clock_low().map_err(AcquisitionError::Pin)?;
        self.delay.delay_us(POWER_TRANSITION_HOLD_US);
        for latched in self.ready.iter_mut() {
            *latched = false;
        }
        self.idle_polls = 0;
        log_debug!("bridges powered up");

        match self.read_conversion() {
            Ok(_) | Err(nb::Error::WouldBlock) => Ok(()),
            Err(nb::Error::Other(AcquisitionError::Stalled { .. })) => Ok(()),
            Err(nb::Error::Other(err)) => Err(err),
        }
    }

    /// Latch any newly ready bridges; true once every latch is set
    pub fn poll_ready(&mut self) -> Result<bool, E> {
        for (index, latched) in self.ready.iter_mut().enumerate() {
            if !*latched {
                *latched = self.line.is_low(index)?;
            }
        }
        Ok(self.ready.iter().all(|&latched| latched))
    }

    /// Attempt one synchronized read
    ///
    /// Returns `WouldBlock` until every bridge has been seen ready. With
    /// [`StallPolicy::Bounded`] a run of unproductive polls longer than the
    /// budget yields `Stalled` for the first unready bridge and restarts the
    /// count.
    pub fn read_conversion(&mut self) -> nb::Result<Conversion, AcquisitionError<E>> {
        let all_ready = self
            .poll_ready()
            .map_err(|e| nb::Error::Other(AcquisitionError::Pin(e)))?;

        if !all_ready {
            self.idle_polls = self.idle_polls.saturating_add(1);
            if let StallPolicy::Bounded { max_polls } = self.config.stall_policy {
                if self.idle_polls >= max_polls {
                    self.idle_polls = 0;
                    let channel = self.ready.iter().position(|&latched| !latched).unwrap_or(0);
                    log_warn!("bridge {} stalled after {} polls", channel, max_polls);
                    return Err(nb::Error::Other(AcquisitionError::Stalled { channel }));
                }
            }
            return Err(nb::Error::WouldBlock);
        }

        self.idle_polls = 0;
        self.clock_out().map_err(|e| nb::Error::Other(AcquisitionError::Pin(e)))?;
        Ok(self.last.clone())
    }

    /// Hand back the clock and data pins
    pub fn release(self) -> (CLK, Vec<DT, MAX_DEVICES>) {
        self.line.release()
    }

    fn clock_out(&mut self) -> Result<(), E> {
        let count = self.line.len();
        let mut words = [0u32; MAX_DEVICES];

        for _ in 0..CONVERSION_BITS {
            self.line.shift_in(&mut words[..count])?;
        }

        log_trace!("conversion words {:06x?}", &words[..count]);

        for (index, &word) in words[..count].iter().enumerate() {
            let raw = decode_word(word);
            self.last.raw[index] = raw;
            self.last.millivolts[index] =
                code_to_millivolts(raw, self.config.input_voltage, self.config.gain);
        }

        for _ in 0..self.config.gain.select_pulses() {
            self.line.pulse()?;
        }

        for latched in self.ready.iter_mut() {
            *latched = false;
        }
        Ok(())
    }
}
