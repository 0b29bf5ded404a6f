//! Simulated rig hardware
//!
//! Software stand-ins for the bridge converters, the pressure ADC and the
//! actuator DAC. They implement the same traits as the real parts, so the
//! driver, the control engine and the station loop run unchanged against
//! them on a desktop.
//!
//! ## Bridge model
//!
//! Each simulated converter walks the same states as the real part:
//!
//! ```text
//! Idle ──value available──▶ Ready (DT low)
//!   ▲                          │ rising edge
//!   │                          ▼
//! Converting ◀──next poll── Selecting ◀──24 bits── Shifting (DT = bit)
//! ```
//!
//! Values come from a per-device queue (deterministic tests) or from a
//! source closure (free-running demo). `Converting` lasts a configurable
//! number of data-line polls.
//!
//! Holding the clock high through a [`SimDelay`] of 60 µs or more powers
//! every device down; the next falling edge wakes them in `Idle` with any
//! half-shifted word discarded.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::constants::acquisition::CONVERSION_BITS;
use crate::traits::{Dac, VoltageAdc};

/// Clock-high time after which a device powers down (ns)
const POWER_DOWN_NS: u32 = 60_000;

/// Source of conversion codes for a free-running device
pub type CodeSource = Box<dyn FnMut() -> i32 + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Ready,
    Shifting { bit: u32 },
    Selecting { pulses: u8 },
    Converting { polls_left: u32 },
    PoweredDown,
}

struct SimDevice {
    phase: Phase,
    word: u32,
    level_high: bool,
    queued: VecDeque<i32>,
    source: Option<CodeSource>,
    conversion_polls: u32,
    last_select_pulses: u8,
}

impl SimDevice {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            word: 0,
            level_high: true,
            queued: VecDeque::new(),
            source: None,
            conversion_polls: 0,
            last_select_pulses: 0,
        }
    }

    fn next_code(&mut self) -> Option<i32> {
        self.queued
            .pop_front()
            .or_else(|| self.source.as_mut().map(|source| source()))
    }

    fn try_load(&mut self) -> bool {
        match self.next_code() {
            Some(code) => {
                self.word = (code as u32) & ((1 << CONVERSION_BITS) - 1);
                self.phase = Phase::Ready;
                true
            }
            None => {
                self.phase = Phase::Idle;
                false
            }
        }
    }

    fn rising_edge(&mut self) {
        match self.phase {
            Phase::Ready => {
                self.level_high = self.bit(0);
                self.phase = Phase::Shifting { bit: 1 };
            }
            Phase::Shifting { bit } if bit < CONVERSION_BITS => {
                self.level_high = self.bit(bit);
                self.phase = Phase::Shifting { bit: bit + 1 };
            }
            Phase::Shifting { .. } => {
                self.level_high = true;
                self.phase = Phase::Selecting { pulses: 1 };
            }
            Phase::Selecting { pulses } => {
                self.phase = Phase::Selecting { pulses: pulses.saturating_add(1) };
            }
            Phase::Idle | Phase::Converting { .. } | Phase::PoweredDown => {}
        }
    }

    fn bit(&self, index: u32) -> bool {
        (self.word >> (CONVERSION_BITS - 1 - index)) & 1 == 1
    }

    fn read_level(&mut self) -> bool {
        match self.phase {
            Phase::Ready => false,
            Phase::PoweredDown => true,
            Phase::Shifting { .. } => self.level_high,
            Phase::Selecting { pulses } => {
                self.last_select_pulses = pulses;
                self.phase = Phase::Converting { polls_left: self.conversion_polls };
                true
            }
            Phase::Converting { polls_left: 0 } | Phase::Idle => !self.try_load(),
            Phase::Converting { polls_left } => {
                self.phase = Phase::Converting { polls_left: polls_left - 1 };
                true
            }
        }
    }
}

struct BusState {
    clock_high: bool,
    rising_edges: u64,
    devices: Vec<SimDevice>,
}

/// Shared clock line plus simulated bridge converters
#[derive(Clone)]
pub struct SimBridgeBus {
    state: Arc<Mutex<BusState>>,
}

impl SimBridgeBus {
    /// Bus with `devices` idle converters
    pub fn new(devices: usize) -> Self {
        let state = BusState {
            clock_high: false,
            rising_edges: 0,
            devices: (0..devices).map(|_| SimDevice::new()).collect(),
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        // A panicking test thread must not hide the bus from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Delay provider tied to this bus
    pub fn delay(&self) -> SimDelay {
        SimDelay { bus: self.clone() }
    }

    /// Clock output pin
    pub fn clock_pin(&self) -> SimClockPin {
        SimClockPin { bus: self.clone() }
    }

    /// One data input pin per device, in device order
    pub fn data_pins(&self) -> Vec<SimDataPin> {
        let count = self.lock().devices.len();
        (0..count).map(|index| SimDataPin { bus: self.clone(), index }).collect()
    }

    /// Queue one conversion result on a device
    pub fn queue(&self, device: usize, code: i32) {
        self.lock().devices[device].queued.push_back(code);
    }

    /// Feed a device from a closure once its queue is empty
    pub fn set_source(&self, device: usize, source: CodeSource) {
        self.lock().devices[device].source = Some(source);
    }

    /// Data-line polls a device spends converting after each read
    pub fn set_conversion_polls(&self, device: usize, polls: u32) {
        self.lock().devices[device].conversion_polls = polls;
    }

    /// Gain-select pulses that followed the device's last 24 data bits
    pub fn last_select_pulses(&self, device: usize) -> u8 {
        self.lock().devices[device].last_select_pulses
    }

    /// Current clock level
    pub fn clock_is_high(&self) -> bool {
        self.lock().clock_high
    }

    /// Rising edges seen since construction
    pub fn rising_edges(&self) -> u64 {
        self.lock().rising_edges
    }
}

/// Simulated clock output
pub struct SimClockPin {
    bus: SimBridgeBus,
}

impl ErrorType for SimClockPin {
    type Error = Infallible;
}

impl OutputPin for SimClockPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut state = self.bus.lock();
        if !state.clock_high {
            state.clock_high = true;
            state.rising_edges += 1;
            for device in state.devices.iter_mut() {
                device.rising_edge();
            }
        }
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut state = self.bus.lock();
        state.clock_high = false;
        for device in state.devices.iter_mut() {
            if device.phase == Phase::PoweredDown {
                device.phase = Phase::Idle;
            }
        }
        Ok(())
    }
}

/// Simulated data/ready input of one device
pub struct SimDataPin {
    bus: SimBridgeBus,
    index: usize,
}

impl ErrorType for SimDataPin {
    type Error = Infallible;
}

impl InputPin for SimDataPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.bus.lock().devices[self.index].read_level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Delay that returns immediately but lets the bus see how long the clock
/// was held
pub struct SimDelay {
    bus: SimBridgeBus,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        let mut state = self.bus.lock();
        if state.clock_high && ns >= POWER_DOWN_NS {
            for device in state.devices.iter_mut() {
                device.phase = Phase::PoweredDown;
            }
        }
    }
}

/// Pressure ADC returning whatever voltage was last set
#[derive(Debug, Clone, Default)]
pub struct SimVoltageAdc {
    volts: Arc<Mutex<f32>>,
}

impl SimVoltageAdc {
    /// ADC reading a constant `volts`
    pub fn new(volts: f32) -> Self {
        Self { volts: Arc::new(Mutex::new(volts)) }
    }

    /// Change the voltage seen by every clone
    pub fn set(&self, volts: f32) {
        *self.volts.lock().unwrap_or_else(|p| p.into_inner()) = volts;
    }
}

impl VoltageAdc for SimVoltageAdc {
    type Error = Infallible;

    fn read_voltage(&mut self) -> Result<f32, Self::Error> {
        Ok(*self.volts.lock().unwrap_or_else(|p| p.into_inner()))
    }
}

/// DAC that records every code written to it
#[derive(Debug, Clone, Default)]
pub struct RecordingDac {
    writes: Arc<Mutex<Vec<u16>>>,
}

impl RecordingDac {
    /// DAC with nothing written yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Every code written so far
    pub fn writes(&self) -> Vec<u16> {
        self.writes.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Most recent code
    pub fn last(&self) -> Option<u16> {
        self.writes.lock().unwrap_or_else(|p| p.into_inner()).last().copied()
    }
}

impl Dac for RecordingDac {
    type Error = Infallible;

    fn write_code(&mut self, code: u16) -> Result<(), Self::Error> {
        self.writes.lock().unwrap_or_else(|p| p.into_inner()).push(code);
        Ok(())
    }
}
