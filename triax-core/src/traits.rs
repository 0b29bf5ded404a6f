//! Collaborator traits for the rig's commodity converters
//!
//! The bridge ADCs are bit-banged through `embedded_hal::digital` pins.
//! The hydraulic-pressure ADC and the actuator DAC are I2C parts with their
//! own register protocols, so the core only sees them through these two
//! capabilities.

/// External ADC that reports one channel as a voltage
pub trait VoltageAdc {
    /// Transport or device error
    type Error: core::fmt::Debug;

    /// Read the current channel voltage in volts
    fn read_voltage(&mut self) -> Result<f32, Self::Error>;
}

/// External 16-bit DAC driving the actuator servo
pub trait Dac {
    /// Transport or device error
    type Error: core::fmt::Debug;

    /// Write a raw output code (0 = 0 V, 65535 = full scale)
    fn write_code(&mut self, code: u16) -> Result<(), Self::Error>;
}

impl<T: VoltageAdc + ?Sized> VoltageAdc for &mut T {
    type Error = T::Error;

    fn read_voltage(&mut self) -> Result<f32, Self::Error> {
        (**self).read_voltage()
    }
}

impl<T: Dac + ?Sized> Dac for &mut T {
    type Error = T::Error;

    fn write_code(&mut self, code: u16) -> Result<(), Self::Error> {
        (**self).write_code(code)
    }
}
