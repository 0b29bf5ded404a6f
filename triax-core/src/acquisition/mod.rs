//! Bridge acquisition
//!
//! [`BitBangLine`] owns the GPIO; [`SyncAcquisitionDriver`] runs the
//! readiness/transfer/gain-select protocol on top of it.

pub mod bitbang;
pub mod driver;

pub use bitbang::BitBangLine;
pub use driver::{
    code_to_millivolts, decode_word, Conversion, DriverConfig, Gain, OutputUnit, StallPolicy,
    SyncAcquisitionDriver,
};
