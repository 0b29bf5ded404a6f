//! Triaxial Test Station
//!
//! ## Overview
//!
//! Host-side runtime for the triaxial rig. It wires the hardware-agnostic
//! pieces of `triax-core` into a running station:
//!
//! ```text
//!   ┌──────────────── acquisition thread ────────────────┐
//!   │ SyncAcquisitionDriver ──▶ bridges 0..2 ──┐          │
//!   │ VoltageAdc ──────────────▶ pressure ─────┤          │
//!   └──────────────────────────────────────────┼──────────┘
//!                                 bounded queues (drop when full)
//!   ┌──────────────── main loop ───────────────┼──────────┐
//!   │ commands ─▶ Station::apply               ▼          │
//!   │             update: median ─▶ calibration ─▶ metrics│
//!   │             record: CSV row when every channel fresh│
//!   │             control: LoadControlEngine ─▶ DAC       │
//!   └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`]: JSON station configuration with rig defaults
//! - [`queue`]: per-channel bounded sample queues
//! - [`worker`]: the acquisition thread
//! - [`command`]: operator commands and their line syntax
//! - [`record`]: CSV test log
//! - [`station`]: the station context and main loop
//!
//! ## Running against simulated hardware
//!
//! ```rust,no_run
//! use crossbeam::channel::unbounded;
//! use triax_core::sim::{RecordingDac, SimBridgeBus, SimVoltageAdc};
//! use triax_core::time::MonotonicTime;
//! use triax_core::{DriverConfig, SyncAcquisitionDriver, TimeSource};
//! use triax_station::{Command, Station, StationConfig};
//!
//! # fn main() -> triax_station::StationResult<()> {
//! let bus = SimBridgeBus::new(3);
//! let driver =
//!     SyncAcquisitionDriver::new(bus.clock_pin(), bus.data_pins(), bus.delay(), DriverConfig::default())?;
//! let clock = MonotonicTime::new();
//!
//! let mut station = Station::start(
//!     StationConfig::default(),
//!     driver,
//!     SimVoltageAdc::new(0.0),
//!     RecordingDac::new(),
//!     clock.now(),
//! )?;
//!
//! let (tx, rx) = unbounded();
//! tx.send(Command::Shutdown).ok();
//! station.run(&rx, &clock)?;
//! station.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod error;
pub mod queue;
pub mod record;
pub mod station;
pub mod worker;

pub use command::{Command, CommandOutcome, ParseCommandError};
pub use config::{IntervalConfig, StationConfig};
pub use error::{StationError, StationResult};
pub use queue::{channel_queues, ChannelStats, ConsumerSet, ProducerSet};
pub use record::CsvRecorder;
pub use station::{LoopTick, Station};
pub use worker::{AcquisitionWorker, PollReport};
