//! Simulated station fixture
//!
//! Every bridge produces a constant raw code and the pressure ADC a
//! constant voltage, so the medians published on each update are known
//! exactly no matter how many samples the worker managed to queue.

#![allow(dead_code)]

use std::thread;
use std::time::{Duration, Instant};

use triax_core::sim::{RecordingDac, SimBridgeBus, SimClockPin, SimDataPin, SimDelay, SimVoltageAdc};
use triax_core::{Channel, DriverConfig, OutputUnit, SyncAcquisitionDriver};
use triax_station::{Station, StationConfig};

pub type SimStation = Station<SimClockPin, SimDataPin, SimDelay, RecordingDac>;

/// Raw codes for bridges 0..2
pub const BRIDGE_CODES: [i32; 3] = [1_767, 150, 40];
/// Pressure ADC voltage
pub const PRESSURE_V: f32 = 1.5;

pub struct SimRig {
    pub bus: SimBridgeBus,
    pub dac: RecordingDac,
    pub station: SimStation,
}

pub fn station_config() -> StationConfig {
    StationConfig {
        driver: DriverConfig { output_unit: OutputUnit::RawCode, ..DriverConfig::default() },
        worker_pause_us: 200,
        ..StationConfig::default()
    }
}

impl SimRig {
    pub fn start() -> Self {
        Self::with_config(station_config())
    }

    pub fn with_config(config: StationConfig) -> Self {
        let bus = SimBridgeBus::new(BRIDGE_CODES.len());
        for (device, code) in BRIDGE_CODES.into_iter().enumerate() {
            bus.set_source(device, Box::new(move || code));
        }
        let dac = RecordingDac::new();
        let driver =
            SyncAcquisitionDriver::new(bus.clock_pin(), bus.data_pins(), bus.delay(), config.driver)
                .unwrap();
        let station =
            Station::start(config, driver, SimVoltageAdc::new(PRESSURE_V), dac.clone(), 0).unwrap();
        Self { bus, dac, station }
    }

    /// Block until every channel queue holds at least one sample
    pub fn wait_for_samples(&self) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Channel::ALL.iter().any(|&c| self.station.queue_stats(c).len == 0) {
            assert!(Instant::now() < deadline, "worker produced no samples");
            thread::sleep(Duration::from_millis(2));
        }
    }
}
