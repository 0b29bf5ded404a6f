//! Acquisition worker thread
//!
//! A dedicated thread runs the bridge polling protocol in a tight loop:
//!
//! ```text
//! loop while running:
//!     lock driver ─▶ read_conversion ─▶ unlock
//!         Ok(conversion)  → push bridges 0..2
//!         WouldBlock      → nothing this round
//!         Stalled/Pin     → warn, keep going
//!     read pressure ADC   → push channel 3
//! ```
//!
//! It talks to the rest of the station only through the sample queues and
//! the liveness flag. The driver mutex is held for one poll at a time, so
//! power transitions from the main thread slot in between conversions and
//! never inside one.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, info, warn};
use triax_core::{AcquisitionError, Channel, SyncAcquisitionDriver, VoltageAdc};

use crate::error::{StationError, StationResult};
use crate::queue::ProducerSet;

/// Driver behind the one mutex every clock-line operation goes through
pub type SharedDriver<CLK, DT, D> = Arc<Mutex<SyncAcquisitionDriver<CLK, DT, D>>>;

/// Wrap a driver for sharing between the worker and the main loop
pub fn share<CLK, DT, D>(driver: SyncAcquisitionDriver<CLK, DT, D>) -> SharedDriver<CLK, DT, D> {
    Arc::new(Mutex::new(driver))
}

/// Lock the driver, recovering it if a previous holder panicked
pub fn lock_driver<CLK, DT, D>(
    driver: &SharedDriver<CLK, DT, D>,
) -> MutexGuard<'_, SyncAcquisitionDriver<CLK, DT, D>> {
    driver.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Result of one pass through the worker loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollReport {
    /// A synchronized bridge conversion was read
    pub converted: bool,
    /// Samples accepted by the queues
    pub pushed: usize,
    /// Samples dropped on full queues
    pub dropped: usize,
}

impl PollReport {
    fn record(&mut self, accepted: bool) {
        if accepted {
            self.pushed += 1;
        } else {
            self.dropped += 1;
        }
    }
}

/// One pass: try a bridge conversion, then read the pressure ADC
pub fn poll_once<CLK, DT, D, E, A>(
    driver: &SharedDriver<CLK, DT, D>,
    adc: &mut A,
    producers: &ProducerSet,
) -> PollReport
where
    CLK: OutputPin<Error = E>,
    DT: InputPin<Error = E>,
    D: DelayNs,
    E: Debug,
    A: VoltageAdc,
{
    let mut report = PollReport::default();

    let (result, unit) = {
        let mut guard = lock_driver(driver);
        let unit = guard.config().output_unit;
        (guard.read_conversion(), unit)
    };

    match result {
        Ok(conversion) => {
            report.converted = true;
            for (index, channel) in Channel::BRIDGES.iter().enumerate().take(conversion.len()) {
                if let Some(value) = conversion.value(index, unit) {
                    report.record(producers.get(*channel).push(value));
                }
            }
        }
        Err(nb::Error::WouldBlock) => {}
        Err(nb::Error::Other(AcquisitionError::Stalled { channel })) => {
            warn!("bridge {} is not signalling ready", channel);
        }
        Err(nb::Error::Other(err)) => {
            warn!("bridge read failed: {}", err);
        }
    }

    match adc.read_voltage() {
        Ok(volts) => report.record(producers.get(Channel::HydraulicPressure).push(volts)),
        Err(err) => warn!("pressure ADC read failed: {:?}", err),
    }

    report
}

/// Handle on the running acquisition thread
pub struct AcquisitionWorker {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    conversions: Arc<AtomicU64>,
    name: String,
}

impl AcquisitionWorker {
    /// Start polling on a named thread
    ///
    /// The thread runs until `running` is cleared. `pause` is slept between
    /// passes; zero only yields.
    pub fn spawn<CLK, DT, D, E, A>(
        name: impl Into<String>,
        driver: SharedDriver<CLK, DT, D>,
        mut adc: A,
        producers: ProducerSet,
        pause: Duration,
        running: Arc<AtomicBool>,
    ) -> StationResult<Self>
    where
        CLK: OutputPin<Error = E> + Send + 'static,
        DT: InputPin<Error = E> + Send + 'static,
        D: DelayNs + Send + 'static,
        E: Debug + 'static,
        A: VoltageAdc + Send + 'static,
    {
        let name = name.into();
        let conversions = Arc::new(AtomicU64::new(0));

        let flag = Arc::clone(&running);
        let counter = Arc::clone(&conversions);
        let thread_name = name.clone();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                info!("[{}] acquisition started", thread_name);
                while flag.load(Ordering::Acquire) {
                    let report = poll_once(&driver, &mut adc, &producers);
                    if report.converted {
                        counter.fetch_add(1, Ordering::Relaxed);
                    }
                    if pause.is_zero() {
                        thread::yield_now();
                    } else {
                        thread::sleep(pause);
                    }
                }
                info!("[{}] acquisition stopped", thread_name);
            })
            .map_err(StationError::Spawn)?;

        Ok(Self { handle: Some(handle), running, conversions, name })
    }

    /// Bridge conversions read so far
    pub fn conversions(&self) -> u64 {
        self.conversions.load(Ordering::Relaxed)
    }

    /// Clear the liveness flag and wait for the thread to exit
    pub fn stop(&mut self) -> StationResult<()> {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| StationError::WorkerPanicked)?;
            debug!("[{}] joined after {} conversions", self.name, self.conversions());
        }
        Ok(())
    }

    /// Whether the thread is still polling
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for AcquisitionWorker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("[{}] {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::channel_queues;
    use triax_core::sim::{SimBridgeBus, SimDelay, SimVoltageAdc};
    use triax_core::{DriverConfig, OutputUnit};

    fn raw_driver(bus: &SimBridgeBus) -> SharedDriver<
        triax_core::sim::SimClockPin,
        triax_core::sim::SimDataPin,
        SimDelay,
    > {
        let config = DriverConfig { output_unit: OutputUnit::RawCode, ..DriverConfig::default() };
        let mut driver =
            SyncAcquisitionDriver::new(bus.clock_pin(), bus.data_pins(), bus.delay(), config).unwrap();
        driver.init().unwrap();
        share(driver)
    }

    #[test]
    fn poll_pushes_bridges_and_pressure() {
        let bus = SimBridgeBus::new(3);
        let driver = raw_driver(&bus);
        let mut adc = SimVoltageAdc::new(1.5);
        let (producers, consumers) = channel_queues(10);

        let report = poll_once(&driver, &mut adc, &producers);
        assert!(!report.converted);
        assert_eq!(report.pushed, 1);

        for channel in 0..3 {
            bus.queue(channel, 10 * (channel as i32 + 1));
        }
        let report = poll_once(&driver, &mut adc, &producers);
        assert!(report.converted);
        assert_eq!(report.pushed, 4);

        let mut out = Vec::new();
        consumers.get(Channel::Displacement).drain_into(&mut out);
        assert_eq!(out, vec![20.0]);
        consumers.get(Channel::HydraulicPressure).drain_into(&mut out);
        assert_eq!(out, vec![1.5, 1.5]);
    }

    #[test]
    fn worker_stops_on_flag() {
        let bus = SimBridgeBus::new(3);
        for channel in 0..3 {
            bus.set_source(channel, Box::new(|| 5));
        }
        let driver = raw_driver(&bus);
        let (producers, consumers) = channel_queues(100);
        let running = Arc::new(AtomicBool::new(true));

        let mut worker = AcquisitionWorker::spawn(
            "test-acquisition",
            Arc::clone(&driver),
            SimVoltageAdc::new(0.0),
            producers,
            Duration::from_micros(100),
            Arc::clone(&running),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        worker.stop().unwrap();
        assert!(!worker.is_running());
        assert!(worker.conversions() > 0);

        let mut out = Vec::new();
        assert!(consumers.get(Channel::AxialLoad).drain_into(&mut out) > 0);
        assert!(out.iter().all(|&v| v == 5.0));

        // Worker has released its handle on the driver
        assert_eq!(Arc::strong_count(&driver), 1);
    }
}
