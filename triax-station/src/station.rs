//! Station context and cooperative main loop
//!
//! The station owns everything except the acquisition thread: channel
//! state, calibration, specimen geometry, derived metrics, the control
//! engine and the actuator. Each pass of [`Station::run`] does at most one
//! command plus whichever timers are due:
//!
//! ```text
//!            ┌────────────── command channel (≤ 1 ms wait)
//!            ▼
//!   apply(command) ──▶ update timer?  drain queues ─▶ medians ─▶ metrics
//!                      record timer?  all fresh ─▶ CSV row ─▶ clear fresh
//!                      control timer? engine.tick ─▶ governor ─▶ DAC
//! ```
//!
//! Nothing here blocks on hardware except the DAC write on a control tick.
//! The worker thread and the main loop share only the queues and the
//! driver mutex.

use std::fmt::Debug;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec as HVec;
use log::{debug, error, info, warn};
use triax_core::constants::acquisition::MAX_DEVICES;
use triax_core::constants::time::COMMAND_POLL_TIMEOUT_MS;
use triax_core::input::{parse_field, parse_positive};
use triax_core::time::{elapsed_secs_f64, secs_to_ms};
use triax_core::{
    ActuatorGovernor, CalibrationMap, Channel, ChannelBank, ControlParameterTable, ControlStep,
    Dac, DerivedMetrics, InputResult, IntervalTimer, LoadControlEngine, SpecimenGeometry,
    SyncAcquisitionDriver, TimeSource, Timestamp, VoltageAdc,
};

use crate::command::{Command, CommandOutcome};
use crate::config::StationConfig;
use crate::error::{StationError, StationResult};
use crate::queue::{channel_queues, ChannelStats, ConsumerSet};
use crate::record::CsvRecorder;
use crate::worker::{lock_driver, share, AcquisitionWorker, SharedDriver};

/// Name of the acquisition thread
pub const WORKER_NAME: &str = "triax-acquisition";

/// What one [`Station::poll_at`] pass did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoopTick {
    /// Queues were drained and metrics refreshed
    pub updated: bool,
    /// A CSV row was written
    pub recorded: bool,
    /// Control step applied, if the control timer fired while controlling
    pub control: Option<ControlStep>,
}

/// Running test station
pub struct Station<CLK, DT, D, V> {
    config: StationConfig,
    driver: SharedDriver<CLK, DT, D>,
    worker: Option<AcquisitionWorker>,
    running: Arc<AtomicBool>,
    consumers: ConsumerSet,
    batch: Vec<f32>,
    bank: ChannelBank,
    calibration: CalibrationMap,
    geometry: SpecimenGeometry,
    metrics: DerivedMetrics,
    params: ControlParameterTable,
    engine: LoadControlEngine,
    governor: ActuatorGovernor<V>,
    recorder: Option<CsvRecorder>,
    record_origin: Timestamp,
    update_timer: IntervalTimer,
    record_timer: IntervalTimer,
    control_timer: IntervalTimer,
    reported_drops: u64,
}

fn dac_error<E: Debug>(err: E) -> StationError {
    StationError::Dac(format!("{:?}", err))
}

impl<CLK, DT, D, E, V> Station<CLK, DT, D, V>
where
    CLK: OutputPin<Error = E> + Send + 'static,
    DT: InputPin<Error = E> + Send + 'static,
    D: DelayNs + Send + 'static,
    E: Debug + 'static,
    V: Dac,
{
    /// Bring the rig up and start the acquisition worker
    ///
    /// The driver is power-cycled before the worker takes its first sample.
    pub fn start<A>(
        config: StationConfig,
        mut driver: SyncAcquisitionDriver<CLK, DT, D>,
        adc: A,
        dac: V,
        now: Timestamp,
    ) -> StationResult<Self>
    where
        A: VoltageAdc + Send + 'static,
    {
        config.validate()?;
        driver.init().map_err(|e| StationError::Acquisition(e.to_string()))?;
        info!(
            "{} bridges ready, gain {:?}, unit {:?}",
            driver.device_count(),
            driver.config().gain,
            driver.config().output_unit
        );

        let driver = share(driver);
        let (producers, consumers) = channel_queues(config.queue_capacity);
        let running = Arc::new(AtomicBool::new(true));
        let worker = AcquisitionWorker::spawn(
            WORKER_NAME,
            Arc::clone(&driver),
            adc,
            producers,
            Duration::from_micros(config.worker_pause_us),
            Arc::clone(&running),
        )?;

        let intervals = config.intervals;
        Ok(Self {
            calibration: config.calibration_map(),
            geometry: SpecimenGeometry::new(config.specimen),
            engine: LoadControlEngine::new(config.control_settings(), now),
            batch: Vec::with_capacity(config.queue_capacity),
            config,
            driver,
            worker: Some(worker),
            running,
            consumers,
            bank: ChannelBank::new(),
            metrics: DerivedMetrics::default(),
            params: ControlParameterTable::new(),
            governor: ActuatorGovernor::new(dac),
            recorder: None,
            record_origin: now,
            update_timer: IntervalTimer::new(intervals.update_ms(), now),
            record_timer: IntervalTimer::new(intervals.record_ms(), now),
            control_timer: IntervalTimer::new(intervals.control_ms(), now),
            reported_drops: 0,
        })
    }

    /// Dispatch one operator command
    ///
    /// Unparseable values are logged and reported as
    /// [`CommandOutcome::Rejected`]; the field keeps its previous value.
    /// An `Err` means the command reached hardware or the file system and
    /// failed there.
    pub fn apply(&mut self, command: Command, now: Timestamp) -> StationResult<CommandOutcome> {
        let outcome = match command {
            Command::SetSlope { channel, text } => {
                let result = self.calibration.set_slope_text(channel, &text);
                self.after_calibration_edit(&result);
                outcome("slope", result)
            }
            Command::SetIntercept { channel, text } => {
                let result = self.calibration.set_intercept_text(channel, &text);
                self.after_calibration_edit(&result);
                outcome("intercept", result)
            }
            Command::Tare { channel } => {
                let intercept = self.calibration.tare(channel, self.bank.physical(channel));
                info!("{:?} tared, intercept now {}", channel, intercept);
                self.bank.recalibrate(&self.calibration);
                self.refresh_metrics();
                CommandOutcome::Applied
            }
            Command::SetGeometry { field, text } => {
                let result = self.geometry.set_text(field, &text);
                if result.is_ok() {
                    debug!(
                        "specimen area {} mm2, volume {} mm3",
                        self.geometry.area(),
                        self.geometry.volume()
                    );
                    self.refresh_metrics();
                }
                outcome(field.name(), result)
            }
            Command::SetRecordInterval { text } => {
                let result = parse_positive(&text, "record_interval");
                if let Ok(secs) = result {
                    self.config.intervals.record_s = secs;
                    self.record_timer.set_period_ms(secs_to_ms(secs));
                }
                outcome("record_interval", result)
            }
            Command::StartRecording { path } => {
                self.start_recording(&path, now)?;
                CommandOutcome::Applied
            }
            Command::StopRecording => {
                if let Some(recorder) = self.recorder.take() {
                    info!("recording stopped after {} rows", recorder.rows());
                }
                CommandOutcome::Applied
            }
            Command::StartControl => {
                self.engine.start(now);
                CommandOutcome::Applied
            }
            Command::StopControl => {
                self.engine.stop();
                CommandOutcome::Applied
            }
            Command::SelectMode(mode) => {
                self.engine.select_mode(mode, now);
                CommandOutcome::Applied
            }
            Command::SetControlParameter { row, col, text } => {
                outcome("control_parameter", self.params.set_text(row, col, &text))
            }
            Command::SetActuatorVoltage { text } => {
                match parse_field(&text, "actuator_voltage") {
                    Ok(volts) => {
                        let code = self
                            .engine
                            .override_voltage(volts, &mut self.governor)
                            .map_err(dac_error)?;
                        info!("actuator set to {} V (code {})", volts, code);
                        CommandOutcome::Applied
                    }
                    Err(err) => outcome::<f32>("actuator_voltage", Err(err)),
                }
            }
            Command::Shutdown => CommandOutcome::Shutdown,
        };
        Ok(outcome)
    }

    /// Run whichever subsystems are due at `now`
    pub fn poll_at(&mut self, now: Timestamp) -> StationResult<LoopTick> {
        let mut tick = LoopTick::default();

        if self.update_timer.fire(now) {
            self.aggregate();
            tick.updated = true;
        }

        if self.recorder.is_some() && self.record_timer.is_due(now) && self.bank.all_fresh() {
            self.write_row(now)?;
            self.bank.clear_fresh();
            self.record_timer.restart(now);
            tick.recorded = true;
        }

        if self.engine.is_controlling() && self.control_timer.is_due(now) {
            tick.control = self
                .engine
                .tick(now, &self.metrics, &self.geometry, &self.params, &mut self.governor)
                .map_err(dac_error)?;
            self.control_timer.restart(now);
        }

        Ok(tick)
    }

    /// Serve commands and timers until shutdown
    ///
    /// Returns when a [`Command::Shutdown`] arrives or every sender is
    /// gone. Command failures are logged and the loop goes on; a failed
    /// CSV write or DAC write on a timer stops it.
    pub fn run<T: TimeSource>(&mut self, commands: &Receiver<Command>, clock: &T) -> StationResult<()> {
        let wait = Duration::from_millis(COMMAND_POLL_TIMEOUT_MS);
        loop {
            match commands.recv_timeout(wait) {
                Ok(command) => match self.apply(command, clock.now()) {
                    Ok(CommandOutcome::Shutdown) => {
                        info!("shutdown requested");
                        return Ok(());
                    }
                    Ok(_) => {}
                    Err(err) => error!("command failed: {}", err),
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("command channel closed");
                    return Ok(());
                }
            }
            self.poll_at(clock.now())?;
        }
    }

    /// Put every bridge into power-down
    pub fn power_down(&self) -> StationResult<()> {
        lock_driver(&self.driver)
            .power_down()
            .map_err(|e| StationError::Acquisition(e.to_string()))
    }

    /// Wake every bridge; samples resume on the next conversion
    pub fn power_up(&self) -> StationResult<()> {
        lock_driver(&self.driver)
            .power_up()
            .map_err(|e| StationError::Acquisition(e.to_string()))
    }

    /// Stop the worker, power the bridges down and hand back the pins
    pub fn shutdown(mut self) -> StationResult<(CLK, HVec<DT, MAX_DEVICES>)> {
        self.running.store(false, Ordering::Release);
        if let Some(mut worker) = self.worker.take() {
            worker.stop()?;
        }
        if let Some(recorder) = self.recorder.take() {
            info!("closing {} after {} rows", recorder.path().display(), recorder.rows());
        }

        let mut driver = Arc::try_unwrap(self.driver)
            .map_err(|_| StationError::DriverInUse)?
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(err) = driver.power_down() {
            warn!("power-down at shutdown failed: {}", err);
        }
        info!("station stopped, actuator held at code {}", self.governor.last_code());
        Ok(driver.release())
    }

    fn aggregate(&mut self) {
        for channel in Channel::ALL {
            self.consumers.get(channel).drain_into(&mut self.batch);
            self.bank.publish(channel, &mut self.batch, &self.calibration);
        }
        self.refresh_metrics();

        let dropped = self.consumers.total_dropped();
        if dropped > self.reported_drops {
            debug!("{} samples dropped on full queues", dropped - self.reported_drops);
            self.reported_drops = dropped;
        }
    }

    fn refresh_metrics(&mut self) {
        self.metrics = DerivedMetrics::compute(self.bank.physicals(), &self.geometry);
    }

    fn after_calibration_edit<T>(&mut self, result: &InputResult<T>) {
        if result.is_ok() {
            self.bank.recalibrate(&self.calibration);
            self.refresh_metrics();
        }
    }

    fn start_recording(&mut self, path: &Path, now: Timestamp) -> StationResult<()> {
        // Reopening the active file would truncate it
        if self.recorder.as_ref().is_some_and(|r| r.path() == path) {
            info!("already recording to {}", path.display());
            return Ok(());
        }
        let recorder = CsvRecorder::create(path)?;
        info!("recording to {}", path.display());
        self.recorder = Some(recorder);
        self.record_origin = now;
        self.record_timer.restart(now);
        Ok(())
    }

    fn write_row(&mut self, now: Timestamp) -> StationResult<()> {
        if let Some(recorder) = self.recorder.as_mut() {
            let time_s = elapsed_secs_f64(self.record_origin, now);
            recorder.write_row(time_s, self.bank.inputs(), self.bank.physicals(), &self.metrics)?;
        }
        Ok(())
    }
}

impl<CLK, DT, D, V> Station<CLK, DT, D, V> {
    /// Latest medians, physical values and freshness
    pub fn bank(&self) -> &ChannelBank {
        &self.bank
    }

    /// Derived metrics from the last update or edit
    pub fn metrics(&self) -> &DerivedMetrics {
        &self.metrics
    }

    /// Current calibration
    pub fn calibration(&self) -> &CalibrationMap {
        &self.calibration
    }

    /// Current specimen geometry
    pub fn geometry(&self) -> &SpecimenGeometry {
        &self.geometry
    }

    /// Control parameter table
    pub fn params(&self) -> &ControlParameterTable {
        &self.params
    }

    /// Control engine state
    pub fn engine(&self) -> &LoadControlEngine {
        &self.engine
    }

    /// Actuator governor and its DAC
    pub fn governor(&self) -> &ActuatorGovernor<V> {
        &self.governor
    }

    /// Active configuration, including runtime interval edits
    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Whether a log file is open
    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Rows written to the open log file
    pub fn recorded_rows(&self) -> u64 {
        self.recorder.as_ref().map_or(0, CsvRecorder::rows)
    }

    /// Queue fill for one channel
    pub fn queue_stats(&self, channel: Channel) -> ChannelStats {
        self.consumers.get(channel).stats()
    }

    /// Whether the acquisition thread is still polling
    pub fn worker_running(&self) -> bool {
        self.worker.as_ref().map_or(false, AcquisitionWorker::is_running)
    }

    /// Bridge conversions read by the worker so far
    pub fn conversions(&self) -> u64 {
        self.worker.as_ref().map_or(0, AcquisitionWorker::conversions)
    }
}

fn outcome<T>(field: &str, result: InputResult<T>) -> CommandOutcome {
    match result {
        Ok(_) => CommandOutcome::Applied,
        Err(err) => {
            warn!("{} not changed: {}", field, err);
            CommandOutcome::Rejected(err)
        }
    }
}
