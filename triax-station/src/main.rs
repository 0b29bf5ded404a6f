use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam::channel::{unbounded, Sender};
use log::{error, info, warn};
use triax_core::sim::{CodeSource, RecordingDac, SimBridgeBus, SimVoltageAdc};
use triax_core::time::MonotonicTime;
use triax_core::{SyncAcquisitionDriver, TimeSource};
use triax_station::{Command, Station, StationConfig};

/// Triaxial test station running against simulated rig hardware
///
/// Operator commands are read from stdin, one per line
/// (`slope 0 1.2`, `mode creep`, `start-control`, `record run.csv`, `quit`).
#[derive(Parser, Debug)]
#[command(name = "triax-station", version, author, long_about = None)]
struct Args {
    /// JSON station configuration (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start recording to this CSV file immediately
    #[arg(short, long)]
    record: Option<PathBuf>,

    /// Stop after this many seconds (0 = run until quit or Ctrl-C)
    #[arg(long, default_value_t = 0)]
    duration_s: u64,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

/// Slowly drifting bridge code around `base`
fn drifting_source(base: i32, swing: f32, rate: f32) -> CodeSource {
    let mut n: u32 = 0;
    Box::new(move || {
        n = n.wrapping_add(1);
        base + (swing * (n as f32 * rate).sin()) as i32
    })
}

fn spawn_stdin_reader(tx: Sender<Command>) -> std::io::Result<()> {
    thread::Builder::new().name("triax-stdin".into()).spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
    })?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            StationConfig::load(path)?
        }
        None => StationConfig::default(),
    };

    // Simulated rig: three bridges on one clock, pressure ADC, actuator DAC
    let bus = SimBridgeBus::new(config.driver.device_count);
    for (device, base) in [120_000, 40_000, 8_000].into_iter().enumerate() {
        if device < config.driver.device_count {
            bus.set_source(device, drifting_source(base, 2_000.0, 0.001 * (device as f32 + 1.0)));
        }
    }
    let adc = SimVoltageAdc::new(1.25);
    let dac = RecordingDac::new();

    let driver =
        SyncAcquisitionDriver::new(bus.clock_pin(), bus.data_pins(), bus.delay(), config.driver)?;
    let clock = MonotonicTime::new();
    let mut station = Station::start(config, driver, adc, dac, clock.now())?;

    let (tx, rx) = unbounded();

    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        let _ = ctrlc_tx.send(Command::Shutdown);
    })?;

    if args.duration_s > 0 {
        let timer_tx = tx.clone();
        let duration = Duration::from_secs(args.duration_s);
        thread::Builder::new().name("triax-timer".into()).spawn(move || {
            thread::sleep(duration);
            let _ = timer_tx.send(Command::Shutdown);
        })?;
    }

    if let Some(path) = args.record {
        tx.send(Command::StartRecording { path })?;
    }

    spawn_stdin_reader(tx)?;

    info!("Station running; type commands, 'quit' to stop");
    if let Err(e) = station.run(&rx, &clock) {
        error!("Main loop stopped: {}", e);
    }

    let conversions = station.conversions();
    let metrics = *station.metrics();
    station.shutdown()?;

    info!("Bridge conversions: {}", conversions);
    info!(
        "Final stress {:.2} kPa, strain {:.3} %",
        metrics.axial_stress, metrics.axial_strain
    );
    Ok(())
}
