//! End-to-end station scenarios against the simulated rig

mod common;

use std::fs;

use common::{SimRig, BRIDGE_CODES, PRESSURE_V};
use triax_core::{Channel, ControlMode, DerivedMetrics, GeometryField, InputError};
use triax_station::{Command, CommandOutcome};

fn slope(channel: Channel, text: &str) -> Command {
    Command::SetSlope { channel, text: text.into() }
}

#[test]
fn update_publishes_medians_and_metrics() {
    let mut rig = SimRig::start();
    rig.wait_for_samples();

    // Update period is 1 s and fires strictly after it
    assert!(!rig.station.poll_at(1_000).unwrap().updated);
    assert!(rig.station.poll_at(1_001).unwrap().updated);

    let bank = rig.station.bank();
    assert_eq!(bank.input(Channel::AxialLoad), BRIDGE_CODES[0] as f32);
    assert_eq!(bank.input(Channel::Displacement), BRIDGE_CODES[1] as f32);
    assert_eq!(bank.input(Channel::TankLoad), BRIDGE_CODES[2] as f32);
    assert_eq!(bank.input(Channel::HydraulicPressure), PRESSURE_V);
    assert!(bank.all_fresh());

    let expected = DerivedMetrics::compute(bank.physicals(), rig.station.geometry());
    assert_eq!(*rig.station.metrics(), expected);

    rig.station.shutdown().unwrap();
}

#[test]
fn calibration_edits_apply_at_once() {
    let mut rig = SimRig::start();
    rig.wait_for_samples();
    rig.station.poll_at(1_001).unwrap();

    let outcome = rig.station.apply(slope(Channel::AxialLoad, "2"), 1_100).unwrap();
    assert_eq!(outcome, CommandOutcome::Applied);
    assert_eq!(rig.station.bank().physical(Channel::AxialLoad), 2.0 * BRIDGE_CODES[0] as f32);

    let before = rig.station.metrics().axial_stress;
    rig.station.apply(Command::Tare { channel: Channel::AxialLoad }, 1_200).unwrap();
    assert_eq!(rig.station.bank().physical(Channel::AxialLoad), 0.0);
    assert_eq!(
        rig.station.calibration().get(Channel::AxialLoad).intercept,
        -2.0 * BRIDGE_CODES[0] as f32
    );
    assert!(before > 0.0);
    assert_eq!(rig.station.metrics().axial_stress, 0.0);

    rig.station.shutdown().unwrap();
}

#[test]
fn malformed_input_keeps_previous_values() {
    let mut rig = SimRig::start();

    let outcome = rig.station.apply(slope(Channel::TankLoad, "abc"), 0).unwrap();
    assert_eq!(outcome, CommandOutcome::Rejected(InputError::NotANumber { field: "slope" }));
    assert_eq!(rig.station.calibration().get(Channel::TankLoad).slope, 1.0);

    let outcome = rig
        .station
        .apply(Command::SetGeometry { field: GeometryField::Height, text: "".into() }, 0)
        .unwrap();
    assert!(matches!(outcome, CommandOutcome::Rejected(_)));
    assert_eq!(rig.station.geometry().height(), 150.0);

    let outcome = rig.station.apply(Command::SetRecordInterval { text: "0".into() }, 0).unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::Rejected(InputError::NotPositive { field: "record_interval" })
    );
    assert_eq!(rig.station.config().intervals.record_s, 1.0);

    let outcome = rig
        .station
        .apply(Command::SetControlParameter { row: 6, col: 0, text: "1".into() }, 0)
        .unwrap();
    assert!(matches!(outcome, CommandOutcome::Rejected(InputError::IndexOutOfRange { .. })));

    rig.station.shutdown().unwrap();
}

#[test]
fn geometry_edit_recomputes_metrics() {
    let mut rig = SimRig::start();
    rig.wait_for_samples();
    rig.station.poll_at(1_001).unwrap();
    let wide = rig.station.metrics().axial_stress;

    let outcome = rig
        .station
        .apply(Command::SetGeometry { field: GeometryField::Diameter, text: "75".into() }, 1_100)
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Applied);

    // Quarter of the area, four times the stress
    let narrow = rig.station.metrics().axial_stress;
    assert!((narrow / wide - 4.0).abs() < 1e-3);

    rig.station.shutdown().unwrap();
}

#[test]
fn rows_need_every_channel_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.csv");

    let mut rig = SimRig::start();
    rig.station.apply(Command::StartRecording { path: path.clone() }, 0).unwrap();
    assert!(rig.station.is_recording());

    rig.wait_for_samples();
    let tick = rig.station.poll_at(1_001).unwrap();
    assert!(tick.updated && tick.recorded);
    assert!(!rig.station.bank().all_fresh());

    // Record period shortened, but no update has refreshed the channels
    rig.station.apply(Command::SetRecordInterval { text: "0.5".into() }, 1_100).unwrap();
    let tick = rig.station.poll_at(1_600).unwrap();
    assert!(!tick.updated && !tick.recorded);

    rig.wait_for_samples();
    let tick = rig.station.poll_at(2_002).unwrap();
    assert!(tick.updated && tick.recorded);
    assert_eq!(rig.station.recorded_rows(), 2);

    rig.station.apply(Command::StopRecording, 2_100).unwrap();
    assert!(!rig.station.is_recording());
    rig.station.shutdown().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Time(s),CH0_Vol(V)"));

    let first: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(first.len(), 14);
    let time: f64 = first[0].parse().unwrap();
    assert!((time - 1.001).abs() < 1e-4);
    assert_eq!(first[1].parse::<f32>().unwrap(), BRIDGE_CODES[0] as f32);
    assert_eq!(first[4].parse::<f32>().unwrap(), PRESSURE_V);
}

#[test]
fn multi_day_rows_keep_millisecond_time() {
    const DAY_MS: u64 = 86_400_000;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.csv");

    let mut rig = SimRig::start();
    rig.station.apply(Command::StartRecording { path: path.clone() }, 0).unwrap();
    rig.wait_for_samples();
    assert!(rig.station.poll_at(DAY_MS + 1).unwrap().recorded);
    rig.station.shutdown().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let row = text.lines().nth(1).unwrap();
    assert_eq!(row.split(',').next().unwrap(), "86400.001");
}

#[test]
fn restarting_the_same_recording_keeps_its_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keep.csv");

    let mut rig = SimRig::start();
    rig.station.apply(Command::StartRecording { path: path.clone() }, 0).unwrap();
    rig.wait_for_samples();
    assert!(rig.station.poll_at(1_001).unwrap().recorded);
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);

    let outcome = rig.station.apply(Command::StartRecording { path: path.clone() }, 1_050).unwrap();
    assert_eq!(outcome, CommandOutcome::Applied);
    assert_eq!(rig.station.recorded_rows(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);

    // Origin and timer are untouched, so the next row continues the log
    rig.wait_for_samples();
    assert!(rig.station.poll_at(2_002).unwrap().recorded);
    rig.station.shutdown().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    let time: f64 = lines[2].split(',').next().unwrap().parse().unwrap();
    assert!((time - 2.002).abs() < 1e-4);
}

#[test]
fn manual_voltage_is_written_immediately() {
    let mut rig = SimRig::start();

    rig.station.apply(Command::SetActuatorVoltage { text: "2.5".into() }, 0).unwrap();
    assert_eq!(rig.dac.last(), Some(32_768));
    assert_eq!(rig.station.engine().output_code(), 32_768);

    rig.station.apply(Command::SetActuatorVoltage { text: "12".into() }, 0).unwrap();
    assert_eq!(rig.dac.last(), Some(u16::MAX));

    let outcome =
        rig.station.apply(Command::SetActuatorVoltage { text: "high".into() }, 0).unwrap();
    assert!(matches!(outcome, CommandOutcome::Rejected(_)));
    assert_eq!(rig.dac.writes().len(), 2);

    rig.station.shutdown().unwrap();
}

#[test]
fn monotonic_ramp_runs_on_control_timer() {
    let mut rig = SimRig::start();
    rig.wait_for_samples();
    rig.station.poll_at(1_001).unwrap();

    let col = ControlMode::Monotonic.column();
    for (row, text) in [(3, "10"), (4, "1e9"), (5, "1e9")] {
        let command = Command::SetControlParameter { row, col, text: text.into() };
        assert_eq!(rig.station.apply(command, 1_001).unwrap(), CommandOutcome::Applied);
    }
    rig.station.apply(Command::SelectMode(ControlMode::Monotonic), 1_001).unwrap();

    // Not controlling yet
    assert_eq!(rig.station.poll_at(1_600).unwrap().control, None);

    rig.station.apply(Command::StartControl, 1_600).unwrap();
    let step = rig.station.poll_at(1_601).unwrap().control.unwrap();
    assert_eq!(step.mode, ControlMode::Monotonic);
    assert_eq!(step.delta, 1_310);
    assert_eq!(rig.dac.last(), Some(1_310));

    // Next tick only after another full period
    assert_eq!(rig.station.poll_at(2_000).unwrap().control, None);
    let step = rig.station.poll_at(2_102).unwrap().control.unwrap();
    assert_eq!(step.code, 2_620);

    rig.station.apply(Command::StopControl, 2_200).unwrap();
    assert_eq!(rig.station.poll_at(3_000).unwrap().control, None);
    assert_eq!(rig.station.governor().last_code(), 2_620);

    rig.station.shutdown().unwrap();
}

#[test]
fn shutdown_returns_every_pin() {
    let rig = SimRig::start();
    rig.wait_for_samples();
    assert!(rig.station.worker_running());

    rig.station.power_down().unwrap();
    rig.station.power_up().unwrap();

    let (_clock, data) = rig.station.shutdown().unwrap();
    assert_eq!(data.len(), BRIDGE_CODES.len());
}
