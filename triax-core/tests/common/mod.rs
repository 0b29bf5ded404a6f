//! Shared fixtures for the rig integration tests
//!
//! Builds a calibrated rig state whose derived metrics land on chosen
//! stress and strain values, so control scenarios can be written in the
//! units an operator thinks in.

#![allow(dead_code)]

use triax_core::{
    sim::RecordingDac, ActuatorGovernor, CalibrationMap, Channel, ChannelBank,
    ControlParameterTable, ControlSettings, DerivedMetrics, LoadControlEngine, SpecimenGeometry,
    Timestamp,
};

/// Control period used by every scenario (ms)
pub const PERIOD_MS: Timestamp = 500;

/// Everything the control loop touches, wired to a recording DAC
pub struct ControlRig {
    pub calibration: CalibrationMap,
    pub geometry: SpecimenGeometry,
    pub bank: ChannelBank,
    pub params: ControlParameterTable,
    pub engine: LoadControlEngine,
    pub governor: ActuatorGovernor<RecordingDac>,
    pub dac: RecordingDac,
    pub now: Timestamp,
}

impl ControlRig {
    pub fn new() -> Self {
        let dac = RecordingDac::new();
        Self {
            calibration: CalibrationMap::default(),
            geometry: SpecimenGeometry::default(),
            bank: ChannelBank::new(),
            params: ControlParameterTable::new(),
            engine: LoadControlEngine::new(ControlSettings::default(), 0),
            governor: ActuatorGovernor::new(dac.clone()),
            dac,
            now: 0,
        }
    }

    /// Publish channel values that produce the given stress (kPa) and strain (%)
    pub fn set_state(&mut self, stress_kpa: f32, strain_pct: f32) {
        let load = stress_kpa * self.geometry.area() / 1000.0;
        let gauge = self.geometry.height() * (1.0 - strain_pct / 100.0);
        self.bank.publish(Channel::AxialLoad, &mut [load], &self.calibration);
        self.bank.publish(Channel::Displacement, &mut [gauge], &self.calibration);
        self.bank.publish(Channel::TankLoad, &mut [1.0], &self.calibration);
        self.bank.publish(Channel::HydraulicPressure, &mut [0.1], &self.calibration);
    }

    pub fn metrics(&self) -> DerivedMetrics {
        DerivedMetrics::compute(self.bank.physicals(), &self.geometry)
    }

    /// Advance one control period and tick
    pub fn tick(&mut self) -> triax_core::ControlStep {
        self.now += PERIOD_MS;
        let metrics = self.metrics();
        self.engine
            .tick(self.now, &metrics, &self.geometry, &self.params, &mut self.governor)
            .unwrap()
            .expect("engine is controlling")
    }

    /// Fill one column of the parameter table
    pub fn set_column(&mut self, col: usize, values: [f32; 6]) {
        for (row, value) in values.into_iter().enumerate() {
            self.params.set(row, col, value).unwrap();
        }
    }
}
