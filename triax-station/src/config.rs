//! Station configuration
//!
//! Loaded from JSON. Every field has a default matching the rig as it is
//! normally set up, so an empty object `{}` is a valid configuration.
//!
//! ```json
//! {
//!   "intervals": { "update_s": 1.0, "record_s": 1.0, "control_s": 0.5 },
//!   "queue_capacity": 100,
//!   "driver": { "device_count": 3, "gain": 128, "stall_policy": "wait" },
//!   "calibration": [
//!     { "slope": 1.0, "intercept": 0.0 },
//!     { "slope": 1.0, "intercept": 0.0 },
//!     { "slope": 1.0, "intercept": 0.0 },
//!     { "slope": 1.0, "intercept": 0.0 }
//!   ],
//!   "specimen": { "height": 150.0, "diameter": 150.0 }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use triax_core::constants::acquisition::{CHANNEL_COUNT, SAMPLE_QUEUE_CAPACITY};
use triax_core::constants::control::{DEFAULT_AMP_FACTOR_N_PER_V, DEFAULT_ELASTIC_MODULUS_KPA};
use triax_core::constants::time::{
    DEFAULT_CONTROL_INTERVAL_MS, DEFAULT_RECORD_INTERVAL_MS, DEFAULT_UPDATE_INTERVAL_MS,
    MS_PER_SECOND,
};
use triax_core::time::secs_to_ms;
use triax_core::{
    Calibration, CalibrationMap, ConfigError, ConfigResult, ControlSettings, DriverConfig,
    SpecimenDimensions, StallPolicy,
};

use crate::error::StationResult;

fn ms_to_secs(ms: u64) -> f32 {
    ms as f32 / MS_PER_SECOND as f32
}

/// Main-loop subsystem periods, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    /// Queue drain and metric refresh
    pub update_s: f32,
    /// CSV row cadence
    pub record_s: f32,
    /// Control tick
    pub control_s: f32,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            update_s: ms_to_secs(DEFAULT_UPDATE_INTERVAL_MS),
            record_s: ms_to_secs(DEFAULT_RECORD_INTERVAL_MS),
            control_s: ms_to_secs(DEFAULT_CONTROL_INTERVAL_MS),
        }
    }
}

impl IntervalConfig {
    /// Update period (ms)
    pub fn update_ms(&self) -> u64 {
        secs_to_ms(self.update_s)
    }

    /// Record period (ms)
    pub fn record_ms(&self) -> u64 {
        secs_to_ms(self.record_s)
    }

    /// Control period (ms)
    pub fn control_ms(&self) -> u64 {
        secs_to_ms(self.control_s)
    }
}

/// Everything needed to bring a station up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Subsystem periods
    pub intervals: IntervalConfig,
    /// Capacity of each per-channel sample queue
    pub queue_capacity: usize,
    /// Bridge driver settings
    pub driver: DriverConfig,
    /// Servo amplifier factor (N/V)
    pub amp_factor: f32,
    /// Modulus for strain-to-stress offsets (kPa)
    pub elastic_modulus: f32,
    /// Initial slope/intercept per channel
    pub calibration: [Calibration; CHANNEL_COUNT],
    /// Initial specimen dimensions
    pub specimen: SpecimenDimensions,
    /// Pause between worker polls (µs); 0 only yields
    pub worker_pause_us: u64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            intervals: IntervalConfig::default(),
            queue_capacity: SAMPLE_QUEUE_CAPACITY,
            driver: DriverConfig::default(),
            amp_factor: DEFAULT_AMP_FACTOR_N_PER_V,
            elastic_modulus: DEFAULT_ELASTIC_MODULUS_KPA,
            calibration: [Calibration::default(); CHANNEL_COUNT],
            specimen: SpecimenDimensions::default(),
            worker_pause_us: 0,
        }
    }
}

impl StationConfig {
    /// Read and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> StationResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: StationConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the station cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        let periods = [
            ("update_s", self.intervals.update_s),
            ("record_s", self.intervals.record_s),
            ("control_s", self.intervals.control_s),
        ];
        for (name, value) in periods {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveInterval { name });
            }
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroCapacity { name: "queue_capacity" });
        }
        if self.driver.stall_policy == (StallPolicy::Bounded { max_polls: 0 }) {
            return Err(ConfigError::ZeroStallBudget);
        }
        Ok(())
    }

    /// Control-law constants for the engine
    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            period_s: self.intervals.control_s,
            amp_factor: self.amp_factor,
            elastic_modulus: self.elastic_modulus,
        }
    }

    /// Initial calibration map
    pub fn calibration_map(&self) -> CalibrationMap {
        CalibrationMap::from_pairs(self.calibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use triax_core::{Gain, StallPolicy};

    #[test]
    fn empty_object_is_defaults() {
        let config: StationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StationConfig::default());
        assert_eq!(config.intervals.control_ms(), 500);
        assert_eq!(config.queue_capacity, 100);
    }

    #[test]
    fn partial_driver_section() {
        let config: StationConfig = serde_json::from_str(
            r#"{ "driver": { "gain": 64, "stall_policy": { "bounded": { "max_polls": 5000 } } } }"#,
        )
        .unwrap();
        assert_eq!(config.driver.gain, Gain::X64);
        assert_eq!(config.driver.stall_policy, StallPolicy::Bounded { max_polls: 5000 });
        assert_eq!(config.driver.device_count, 3);
    }

    #[test]
    fn zero_gain_is_rejected() {
        let result: Result<StationConfig, _> = serde_json::from_str(r#"{ "driver": { "gain": 0 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn validation_catches_bad_periods() {
        let mut config = StationConfig::default();
        config.intervals.record_s = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositiveInterval { name: "record_s" })
        );

        let config = StationConfig { queue_capacity: 0, ..StationConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity { name: "queue_capacity" }));
    }

    #[test]
    fn bounded_stall_policy_needs_polls() {
        let text = r#"{ "driver": { "stall_policy": { "bounded": { "max_polls": 0 } } } }"#;
        let config: StationConfig = serde_json::from_str(text).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::ZeroStallBudget));

        let mut config = StationConfig::default();
        config.driver.stall_policy = StallPolicy::Bounded { max_polls: 1 };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "intervals": {{ "record_s": 2.5 }}, "amp_factor": 50.0 }}"#).unwrap();

        let config = StationConfig::load(file.path()).unwrap();
        assert_eq!(config.intervals.record_ms(), 2500);
        assert_eq!(config.control_settings().amp_factor, 50.0);
    }
}
