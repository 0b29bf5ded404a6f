//! Derived Specimen Metrics
//!
//! ## Quantities
//!
//! With calibrated channel values `v0..v3` (axial load N, displacement
//! gauge mm, tank load, hydraulic pressure) and the current geometry:
//!
//! ```text
//! σ_a   = v0 / A · 1000                                   (kPa)
//! ε_a   = (H - v1) / H · 100                              (%)
//! V_d   = (v2 - v3 · A_tank / 1000) / g · 1000 / ρ_s / 1000
//! V_w   = v3 · A_tank / 1000 / g / ρ_w
//! ΔV    = (V_d - V_w) / V_w · 100                         (%)
//! ```
//!
//! where `g = 9.81`, `ρ_w = 0.998223` and `ρ_s` is the grain density.
//!
//! ### Axial stress
//!
//! Load over the current cross-section. The area is the initial area; no
//! barrelling correction is applied.
//!
//! ### Axial strain
//!
//! The displacement gauge reads the current specimen length, so strain is
//! the shortening relative to the initial height. Positive in compression.
//!
//! ### Discharged volume and water
//!
//! The drain tank sits on a load cell and carries a pressure transducer.
//! The pressure head times the tank area gives the weight of water in the
//! tank; the tank load minus that weight gives the weight of solids that
//! washed out. Dividing by gravity and density turns both into volumes.
//!
//! ### Zero water
//!
//! With no water in the tank the volume percentage divides by zero. The
//! result is whatever IEEE arithmetic gives (NaN or ±∞); it is logged as
//! such rather than replaced by a made-up value.

use crate::constants::specimen::{GRAVITY_M_PER_S2, PERCENT, UNIT_SCALE, WATER_DENSITY};
use crate::constants::acquisition::CHANNEL_COUNT;
use crate::specimen::SpecimenGeometry;

/// Quantities derived from one set of calibrated channel values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedMetrics {
    /// Axial stress (kPa)
    pub axial_stress: f32,
    /// Axial strain (%)
    pub axial_strain: f32,
    /// Discharged solids volume
    pub discharged_volume: f32,
    /// Discharged water volume
    pub discharged_water: f32,
    /// Volume change relative to discharged water (%)
    pub volume_percentage: f32,
}

impl DerivedMetrics {
    /// Compute every metric from calibrated values in channel order
    pub fn compute(physical: &[f32; CHANNEL_COUNT], geometry: &SpecimenGeometry) -> Self {
        let [axial_load, gauge, tank_load, pressure] = *physical;

        let axial_stress = axial_load / geometry.area() * UNIT_SCALE;
        let axial_strain = (geometry.height() - gauge) / geometry.height() * PERCENT;

        let water_weight = pressure * geometry.tank_area() / UNIT_SCALE;
        let discharged_volume = (tank_load - water_weight) / GRAVITY_M_PER_S2 * UNIT_SCALE
            / geometry.grain_density()
            / UNIT_SCALE;
        let discharged_water = water_weight / GRAVITY_M_PER_S2 / WATER_DENSITY;
        let volume_percentage = (discharged_volume - discharged_water) / discharged_water * PERCENT;

        Self {
            axial_stress,
            axial_strain,
            discharged_volume,
            discharged_water,
            volume_percentage,
        }
    }

    /// Values in log column order
    pub fn as_array(&self) -> [f32; 5] {
        [
            self.axial_stress,
            self.axial_strain,
            self.discharged_volume,
            self.discharged_water,
            self.volume_percentage,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specimen::{GeometryField, SpecimenGeometry};

    #[test]
    fn stress_and_strain() {
        let geometry = SpecimenGeometry::default();
        let load = geometry.area() / 1000.0 * 50.0;
        let metrics = DerivedMetrics::compute(&[load, 135.0, 0.0, 1.0], &geometry);

        assert!((metrics.axial_stress - 50.0).abs() < 1e-3);
        assert!((metrics.axial_strain - 10.0).abs() < 1e-4);
    }

    #[test]
    fn volumes_follow_tank_readings() {
        let mut geometry = SpecimenGeometry::default();
        geometry.set(GeometryField::DrainTankDiameter, 100.0);
        let tank_area = geometry.tank_area();

        let pressure = 2.0;
        let water_weight = pressure * tank_area / 1000.0;
        let tank_load = water_weight + 9.81 * 2.69;

        let metrics = DerivedMetrics::compute(&[0.0, 150.0, tank_load, pressure], &geometry);
        assert!((metrics.discharged_volume - 1.0).abs() < 1e-3);
        let water = water_weight / 9.81 / 0.998223;
        assert!((metrics.discharged_water - water).abs() < 1e-3);
        let expected = (1.0 - water) / water * 100.0;
        assert!((metrics.volume_percentage - expected).abs() < 1e-2);
    }

    #[test]
    fn zero_water_is_not_finite() {
        let geometry = SpecimenGeometry::default();
        let metrics = DerivedMetrics::compute(&[0.0, 150.0, 5.0, 0.0], &geometry);
        assert_eq!(metrics.discharged_water, 0.0);
        assert!(!metrics.volume_percentage.is_finite());

        let empty = DerivedMetrics::compute(&[0.0, 150.0, 0.0, 0.0], &geometry);
        assert!(empty.volume_percentage.is_nan());
    }
}
