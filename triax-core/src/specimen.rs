//! Specimen and drain-tank geometry
//!
//! The operator enters four base dimensions; cross-section areas and the
//! specimen volume are derived from them and recomputed on every edit, so
//! they can never disagree with the base values.
//!
//! ```text
//! area        = π · d² / 4          (mm²)
//! volume      = area · height       (mm³)
//! tank area   = π · d_tank² / 4     (mm²)
//! ```

use core::f32::consts::PI;

use crate::constants::specimen::{
    DEFAULT_DRAIN_TANK_DIAMETER_MM, DEFAULT_GRAIN_DENSITY, DEFAULT_SPECIMEN_DIAMETER_MM,
    DEFAULT_SPECIMEN_HEIGHT_MM,
};
use crate::errors::InputResult;
use crate::input::parse_field;

/// Operator-editable base dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GeometryField {
    /// Specimen height (mm)
    Height,
    /// Specimen diameter (mm)
    Diameter,
    /// Drain tank inner diameter (mm)
    DrainTankDiameter,
    /// Soil grain density (g/cm³)
    GrainDensity,
}

impl GeometryField {
    /// Field name used in input errors and logs
    pub const fn name(self) -> &'static str {
        match self {
            GeometryField::Height => "height",
            GeometryField::Diameter => "diameter",
            GeometryField::DrainTankDiameter => "drain_tank_diameter",
            GeometryField::GrainDensity => "grain_density",
        }
    }
}

/// Base dimensions as stored in configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpecimenDimensions {
    /// Specimen height (mm)
    pub height: f32,
    /// Specimen diameter (mm)
    pub diameter: f32,
    /// Drain tank inner diameter (mm)
    pub drain_tank_diameter: f32,
    /// Soil grain density (g/cm³)
    pub grain_density: f32,
}

impl Default for SpecimenDimensions {
    fn default() -> Self {
        Self {
            height: DEFAULT_SPECIMEN_HEIGHT_MM,
            diameter: DEFAULT_SPECIMEN_DIAMETER_MM,
            drain_tank_diameter: DEFAULT_DRAIN_TANK_DIAMETER_MM,
            grain_density: DEFAULT_GRAIN_DENSITY,
        }
    }
}

/// Circular cross-section area for a diameter
#[inline]
pub fn circle_area(diameter: f32) -> f32 {
    diameter * diameter * PI / 4.0
}

/// Base dimensions plus the quantities derived from them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecimenGeometry {
    dims: SpecimenDimensions,
    area: f32,
    volume: f32,
    tank_area: f32,
}

impl SpecimenGeometry {
    /// Geometry for the given base dimensions
    pub fn new(dims: SpecimenDimensions) -> Self {
        let mut geometry = Self { dims, area: 0.0, volume: 0.0, tank_area: 0.0 };
        geometry.recompute();
        geometry
    }

    fn recompute(&mut self) {
        self.area = circle_area(self.dims.diameter);
        self.volume = self.area * self.dims.height;
        self.tank_area = circle_area(self.dims.drain_tank_diameter);
    }

    /// Change one base dimension and refresh the derived values
    pub fn set(&mut self, field: GeometryField, value: f32) {
        match field {
            GeometryField::Height => self.dims.height = value,
            GeometryField::Diameter => self.dims.diameter = value,
            GeometryField::DrainTankDiameter => self.dims.drain_tank_diameter = value,
            GeometryField::GrainDensity => self.dims.grain_density = value,
        }
        self.recompute();
    }

    /// Parse and apply an edit; on error nothing changes
    pub fn set_text(&mut self, field: GeometryField, text: &str) -> InputResult<f32> {
        let value = parse_field(text, field.name())?;
        self.set(field, value);
        Ok(value)
    }

    /// Base dimensions
    pub fn dimensions(&self) -> &SpecimenDimensions {
        &self.dims
    }

    /// Specimen height (mm)
    pub fn height(&self) -> f32 {
        self.dims.height
    }

    /// Specimen diameter (mm)
    pub fn diameter(&self) -> f32 {
        self.dims.diameter
    }

    /// Specimen cross-section (mm²)
    pub fn area(&self) -> f32 {
        self.area
    }

    /// Specimen volume (mm³)
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Drain tank inner diameter (mm)
    pub fn drain_tank_diameter(&self) -> f32 {
        self.dims.drain_tank_diameter
    }

    /// Drain tank cross-section (mm²)
    pub fn tank_area(&self) -> f32 {
        self.tank_area
    }

    /// Soil grain density (g/cm³)
    pub fn grain_density(&self) -> f32 {
        self.dims.grain_density
    }
}

impl Default for SpecimenGeometry {
    fn default() -> Self {
        Self::new(SpecimenDimensions::default())
    }
}

impl From<SpecimenDimensions> for SpecimenGeometry {
    fn from(dims: SpecimenDimensions) -> Self {
        Self::new(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_derived() {
        let geometry = SpecimenGeometry::default();
        let area = 150.0 * 150.0 * PI / 4.0;
        assert!((geometry.area() - area).abs() < 1e-2);
        assert!((geometry.volume() - area * 150.0).abs() < 10.0);
        assert!((geometry.tank_area() - 84.0 * 84.0 * PI / 4.0).abs() < 1e-2);
    }

    #[test]
    fn diameter_edit_recomputes_area_and_volume() {
        let mut geometry = SpecimenGeometry::default();
        geometry.set(GeometryField::Diameter, 100.0);

        let area = 100.0 * 100.0 * PI / 4.0;
        assert!((geometry.area() - area).abs() < 1e-2);
        assert!((geometry.volume() - area * geometry.height()).abs() < 1.0);
    }

    #[test]
    fn height_edit_keeps_area() {
        let mut geometry = SpecimenGeometry::default();
        let area = geometry.area();
        geometry.set(GeometryField::Height, 75.0);
        assert_eq!(geometry.area(), area);
        assert!((geometry.volume() - area * 75.0).abs() < 1.0);
    }

    #[test]
    fn bad_text_changes_nothing() {
        let mut geometry = SpecimenGeometry::default();
        let before = geometry;
        assert!(geometry.set_text(GeometryField::GrainDensity, "heavy").is_err());
        assert_eq!(geometry, before);
    }
}
