//! Specimen Geometry Defaults and Physical Constants

// ===== SPECIMEN =====

/// Default specimen height (mm).
pub const DEFAULT_SPECIMEN_HEIGHT_MM: f32 = 150.0;

/// Default specimen diameter (mm).
pub const DEFAULT_SPECIMEN_DIAMETER_MM: f32 = 150.0;

/// Default drain-tank inner diameter (mm).
pub const DEFAULT_DRAIN_TANK_DIAMETER_MM: f32 = 84.0;

/// Default soil grain density (g/cm³).
pub const DEFAULT_GRAIN_DENSITY: f32 = 2.69;

// ===== PHYSICS =====

/// Standard gravity (m/s²).
pub const GRAVITY_M_PER_S2: f32 = 9.81;

/// Density of water at the lab temperature (g/cm³).
pub const WATER_DENSITY: f32 = 0.998223;

/// kN ↔ N and mm² ↔ m² style scale factor used by the metric formulas.
pub const UNIT_SCALE: f32 = 1000.0;

/// Percent scale.
pub const PERCENT: f32 = 100.0;
