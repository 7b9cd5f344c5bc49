//! Core types shared by the regridder and the integrator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Which coordinate an [`Axis`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    /// Latitude in degrees.
    Lat,
    /// Longitude in degrees.
    Lon,
    /// Time, in whatever unit the model writes (e.g. minutes since epoch).
    Time,
    /// Native model level index.
    Level,
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lat => write!(f, "lat"),
            Self::Lon => write!(f, "lon"),
            Self::Time => write!(f, "time"),
            Self::Level => write!(f, "level"),
        }
    }
}

/// A validated coordinate axis: non-empty, finite, monotonic non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    kind: AxisKind,
    values: Vec<f64>,
}

impl Axis {
    /// Create an axis, rejecting empty, non-finite, or decreasing input.
    pub fn new(kind: AxisKind, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(GridError::invalid_axis(format!("{kind} axis is empty")));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(GridError::invalid_axis(format!(
                "{kind} axis has non-finite value at {pos}"
            )));
        }
        if let Some(pos) = values.windows(2).position(|w| w[1] < w[0]) {
            return Err(GridError::invalid_axis(format!(
                "{kind} axis decreases at {}",
                pos + 1
            )));
        }
        Ok(Self { kind, values })
    }

    /// Build an evenly spaced axis of `count` samples starting at `start`.
    pub fn uniform(kind: AxisKind, start: f64, step: f64, count: usize) -> Result<Self> {
        Self::new(kind, (0..count).map(|i| start + step * i as f64).collect())
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Constant sample spacing, or `None` if the axis has fewer than two
    /// samples or the spacing varies by more than `rel_tol` of the mean step.
    pub fn uniform_step(&self, rel_tol: f64) -> Option<f64> {
        if self.values.len() < 2 {
            return None;
        }
        let n = (self.values.len() - 1) as f64;
        let mean = (self.values[self.values.len() - 1] - self.values[0]) / n;
        if mean <= 0.0 {
            return None;
        }
        let uniform = self
            .values
            .windows(2)
            .all(|w| ((w[1] - w[0]) - mean).abs() <= rel_tol * mean);
        uniform.then_some(mean)
    }
}

/// SI unit of a field, tracked as a symbol times a power of metres.
///
/// `W m^-3` integrated over a volume becomes `W`; integrated over a column it
/// becomes `W m^-2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SiUnit {
    /// Everything except the metre factor ("W", "kg", "K", "S", or "" for a
    /// pure count density).
    pub symbol: &'static str,
    /// Exponent of the metre factor.
    pub length_exp: i32,
}

/// What an integral was taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    /// A single vertical column (adds m).
    Column,
    /// A horizontal surface (adds m^2).
    Area,
    /// A volume (adds m^3).
    Volume,
}

impl Measure {
    fn length_exp(&self) -> i32 {
        match self {
            Self::Column => 1,
            Self::Area => 2,
            Self::Volume => 3,
        }
    }
}

impl SiUnit {
    pub const fn new(symbol: &'static str, length_exp: i32) -> Self {
        Self { symbol, length_exp }
    }

    /// The unit of this quantity after integrating over `measure`.
    pub fn integrated(&self, measure: Measure) -> Self {
        Self {
            symbol: self.symbol,
            length_exp: self.length_exp + measure.length_exp(),
        }
    }
}

impl fmt::Display for SiUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.symbol.is_empty(), self.length_exp) {
            (true, 0) => write!(f, "1"),
            (false, 0) => write!(f, "{}", self.symbol),
            (true, 1) => write!(f, "m"),
            (true, e) => write!(f, "m^{e}"),
            (false, 1) => write!(f, "{} m", self.symbol),
            (false, e) => write!(f, "{} m^{e}", self.symbol),
        }
    }
}

/// Closed set of fields the engine knows how to regrid and integrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    /// Geometric height of a native level (km).
    GeometricHeight,
    /// Neutral mass density.
    NeutralDensity,
    /// Electron number density.
    ElectronDensity,
    /// Neutral temperature.
    NeutralTemperature,
    /// Ion temperature.
    IonTemperature,
    /// Electron temperature.
    ElectronTemperature,
    /// Joule heating rate per unit volume.
    JouleHeating,
    /// Pedersen conductivity.
    PedersenConductivity,
    /// Hall conductivity.
    HallConductivity,
}

impl FieldId {
    pub const ALL: [FieldId; 9] = [
        Self::GeometricHeight,
        Self::NeutralDensity,
        Self::ElectronDensity,
        Self::NeutralTemperature,
        Self::IonTemperature,
        Self::ElectronTemperature,
        Self::JouleHeating,
        Self::PedersenConductivity,
        Self::HallConductivity,
    ];

    /// Short variable name as written in model output files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GeometricHeight => "z",
            Self::NeutralDensity => "rho",
            Self::ElectronDensity => "ne",
            Self::NeutralTemperature => "tn",
            Self::IonTemperature => "ti",
            Self::ElectronTemperature => "te",
            Self::JouleHeating => "qjoule",
            Self::PedersenConductivity => "sigma_ped",
            Self::HallConductivity => "sigma_hall",
        }
    }

    /// Units of the stored field.
    pub fn units(&self) -> SiUnit {
        match self {
            Self::GeometricHeight => SiUnit::new("km", 0),
            Self::NeutralDensity => SiUnit::new("kg", -3),
            Self::ElectronDensity => SiUnit::new("", -3),
            Self::NeutralTemperature | Self::IonTemperature | Self::ElectronTemperature => {
                SiUnit::new("K", 0)
            }
            Self::JouleHeating => SiUnit::new("W", -3),
            Self::PedersenConductivity | Self::HallConductivity => SiUnit::new("S", -1),
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FieldId {
    type Err = GridError;

    /// Parse a model variable name (case-insensitive). Long descriptive
    /// names are accepted alongside the short ones.
    fn from_str(s: &str) -> Result<Self> {
        let id = match s.to_lowercase().as_str() {
            "z" | "zg" | "height" | "geometric_height" => Self::GeometricHeight,
            "rho" | "den" | "neutral_density" => Self::NeutralDensity,
            "ne" | "electron_density" => Self::ElectronDensity,
            "tn" | "neutral_temperature" => Self::NeutralTemperature,
            "ti" | "ion_temperature" => Self::IonTemperature,
            "te" | "electron_temperature" => Self::ElectronTemperature,
            "qjoule" | "joule_heating" => Self::JouleHeating,
            "sigma_ped" | "pedersen_conductivity" => Self::PedersenConductivity,
            "sigma_hall" | "hall_conductivity" => Self::HallConductivity,
            _ => return Err(GridError::UnknownField(s.to_string())),
        };
        Ok(id)
    }
}

/// Upper limit on the number of target altitudes in one grid.
pub const MAX_TARGET_ALTITUDES: usize = 100_000;

/// Uniform altitude grid (km) that fields are regridded onto.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetAltitudes {
    values: Vec<f64>,
}

impl TargetAltitudes {
    /// Build `min, min + step, ...` up to and including `max` (within
    /// rounding).
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(GridError::invalid_altitude_range(format!(
                "non-finite range {min}..{max} step {step}"
            )));
        }
        if step <= 0.0 {
            return Err(GridError::invalid_altitude_range(format!(
                "step must be > 0, got {step}"
            )));
        }
        if max < min {
            return Err(GridError::invalid_altitude_range(format!(
                "max {max} is below min {min}"
            )));
        }
        let intervals = ((max - min) / step + 1e-9).floor();
        if !intervals.is_finite() || intervals >= MAX_TARGET_ALTITUDES as f64 {
            return Err(GridError::invalid_altitude_range(format!(
                "{min}..{max} step {step} needs more than {MAX_TARGET_ALTITUDES} altitudes"
            )));
        }
        let count = intervals as usize + 1;
        let values = (0..count).map(|i| min + step * i as f64).collect();
        Ok(Self { values })
    }

    /// Use an explicit list of altitudes, which must be strictly increasing.
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(GridError::invalid_altitude_range("no target altitudes"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GridError::invalid_altitude_range(
                "target altitudes must be finite",
            ));
        }
        if let Some(pos) = values.windows(2).position(|w| w[1] <= w[0]) {
            return Err(GridError::invalid_altitude_range(format!(
                "target altitudes not increasing at {}",
                pos + 1
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Inclusive sample-index bounds of the sub-volume to integrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationBounds {
    pub lat_min: usize,
    pub lat_max: usize,
    pub lon_min: usize,
    pub lon_max: usize,
    pub alt_min: usize,
    pub alt_max: usize,
}

impl IntegrationBounds {
    pub fn new(
        lat_min: usize,
        lat_max: usize,
        lon_min: usize,
        lon_max: usize,
        alt_min: usize,
        alt_max: usize,
    ) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
            alt_min,
            alt_max,
        }
    }

    /// Bounds covering every sample of a `[level][lat][lon]` grid.
    pub fn full(nlevels: usize, nlat: usize, nlon: usize) -> Self {
        Self::new(
            0,
            nlat.saturating_sub(1),
            0,
            nlon.saturating_sub(1),
            0,
            nlevels.saturating_sub(1),
        )
    }

    /// Inclusive `(min, max)` latitude indices.
    pub fn lat(&self) -> (usize, usize) {
        (self.lat_min, self.lat_max)
    }

    /// Inclusive `(min, max)` longitude indices.
    pub fn lon(&self) -> (usize, usize) {
        (self.lon_min, self.lon_max)
    }

    /// Inclusive `(min, max)` level indices.
    pub fn alt(&self) -> (usize, usize) {
        (self.alt_min, self.alt_max)
    }

    /// Check every pair spans at least one cell and lies inside the grid.
    pub fn validate(&self, nlevels: usize, nlat: usize, nlon: usize) -> Result<()> {
        let pairs = [
            ("latitude", self.lat_min, self.lat_max, nlat),
            ("longitude", self.lon_min, self.lon_max, nlon),
            ("altitude", self.alt_min, self.alt_max, nlevels),
        ];
        for (axis, min, max, len) in pairs {
            if max <= min {
                return Err(GridError::EmptyRange { axis, min, max });
            }
            if max >= len {
                return Err(GridError::BoundsOutOfRange {
                    axis,
                    index: max,
                    len,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_rejects_bad_input() {
        assert!(Axis::new(AxisKind::Lat, vec![]).is_err());
        assert!(Axis::new(AxisKind::Lat, vec![0.0, f64::NAN]).is_err());
        assert!(matches!(
            Axis::new(AxisKind::Lon, vec![0.0, 5.0, 2.5]),
            Err(GridError::InvalidAxis(_))
        ));
        assert!(Axis::new(AxisKind::Level, vec![1.0, 1.0, 2.0]).is_ok());
    }

    #[test]
    fn test_axis_uniform_step() {
        let axis = Axis::uniform(AxisKind::Lat, -87.5, 2.5, 71).unwrap();
        assert!((axis.uniform_step(1e-9).unwrap() - 2.5).abs() < 1e-12);

        let axis = Axis::new(AxisKind::Lat, vec![0.0, 1.0, 3.0]).unwrap();
        assert_eq!(axis.uniform_step(1e-6), None);

        let axis = Axis::new(AxisKind::Lat, vec![0.0]).unwrap();
        assert_eq!(axis.uniform_step(1e-6), None);
    }

    #[test]
    fn test_si_unit_integration() {
        let joule = FieldId::JouleHeating.units();
        assert_eq!(joule.to_string(), "W m^-3");
        assert_eq!(joule.integrated(Measure::Volume).to_string(), "W");
        assert_eq!(joule.integrated(Measure::Column).to_string(), "W m^-2");
        assert_eq!(
            FieldId::ElectronDensity
                .units()
                .integrated(Measure::Volume)
                .to_string(),
            "1"
        );
        assert_eq!(
            FieldId::ElectronDensity
                .units()
                .integrated(Measure::Column)
                .to_string(),
            "m^-2"
        );
    }

    #[test]
    fn test_field_id_from_str() {
        for id in FieldId::ALL {
            assert_eq!(id.name().parse::<FieldId>().unwrap(), id);
        }
        assert_eq!("QJOULE".parse::<FieldId>().unwrap(), FieldId::JouleHeating);
        assert_eq!(
            "joule_heating".parse::<FieldId>().unwrap(),
            FieldId::JouleHeating
        );
        assert!(matches!(
            "vorticity".parse::<FieldId>(),
            Err(GridError::UnknownField(_))
        ));
    }

    #[test]
    fn test_target_altitudes() {
        let targets = TargetAltitudes::new(100.0, 200.0, 25.0).unwrap();
        assert_eq!(targets.values(), &[100.0, 125.0, 150.0, 175.0, 200.0]);

        let single = TargetAltitudes::new(120.0, 120.0, 5.0).unwrap();
        assert_eq!(single.len(), 1);

        assert!(TargetAltitudes::new(100.0, 200.0, 0.0).is_err());
        assert!(TargetAltitudes::new(200.0, 100.0, 5.0).is_err());
        assert!(TargetAltitudes::from_values(vec![]).is_err());

        // Counts that would not fit in memory are rejected, not wrapped.
        let oversized = [
            (0.0, 1e300, 1e-300),
            (100.0, 400.0, 1e-12),
            (-1e308, 1e308, 1.0),
        ];
        for (min, max, step) in oversized {
            assert!(matches!(
                TargetAltitudes::new(min, max, step),
                Err(GridError::InvalidAltitudeRange(_))
            ));
        }
        let largest = TargetAltitudes::new(0.0, (MAX_TARGET_ALTITUDES - 1) as f64, 1.0).unwrap();
        assert_eq!(largest.len(), MAX_TARGET_ALTITUDES);
        assert!(matches!(
            TargetAltitudes::from_values(vec![100.0, 100.0]),
            Err(GridError::InvalidAltitudeRange(_))
        ));
    }

    #[test]
    fn test_bounds_validation() {
        let bounds = IntegrationBounds::new(0, 3, 0, 3, 2, 2);
        assert_eq!(
            bounds.validate(10, 4, 4),
            Err(GridError::EmptyRange {
                axis: "altitude",
                min: 2,
                max: 2
            })
        );

        let bounds = IntegrationBounds::new(0, 4, 0, 3, 0, 5);
        assert!(matches!(
            bounds.validate(10, 4, 4),
            Err(GridError::BoundsOutOfRange { axis: "latitude", .. })
        ));

        let full = IntegrationBounds::full(10, 4, 4);
        assert!(full.validate(10, 4, 4).is_ok());
    }
}
