//! Configuration for the regrid/integration engine.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Mean Earth radius used for arc lengths, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Configuration shared by the regridder and the integrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Earth radius in km; level heights are added to it for arc lengths.
    pub earth_radius_km: f64,

    /// Quadrature rule applied at every reduction stage.
    pub quadrature: QuadratureRule,

    /// What to do with NaN/Inf samples inside integration bounds.
    pub non_finite: NonFinitePolicy,

    /// Order of the horizontal reductions after the vertical one.
    pub reduction_order: ReductionOrder,

    /// Spread independent outputs (timesteps, columns) over the rayon pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            earth_radius_km: EARTH_RADIUS_KM,
            quadrature: QuadratureRule::Trapezoid,
            non_finite: NonFinitePolicy::Reject,
            reduction_order: ReductionOrder::LonThenLat,
            parallel: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("IONO_EARTH_RADIUS_KM") {
            if let Ok(radius) = val.parse() {
                config.earth_radius_km = radius;
            }
        }

        if let Ok(val) = std::env::var("IONO_QUADRATURE") {
            config.quadrature = QuadratureRule::from_str(&val);
        }

        if let Ok(val) = std::env::var("IONO_NON_FINITE") {
            config.non_finite = NonFinitePolicy::from_str(&val);
        }

        if let Ok(val) = std::env::var("IONO_REDUCTION_ORDER") {
            config.reduction_order = ReductionOrder::from_str(&val);
        }

        if let Ok(val) = std::env::var("IONO_PARALLEL") {
            config.parallel = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.earth_radius_km.is_finite() || self.earth_radius_km <= 0.0 {
            return Err(GridError::config(format!(
                "earth_radius_km must be a positive number, got {}",
                self.earth_radius_km
            )));
        }
        Ok(())
    }

    /// Distance from the Earth's centre to altitude `z_km`, in metres.
    pub fn radius_m(&self, z_km: f64) -> f64 {
        (self.earth_radius_km + z_km) * 1000.0
    }
}

/// Quadrature rule for every reduction stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuadratureRule {
    /// Closed trapezoid rule: half weight on the first and last samples.
    #[default]
    Trapezoid,
    /// Sum `f[k] * (x[k+1] - x[k])` over the first `n - 1` samples. Matches
    /// totals produced by older tooling, which drop the outer half-cell.
    Legacy,
}

impl QuadratureRule {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "legacy" | "truncated" => Self::Legacy,
            _ => Self::Trapezoid,
        }
    }

    /// Get the rule name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trapezoid => "trapezoid",
            Self::Legacy => "legacy",
        }
    }
}

impl std::fmt::Display for QuadratureRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handling of NaN/Inf samples inside integration bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonFinitePolicy {
    /// Fail with `GridError::NonFiniteInput`.
    #[default]
    Reject,
    /// Treat non-finite samples as zero.
    Mask,
}

impl NonFinitePolicy {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mask" | "skip" => Self::Mask,
            _ => Self::Reject,
        }
    }

    /// Get the policy name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Mask => "mask",
        }
    }
}

impl std::fmt::Display for NonFinitePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order of the two horizontal reductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionOrder {
    /// Collapse longitude, then latitude.
    #[default]
    LonThenLat,
    /// Collapse latitude, then longitude.
    LatThenLon,
}

impl ReductionOrder {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "lat_then_lon" | "lat-then-lon" | "latlon" => Self::LatThenLon,
            _ => Self::LonThenLat,
        }
    }

    /// Get the order name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LonThenLat => "lon_then_lat",
            Self::LatThenLon => "lat_then_lon",
        }
    }
}

impl std::fmt::Display for ReductionOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
