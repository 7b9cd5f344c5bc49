//! Summary document printed by the CLI.

use anyhow::{bail, Result};
use iono_grid::{Axis, FieldId, SiUnit};
use serde::Serialize;

/// Watts per gigawatt.
pub const WATTS_PER_GW: f64 = 1.0e9;

#[derive(Debug, Serialize)]
pub struct Report {
    pub field: FieldId,
    pub config: ConfigSummary,
    pub altitude_km: AltitudeSummary,
    pub region: Region,
    pub timesteps: Vec<TimestepTotal>,
    pub extrapolated_cells: usize,
}

#[derive(Debug, Serialize)]
pub struct ConfigSummary {
    pub quadrature: String,
    pub non_finite: String,
    pub reduction_order: String,
    pub earth_radius_km: f64,
}

#[derive(Debug, Serialize)]
pub struct AltitudeSummary {
    pub min: f64,
    pub max: f64,
    pub levels: usize,
}

/// Grid cells actually covered by the requested box.
#[derive(Debug, Serialize)]
pub struct Region {
    pub lat: (f64, f64),
    pub lon: (f64, f64),
    pub lat_indices: (usize, usize),
    pub lon_indices: (usize, usize),
}

#[derive(Debug, Serialize)]
pub struct TimestepTotal {
    pub time_s: f64,
    pub total: f64,
    pub units: SiUnit,
    /// Total in GW when the integrated unit is W.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_gw: Option<f64>,
    /// Largest column integral inside the box.
    pub peak_column: f64,
    pub peak_column_units: SiUnit,
}

/// Inclusive index range of the samples of `axis` inside `[lo, hi]`.
///
/// At least two samples must fall inside so the range spans one cell. The
/// range ends at the last sample, so cells past it (such as the wrap-around
/// cell of a global longitude axis) are not covered.
pub fn index_range(axis: &Axis, lo: f64, hi: f64) -> Result<(usize, usize)> {
    let values = axis.values();
    let first = values.partition_point(|&v| v < lo);
    let end = values.partition_point(|&v| v <= hi);
    if end < first + 2 {
        bail!(
            "{} range [{lo}, {hi}] covers fewer than two grid points",
            axis.kind()
        );
    }
    Ok((first, end - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use iono_grid::AxisKind;

    #[test]
    fn test_index_range() {
        let lat = Axis::uniform(AxisKind::Lat, -87.5, 5.0, 36).unwrap();
        assert_eq!(index_range(&lat, 50.0, 90.0).unwrap(), (28, 35));
        assert_eq!(index_range(&lat, -90.0, 90.0).unwrap(), (0, 35));
        assert!(index_range(&lat, 51.0, 54.0).is_err());
    }

    #[test]
    fn test_index_range_stops_at_last_longitude() {
        let lon = Axis::uniform(AxisKind::Lon, -180.0, 5.0, 72).unwrap();
        let (first, last) = index_range(&lon, -180.0, 180.0).unwrap();
        assert_eq!((first, last), (0, 71));
        assert_eq!(lon.values()[last], 175.0);
        assert_eq!(last - first, 71);
    }
}
