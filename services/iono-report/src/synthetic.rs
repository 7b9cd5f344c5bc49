//! Synthetic thermosphere run used when no model output is attached.
//!
//! Levels are log-pressure surfaces whose geometric height swells on the
//! dayside and in the auroral zones, so every column has its own heights.

use anyhow::Result;
use iono_grid::{Axis, AxisKind, FieldId, InMemoryProvider};
use ndarray::Array4;

/// Grid layout of the synthetic run.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticGrid {
    pub timesteps: usize,
    pub resolution_deg: f64,
    /// Output interval in seconds.
    pub interval_s: f64,
}

/// Log-pressure level spacing and range.
const LEVEL_START: f64 = -7.0;
const LEVEL_STEP: f64 = 0.25;
const LEVEL_COUNT: usize = 57;

/// Build a provider carrying heights, Joule heating, neutral temperature and
/// electron density.
pub fn build_provider(grid: SyntheticGrid) -> Result<InMemoryProvider> {
    let res = grid.resolution_deg;
    let nlat = (180.0 / res).round() as usize;
    let nlon = (360.0 / res).round() as usize;

    let time = Axis::uniform(AxisKind::Time, 0.0, grid.interval_s, grid.timesteps)?;
    let level = Axis::uniform(AxisKind::Level, LEVEL_START, LEVEL_STEP, LEVEL_COUNT)?;
    let lat = Axis::uniform(AxisKind::Lat, -90.0 + res / 2.0, res, nlat)?;
    let lon = Axis::uniform(AxisKind::Lon, -180.0, res, nlon)?;

    let shape = (grid.timesteps, LEVEL_COUNT, nlat, nlon);
    let lat_v = lat.values().to_vec();
    let lon_v = lon.values().to_vec();
    let interval_h = grid.interval_s / 3600.0;

    let heights = Array4::from_shape_fn(shape, |(t, k, j, i)| {
        let local_time = (lon_v[i] / 15.0 + 12.0 + t as f64 * interval_h).rem_euclid(24.0);
        geometric_height(k, lat_v[j], local_time)
    });

    let joule = Array4::from_shape_fn(shape, |(t, k, j, i)| {
        let z = heights[[t, k, j, i]];
        let storm = 1.0 + 0.5 * (t as f64 * 0.4).sin().abs();
        auroral_weight(lat_v[j]) * storm * chapman(z, 125.0, 12.0, 2.0e-8)
    });

    let tn = heights.mapv(|z| bates_temperature(z, 1000.0, 355.0, 0.021));

    let ne = Array4::from_shape_fn(shape, |(t, k, j, i)| {
        let local_time = (lon_v[i] / 15.0 + 12.0 + t as f64 * interval_h).rem_euclid(24.0);
        let day = (std::f64::consts::PI * (local_time - 6.0) / 12.0).sin().max(0.05);
        chapman(heights[[t, k, j, i]], 300.0, 45.0, 1.0e12 * day)
    });

    let provider = InMemoryProvider::new(time, level, lat, lon)
        .with_field(FieldId::GeometricHeight, heights)?
        .with_field(FieldId::JouleHeating, joule)?
        .with_field(FieldId::NeutralTemperature, tn)?
        .with_field(FieldId::ElectronDensity, ne)?;
    Ok(provider)
}

/// Height (km) of level `k`, inflated toward local noon and the poles.
fn geometric_height(k: usize, lat: f64, local_time: f64) -> f64 {
    let x = k as f64;
    let base = 97.0 + 4.5 * x + 0.06 * x * x;
    let diurnal = 1.0 + 0.08 * (std::f64::consts::PI * (local_time - 14.0) / 12.0).cos();
    let polar = 1.0 + 0.03 * lat.to_radians().sin().powi(2);
    97.0 + (base - 97.0) * diurnal * polar
}

fn chapman(z: f64, peak: f64, scale: f64, max: f64) -> f64 {
    let x = (z - peak) / scale;
    max * (1.0 - x - (-x).exp()).exp()
}

/// Gaussian belt centred on 67 degrees magnetic-ish latitude in each hemisphere.
fn auroral_weight(lat: f64) -> f64 {
    let d = (lat.abs() - 67.0) / 6.0;
    0.05 + (-0.5 * d * d).exp()
}

fn bates_temperature(z: f64, t_inf: f64, t_120: f64, shape: f64) -> f64 {
    t_inf - (t_inf - t_120) * (-shape * (z - 120.0)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use iono_grid::ModelDataProvider;

    #[test]
    fn test_columns_are_increasing() {
        for &lat in &[-88.0, -67.0, 0.0, 45.0] {
            for &lt in &[0.0, 6.0, 14.0, 23.5] {
                let col: Vec<f64> = (0..LEVEL_COUNT)
                    .map(|k| geometric_height(k, lat, lt))
                    .collect();
                assert!(col.windows(2).all(|w| w[1] > w[0]));
                assert!(col[0] > 90.0 && col[LEVEL_COUNT - 1] < 800.0);
            }
        }
    }

    #[test]
    fn test_provider_shapes() {
        let provider = build_provider(SyntheticGrid {
            timesteps: 2,
            resolution_deg: 10.0,
            interval_s: 3600.0,
        })
        .unwrap();
        assert_eq!(provider.shape(), [2, LEVEL_COUNT, 18, 36]);
        assert_eq!(provider.available_fields().len(), 4);
    }

    #[test]
    fn test_auroral_peak() {
        assert!(auroral_weight(67.0) > auroral_weight(45.0));
        assert!(auroral_weight(-67.0) > auroral_weight(0.0));
    }
}
