//! Synthetic thermosphere-like fields for tests and benchmarks.
//!
//! Every generator is deterministic and shaped `[time][level][lat][lon]`,
//! so results can be checked against closed-form values.

use ndarray::Array4;

/// Creates geometric heights (km) that rise with level in every column.
///
/// Level `k` sits at `base + k * step`, nudged by a small smooth offset that
/// varies with time, latitude and longitude so that no two columns share
/// exactly the same heights. The offset is bounded by `0.2 * step`, so
/// columns stay strictly increasing.
///
/// # Example
///
/// ```
/// use test_utils::create_height_field;
///
/// let z = create_height_field((2, 10, 4, 6), 100.0, 10.0);
/// assert_eq!(z.dim(), (2, 10, 4, 6));
/// assert!(z[[0, 1, 0, 0]] > z[[0, 0, 0, 0]]);
/// ```
pub fn create_height_field(shape: (usize, usize, usize, usize), base: f64, step: f64) -> Array4<f64> {
    Array4::from_shape_fn(shape, |(t, k, j, i)| {
        let wobble = (0.7 * t as f64 + 0.3 * j as f64).sin() * (0.5 * i as f64).cos();
        base + step * k as f64 + 0.2 * step * wobble * (k as f64 / (shape.1.max(1) as f64))
    })
}

/// Creates heights that are identical in every column.
///
/// `levels` gives the height (km) of each level.
pub fn create_flat_height_field(
    levels: &[f64],
    nt: usize,
    nlat: usize,
    nlon: usize,
) -> Array4<f64> {
    Array4::from_shape_fn((nt, levels.len(), nlat, nlon), |(_, k, _, _)| levels[k])
}

/// Chapman-like production profile: peaks at `peak_km` with value `q_max`.
///
/// `scale_km` is the scale height of the exponential atmosphere above and
/// below the peak.
pub fn chapman_profile(z_km: f64, peak_km: f64, scale_km: f64, q_max: f64) -> f64 {
    let x = (z_km - peak_km) / scale_km;
    q_max * (1.0 - x - (-x).exp()).exp()
}

/// Creates a Joule heating rate field (W m^-3) following `heights`.
///
/// Each column is a Chapman layer peaking near 125 km, stronger toward high
/// latitude rows, with a peak around `1e-8` W m^-3.
pub fn create_joule_heating_field(heights: &Array4<f64>) -> Array4<f64> {
    let nlat = heights.dim().2.max(1);
    Array4::from_shape_fn(heights.dim(), |(t, k, j, i)| {
        let auroral = 0.5 + 0.5 * j as f64 / nlat as f64;
        chapman_profile(heights[[t, k, j, i]], 125.0, 15.0, 1e-8 * auroral)
    })
}

/// Creates a field that is linear in height: `a + b * z`.
pub fn create_linear_in_height(heights: &Array4<f64>, a: f64, b: f64) -> Array4<f64> {
    heights.mapv(|z| a + b * z)
}

/// Creates a field filled with a constant value.
pub fn create_constant_field(shape: (usize, usize, usize, usize), value: f64) -> Array4<f64> {
    Array4::from_elem(shape, value)
}

/// Creates a constant field with NaN at the given `(t, k, lat, lon)` cells.
///
/// Positions outside the shape are ignored.
pub fn create_field_with_nans(
    shape: (usize, usize, usize, usize),
    value: f64,
    nan_positions: &[(usize, usize, usize, usize)],
) -> Array4<f64> {
    let mut data = Array4::from_elem(shape, value);
    for &(t, k, j, i) in nan_positions {
        if let Some(v) = data.get_mut([t, k, j, i]) {
            *v = f64::NAN;
        }
    }
    data
}
