//! Height and volume integration over model grids.
//!
//! A volume integral is taken in spherical coordinates:
//!
//! ```text
//! ∫∫∫ f · r(z)² · cos(φ) dz dλ dφ,     r(z) = (R_earth + z) · 1000 m
//! ```
//!
//! The radius and `cos(φ)` factors are the arc-length weights of the zonal
//! (`r cos φ Δλ`) and meridional (`r Δφ`) spacings. They are folded into the
//! integrand before the vertical stage, so each stage collapses exactly one
//! axis against a plain coordinate spacing: metres vertically, radians
//! horizontally. Every stage uses [`reduce_axis`] with the configured rule.
//!
//! Results are unscaled SI values; conversion to presentation units (W to GW
//! and the like) is left to the caller.

pub mod quadrature;

pub use quadrature::{integrate_samples, quadrature, reduce_axis};

use ndarray::{s, Array2, Array3, ArrayView3, ArrayView4, Axis as Dim, Zip};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{EngineConfig, NonFinitePolicy, ReductionOrder};
use crate::error::{GridError, Result};
use crate::types::{Axis, FieldId, IntegrationBounds, Measure, SiUnit};

/// An integrated quantity with its SI unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Integrated<T> {
    pub value: T,
    pub units: SiUnit,
}

/// Height field plus the horizontal coordinates needed for arc lengths.
#[derive(Debug, Clone, Copy)]
pub struct GridGeometry<'a> {
    heights: ArrayView4<'a, f64>,
    lat: &'a Axis,
    lon: &'a Axis,
}

impl<'a> GridGeometry<'a> {
    /// Pair a `[time][level][lat][lon]` height field (km) with its latitude
    /// and longitude axes (degrees).
    pub fn new(heights: ArrayView4<'a, f64>, lat: &'a Axis, lon: &'a Axis) -> Result<Self> {
        let (_, _, nlat, nlon) = heights.dim();
        if lat.len() != nlat || lon.len() != nlon {
            return Err(GridError::shape_mismatch(
                &[nlat, nlon],
                &[lat.len(), lon.len()],
            ));
        }
        Ok(Self { heights, lat, lon })
    }

    pub fn heights(&self) -> ArrayView4<'a, f64> {
        self.heights
    }
}

/// Reduces fields along vertical and horizontal axes.
#[derive(Debug, Clone, Default)]
pub struct VolumeIntegrator {
    config: EngineConfig,
}

impl VolumeIntegrator {
    /// Create an integrator, rejecting an invalid configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// `∫ f dz` over native levels `alt_min..=alt_max` of one column.
    #[allow(clippy::too_many_arguments)]
    pub fn integrate_column(
        &self,
        id: FieldId,
        field: ArrayView4<'_, f64>,
        heights: ArrayView4<'_, f64>,
        t: usize,
        lat: usize,
        lon: usize,
        alt_min: usize,
        alt_max: usize,
    ) -> Result<Integrated<f64>> {
        check_shapes(field, heights, t)?;
        let (_, nlev, nlat, nlon) = heights.dim();
        check_pair("altitude", alt_min, alt_max, nlev)?;
        check_index("latitude", lat, nlat)?;
        check_index("longitude", lon, nlon)?;

        let (f, z) = self.prepare(field, heights, t, (alt_min, alt_max), (lat, lat), (lon, lon))?;
        let map = self.vertical_stage(f.view(), z.view());
        Ok(Integrated {
            value: map[[0, 0]],
            units: id.units().integrated(Measure::Column),
        })
    }

    /// Map of column integrals `∫ f dz` over the horizontal box of `bounds`,
    /// shaped `[lat][lon]` (e.g. W m^-2 for a heating rate).
    pub fn vertical_map(
        &self,
        id: FieldId,
        field: ArrayView4<'_, f64>,
        heights: ArrayView4<'_, f64>,
        t: usize,
        bounds: &IntegrationBounds,
    ) -> Result<Integrated<Array2<f64>>> {
        check_shapes(field, heights, t)?;
        let (_, nlev, nlat, nlon) = heights.dim();
        bounds.validate(nlev, nlat, nlon)?;

        let (f, z) = self.prepare(field, heights, t, bounds.alt(), bounds.lat(), bounds.lon())?;
        Ok(Integrated {
            value: self.vertical_stage(f.view(), z.view()),
            units: id.units().integrated(Measure::Column),
        })
    }

    /// Total of `field` over the sub-volume `bounds` at timestep `t`.
    pub fn integrate_volume(
        &self,
        id: FieldId,
        field: ArrayView4<'_, f64>,
        geometry: &GridGeometry<'_>,
        t: usize,
        bounds: &IntegrationBounds,
    ) -> Result<Integrated<f64>> {
        let value = self.volume_total(field, geometry, t, bounds)?;
        debug!(
            field = %id,
            t,
            rule = %self.config.quadrature,
            order = %self.config.reduction_order,
            total = value,
            "Integrated volume"
        );
        Ok(Integrated {
            value,
            units: id.units().integrated(Measure::Volume),
        })
    }

    /// One volume total per timestep of `field`.
    ///
    /// Timesteps run in parallel when configured; each total is summed
    /// sequentially, so the output is identical either way.
    pub fn integrate_volume_series(
        &self,
        id: FieldId,
        field: ArrayView4<'_, f64>,
        geometry: &GridGeometry<'_>,
        bounds: &IntegrationBounds,
    ) -> Result<Integrated<Vec<f64>>> {
        let nt = field.dim().0;
        let value = if self.config.parallel {
            (0..nt)
                .into_par_iter()
                .map(|t| self.volume_total(field, geometry, t, bounds))
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..nt)
                .map(|t| self.volume_total(field, geometry, t, bounds))
                .collect::<Result<Vec<_>>>()?
        };
        debug!(field = %id, timesteps = nt, "Integrated volume series");
        Ok(Integrated {
            value,
            units: id.units().integrated(Measure::Volume),
        })
    }

    fn volume_total(
        &self,
        field: ArrayView4<'_, f64>,
        geometry: &GridGeometry<'_>,
        t: usize,
        bounds: &IntegrationBounds,
    ) -> Result<f64> {
        let heights = geometry.heights;
        check_shapes(field, heights, t)?;
        let (_, nlev, nlat, nlon) = heights.dim();
        bounds.validate(nlev, nlat, nlon)?;

        let (mut f, z) = self.prepare(field, heights, t, bounds.alt(), bounds.lat(), bounds.lon())?;

        let lat = &geometry.lat.values()[bounds.lat_min..=bounds.lat_max];
        let lon = &geometry.lon.values()[bounds.lon_min..=bounds.lon_max];

        // Metric factor r(z)^2 cos(lat).
        Zip::indexed(&mut f)
            .and(&z)
            .for_each(|(_, j, _), value, &height| {
                let r = self.config.radius_m(height);
                *value *= r * r * lat[j].to_radians().cos();
            });

        let columns = self.vertical_stage(f.view(), z.view());

        let rule = self.config.quadrature;
        let parallel = self.config.parallel;
        let dlat = |_: &[usize], k: usize| (lat[k + 1] - lat[k]).to_radians();
        let dlon = |_: &[usize], k: usize| (lon[k + 1] - lon[k]).to_radians();

        let total = match self.config.reduction_order {
            ReductionOrder::LonThenLat => {
                let by_lat = reduce_axis(columns.view(), Dim(1), rule, parallel, dlon);
                reduce_axis(by_lat.view(), Dim(0), rule, parallel, dlat)
            }
            ReductionOrder::LatThenLon => {
                let by_lon = reduce_axis(columns.view(), Dim(0), rule, parallel, dlat);
                reduce_axis(by_lon.view(), Dim(0), rule, parallel, dlon)
            }
        };
        Ok(total[()])
    }

    /// Collapse `[level][lat][lon]` to `[lat][lon]` against the level
    /// heights, in metres.
    fn vertical_stage(&self, f: ArrayView3<'_, f64>, z: ArrayView3<'_, f64>) -> Array2<f64> {
        reduce_axis(
            f,
            Dim(0),
            self.config.quadrature,
            self.config.parallel,
            |lane, k| (z[[k + 1, lane[0], lane[1]]] - z[[k, lane[0], lane[1]]]) * 1000.0,
        )
    }

    /// Copy the bounded sub-volume at `t`, applying the non-finite policy to
    /// the field and checking the heights.
    fn prepare(
        &self,
        field: ArrayView4<'_, f64>,
        heights: ArrayView4<'_, f64>,
        t: usize,
        (alt_min, alt_max): (usize, usize),
        (lat_min, lat_max): (usize, usize),
        (lon_min, lon_max): (usize, usize),
    ) -> Result<(Array3<f64>, Array3<f64>)> {
        let region = s![t, alt_min..=alt_max, lat_min..=lat_max, lon_min..=lon_max];
        let mut f = field.slice(region).to_owned();
        let z = heights.slice(region).to_owned();
        let offset = |(k, j, i): (usize, usize, usize)| (k + alt_min, j + lat_min, i + lon_min);

        if let Some((idx, &value)) = z.indexed_iter().find(|(_, v)| !v.is_finite()) {
            let (k, lat, lon) = offset(idx);
            return Err(GridError::NonFiniteInput { value, t, k, lat, lon });
        }
        let nlon = lon_max - lon_min + 1;
        for (n, column) in z.lanes(Dim(0)).into_iter().enumerate() {
            if column.iter().zip(column.iter().skip(1)).any(|(lo, hi)| hi < lo) {
                return Err(GridError::invalid_axis(format!(
                    "height column at (t={t}, lat={}, lon={}) is not increasing",
                    lat_min + n / nlon,
                    lon_min + n % nlon
                )));
            }
        }

        match self.config.non_finite {
            NonFinitePolicy::Reject => {
                if let Some((idx, &value)) = f.indexed_iter().find(|(_, v)| !v.is_finite()) {
                    let (k, lat, lon) = offset(idx);
                    return Err(GridError::NonFiniteInput { value, t, k, lat, lon });
                }
            }
            NonFinitePolicy::Mask => {
                let mut masked = 0usize;
                f.iter_mut().filter(|v| !v.is_finite()).for_each(|v| {
                    *v = 0.0;
                    masked += 1;
                });
                if masked > 0 {
                    warn!(t, masked, "Masked non-finite samples inside integration bounds");
                }
            }
        }

        Ok((f, z))
    }
}

/// Volume total with the default [`EngineConfig`].
pub fn integrate(
    id: FieldId,
    field: ArrayView4<'_, f64>,
    geometry: &GridGeometry<'_>,
    t: usize,
    bounds: &IntegrationBounds,
) -> Result<Integrated<f64>> {
    VolumeIntegrator::default().integrate_volume(id, field, geometry, t, bounds)
}

fn check_shapes(field: ArrayView4<'_, f64>, heights: ArrayView4<'_, f64>, t: usize) -> Result<()> {
    if field.shape() != heights.shape() {
        return Err(GridError::shape_mismatch(heights.shape(), field.shape()));
    }
    check_index("time", t, heights.dim().0)
}

fn check_pair(axis: &'static str, min: usize, max: usize, len: usize) -> Result<()> {
    if max <= min {
        return Err(GridError::EmptyRange { axis, min, max });
    }
    check_index(axis, max, len)
}

fn check_index(axis: &'static str, index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(GridError::BoundsOutOfRange { axis, index, len });
    }
    Ok(())
}
