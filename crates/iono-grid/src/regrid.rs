//! Vertical regridding from native model levels onto a uniform altitude grid.
//!
//! For every requested timestep, target altitude and horizontal cell the
//! native height column is bracketed and each field is linearly interpolated.
//! Cells never depend on each other, so timesteps are spread over the rayon
//! pool when the engine is configured for it; the result does not depend on
//! how the work was split.

use ndarray::{s, Array2, Array3, Array4, ArrayView1, ArrayView4};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{GridError, Result};
use crate::index::{bracket_unchecked, validate_monotonic, Bracket};
use crate::interpolation::column_value;
use crate::provider::ModelDataProvider;
use crate::types::{FieldId, TargetAltitudes};

/// One field on the target grid, shaped `[time][altitude][lat][lon]`.
#[derive(Debug, Clone)]
pub struct RegriddedField {
    pub id: FieldId,
    pub data: Array4<f64>,
}

/// Output of a regrid run.
#[derive(Debug, Clone)]
pub struct RegriddedDataset {
    /// Altitudes (km) of the second output dimension.
    pub targets: TargetAltitudes,
    /// Source timestep of each entry along the first output dimension.
    pub time_indices: Vec<usize>,
    /// Regridded fields, in the order they were requested.
    pub fields: Vec<RegriddedField>,
    /// Altitude (km) written for each `[time][altitude]` pair.
    pub height_record: Array2<f64>,
    /// `(nlat, nlon)` of the horizontal grid.
    pub horizontal_shape: (usize, usize),
    /// Number of (time, altitude, lat, lon) cells that fell outside their
    /// native column and were filled by flat extrapolation.
    pub extrapolated_cells: usize,
}

impl RegriddedDataset {
    /// Regridded data for `id`, if it was requested.
    pub fn field(&self, id: FieldId) -> Option<&Array4<f64>> {
        self.fields.iter().find(|f| f.id == id).map(|f| &f.data)
    }

    /// Height record row for output timestep `t`.
    pub fn heights_at(&self, t: usize) -> Option<ArrayView1<'_, f64>> {
        (t < self.height_record.nrows()).then(|| self.height_record.row(t))
    }

    /// Height record broadcast to `[time][altitude][lat][lon]`, the height
    /// field that goes with the regridded fields when integrating them.
    pub fn height_field(&self) -> Array4<f64> {
        Array4::from_shape_fn(self.shape(), |(t, a, _, _)| self.height_record[[t, a]])
    }

    /// `[time][altitude][lat][lon]` shape shared by every field.
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        let (nlat, nlon) = self.horizontal_shape;
        (self.time_indices.len(), self.targets.len(), nlat, nlon)
    }
}

/// Regrids native-level fields onto a [`TargetAltitudes`] grid.
#[derive(Debug, Clone, Default)]
pub struct Regridder {
    config: EngineConfig,
}

/// Per-timestep output before assembly.
struct Slab {
    fields: Vec<Array3<f64>>,
    extrapolated: usize,
}

impl Regridder {
    /// Create a regridder, rejecting an invalid configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Regrid `fields` onto `targets` for each timestep in `time_indices`.
    ///
    /// `heights` holds geometric height in km, shaped
    /// `[time][level][lat][lon]`; every field must have the same shape.
    pub fn regrid(
        &self,
        heights: ArrayView4<'_, f64>,
        fields: &[(FieldId, ArrayView4<'_, f64>)],
        targets: &TargetAltitudes,
        time_indices: &[usize],
    ) -> Result<RegriddedDataset> {
        if targets.is_empty() {
            return Err(GridError::invalid_altitude_range("no target altitudes"));
        }
        for (_, field) in fields {
            if field.shape() != heights.shape() {
                return Err(GridError::shape_mismatch(heights.shape(), field.shape()));
            }
        }
        let (nt, nlev, nlat, nlon) = heights.dim();
        for &t in time_indices {
            if t >= nt {
                return Err(GridError::BoundsOutOfRange {
                    axis: "time",
                    index: t,
                    len: nt,
                });
            }
        }

        debug!(
            timesteps = time_indices.len(),
            levels = nlev,
            nlat,
            nlon,
            altitudes = targets.len(),
            fields = fields.len(),
            parallel = self.config.parallel,
            "Regridding to uniform altitude grid"
        );

        let altitudes = targets.values();
        let slabs: Vec<Slab> = if self.config.parallel {
            time_indices
                .par_iter()
                .map(|&t| regrid_timestep(&heights, fields, altitudes, t))
                .collect::<Result<Vec<_>>>()?
        } else {
            time_indices
                .iter()
                .map(|&t| regrid_timestep(&heights, fields, altitudes, t))
                .collect::<Result<Vec<_>>>()?
        };

        let nalt = altitudes.len();
        let mut outputs: Vec<RegriddedField> = fields
            .iter()
            .map(|(id, _)| RegriddedField {
                id: *id,
                data: Array4::zeros((time_indices.len(), nalt, nlat, nlon)),
            })
            .collect();
        let mut extrapolated_cells = 0;
        for (ti, slab) in slabs.into_iter().enumerate() {
            extrapolated_cells += slab.extrapolated;
            for (out, data) in outputs.iter_mut().zip(slab.fields) {
                out.data.slice_mut(s![ti, .., .., ..]).assign(&data);
            }
        }

        let mut height_record = Array2::zeros((time_indices.len(), nalt));
        for mut row in height_record.rows_mut() {
            row.iter_mut()
                .zip(altitudes)
                .for_each(|(dst, &z)| *dst = z);
        }

        if extrapolated_cells > 0 {
            warn!(
                extrapolated_cells,
                "Target altitudes outside native columns were filled by flat extrapolation"
            );
        }

        Ok(RegriddedDataset {
            targets: targets.clone(),
            time_indices: time_indices.to_vec(),
            fields: outputs,
            height_record,
            horizontal_shape: (nlat, nlon),
            extrapolated_cells,
        })
    }

    /// Read the height field and `ids` from a provider and regrid them.
    pub fn regrid_provider(
        &self,
        provider: &dyn ModelDataProvider,
        ids: &[FieldId],
        targets: &TargetAltitudes,
        time_indices: &[usize],
    ) -> Result<RegriddedDataset> {
        let heights = provider.read_field(FieldId::GeometricHeight)?;
        let owned = ids
            .iter()
            .map(|&id| provider.read_field(id).map(|data| (id, data)))
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<(FieldId, ArrayView4<'_, f64>)> =
            owned.iter().map(|(id, data)| (*id, data.view())).collect();
        self.regrid(heights.view(), &views, targets, time_indices)
    }
}

/// Regrid with the default [`EngineConfig`].
pub fn regrid(
    heights: ArrayView4<'_, f64>,
    fields: &[(FieldId, ArrayView4<'_, f64>)],
    targets: &TargetAltitudes,
    time_indices: &[usize],
) -> Result<RegriddedDataset> {
    Regridder::default().regrid(heights, fields, targets, time_indices)
}

fn regrid_timestep(
    heights: &ArrayView4<'_, f64>,
    fields: &[(FieldId, ArrayView4<'_, f64>)],
    altitudes: &[f64],
    t: usize,
) -> Result<Slab> {
    let (_, nlev, nlat, nlon) = heights.dim();
    let nalt = altitudes.len();

    let mut out: Vec<Array3<f64>> = fields
        .iter()
        .map(|_| Array3::zeros((nalt, nlat, nlon)))
        .collect();
    let mut column = vec![0.0; nlev];
    let mut values = vec![0.0; nlev];
    let mut brackets: Vec<Bracket<f64>> = Vec::with_capacity(nalt);
    let mut extrapolated = 0;

    for j in 0..nlat {
        for i in 0..nlon {
            copy_column(&mut column, heights.slice(s![t, .., j, i]));
            if validate_monotonic(&column).is_err() {
                return Err(GridError::invalid_axis(format!(
                    "height column at (t={t}, lat={j}, lon={i}) is not increasing"
                )));
            }

            brackets.clear();
            brackets.extend(altitudes.iter().map(|&z| bracket_unchecked(&column, z)));
            extrapolated += brackets.iter().filter(|b| b.is_extrapolated()).count();

            for ((_, field), dst) in fields.iter().zip(out.iter_mut()) {
                copy_column(&mut values, field.slice(s![t, .., j, i]));
                for (a, b) in brackets.iter().enumerate() {
                    dst[[a, j, i]] = column_value(&values, b);
                }
            }
        }
    }

    Ok(Slab {
        fields: out,
        extrapolated,
    })
}

fn copy_column(dst: &mut [f64], src: ArrayView1<'_, f64>) {
    dst.iter_mut().zip(src.iter()).for_each(|(d, &s)| *d = s);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two columns side by side in longitude, one timestep.
    fn two_columns() -> (Array4<f64>, Array4<f64>) {
        let mut heights = Array4::zeros((1, 3, 1, 2));
        let mut values = Array4::zeros((1, 3, 1, 2));
        for (k, (&h0, &h1)) in [100.0, 110.0, 125.0]
            .iter()
            .zip(&[100.0, 112.0, 130.0])
            .enumerate()
        {
            heights[[0, k, 0, 0]] = h0;
            heights[[0, k, 0, 1]] = h1;
            values[[0, k, 0, 0]] = 1.0 + k as f64;
            values[[0, k, 0, 1]] = 2.0 + k as f64;
        }
        (heights, values)
    }

    #[test]
    fn test_two_column_scenario() {
        let (heights, values) = two_columns();
        let targets = TargetAltitudes::from_values(vec![115.0]).unwrap();
        let out = regrid(
            heights.view(),
            &[(FieldId::NeutralTemperature, values.view())],
            &targets,
            &[0],
        )
        .unwrap();

        let tn = out.field(FieldId::NeutralTemperature).unwrap();
        assert_eq!(tn.dim(), (1, 1, 1, 2));
        assert!((tn[[0, 0, 0, 0]] - 7.0 / 3.0).abs() < 1e-12);
        assert!((tn[[0, 0, 0, 1]] - 19.0 / 6.0).abs() < 1e-12);
        assert_eq!(out.extrapolated_cells, 0);
        assert_eq!(out.heights_at(0).unwrap().to_vec(), vec![115.0]);
    }

    #[test]
    fn test_flat_extrapolation_is_counted() {
        let (heights, values) = two_columns();
        let targets = TargetAltitudes::from_values(vec![90.0, 115.0, 200.0]).unwrap();
        let out = regrid(
            heights.view(),
            &[(FieldId::NeutralTemperature, values.view())],
            &targets,
            &[0],
        )
        .unwrap();

        let tn = out.field(FieldId::NeutralTemperature).unwrap();
        assert_eq!(tn[[0, 0, 0, 0]], 1.0);
        assert_eq!(tn[[0, 2, 0, 0]], 3.0);
        assert_eq!(tn[[0, 0, 0, 1]], 2.0);
        assert_eq!(tn[[0, 2, 0, 1]], 4.0);
        assert_eq!(out.extrapolated_cells, 4);
    }

    #[test]
    fn test_shape_mismatch() {
        let (heights, _) = two_columns();
        let wrong = Array4::<f64>::zeros((1, 3, 1, 3));
        let targets = TargetAltitudes::new(100.0, 120.0, 10.0).unwrap();
        let err = regrid(
            heights.view(),
            &[(FieldId::JouleHeating, wrong.view())],
            &targets,
            &[0],
        )
        .unwrap_err();
        assert!(matches!(err, GridError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_time_index_out_of_range() {
        let (heights, values) = two_columns();
        let targets = TargetAltitudes::new(100.0, 120.0, 10.0).unwrap();
        let err = regrid(
            heights.view(),
            &[(FieldId::JouleHeating, values.view())],
            &targets,
            &[1],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GridError::BoundsOutOfRange { axis: "time", .. }
        ));
    }

    #[test]
    fn test_non_monotonic_column_rejected() {
        let (mut heights, values) = two_columns();
        heights[[0, 2, 0, 1]] = 105.0;
        let targets = TargetAltitudes::new(100.0, 120.0, 10.0).unwrap();
        let err = regrid(
            heights.view(),
            &[(FieldId::JouleHeating, values.view())],
            &targets,
            &[0],
        )
        .unwrap_err();
        assert!(matches!(err, GridError::InvalidAxis(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Regridder::new(EngineConfig {
            earth_radius_km: -1.0,
            ..EngineConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, GridError::Config(_)));
        assert!(Regridder::new(EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let nt = 4;
        let mut heights = Array4::zeros((nt, 5, 3, 4));
        let mut values = Array4::zeros((nt, 5, 3, 4));
        for ((t, k, j, i), h) in heights.indexed_iter_mut() {
            *h = 95.0 + 20.0 * k as f64 + 0.7 * t as f64 + 0.3 * (j + i) as f64;
            values[[t, k, j, i]] = (k as f64 * 0.9 + j as f64 - i as f64 * 0.4).sin();
        }
        let targets = TargetAltitudes::new(90.0, 190.0, 7.5).unwrap();
        let fields = [(FieldId::IonTemperature, values.view())];
        let times: Vec<usize> = (0..nt).collect();

        let parallel = Regridder::new(EngineConfig::default())
            .unwrap()
            .regrid(heights.view(), &fields, &targets, &times)
            .unwrap();
        let sequential = Regridder::new(EngineConfig {
            parallel: false,
            ..EngineConfig::default()
        })
        .unwrap()
        .regrid(heights.view(), &fields, &targets, &times)
        .unwrap();

        assert_eq!(
            parallel.field(FieldId::IonTemperature),
            sequential.field(FieldId::IonTemperature)
        );
        assert_eq!(parallel.extrapolated_cells, sequential.extrapolated_cells);
        assert_eq!(parallel.shape(), (nt, targets.len(), 3, 4));
    }
}
