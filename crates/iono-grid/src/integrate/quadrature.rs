//! One-axis quadrature and the generic reduction built on it.
//!
//! Every stage of a volume integral (vertical, zonal, meridional) goes
//! through [`reduce_axis`], so all stages share one rule and one summation
//! order: sequential in index order along each lane.

use ndarray::{indices, Array, ArrayView, ArrayView1, Axis, Dimension, IntoDimension, RemoveAxis};
use rayon::prelude::*;

use crate::config::QuadratureRule;

/// Integrate the samples `f` whose interval `k` (between samples `k` and
/// `k + 1`) has width `dx(k)`.
///
/// Fewer than two samples integrate to zero.
pub fn quadrature<F>(f: ArrayView1<'_, f64>, dx: F, rule: QuadratureRule) -> f64
where
    F: Fn(usize) -> f64,
{
    let n = f.len();
    if n < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    match rule {
        QuadratureRule::Trapezoid => {
            for k in 0..n - 1 {
                sum += 0.5 * (f[k] + f[k + 1]) * dx(k);
            }
        }
        QuadratureRule::Legacy => {
            for k in 0..n - 1 {
                sum += f[k] * dx(k);
            }
        }
    }
    sum
}

/// Integrate `f` sampled at coordinates `x`.
pub fn integrate_samples(f: &[f64], x: &[f64], rule: QuadratureRule) -> f64 {
    let n = f.len().min(x.len());
    quadrature(ArrayView1::from(&f[..n]), |k| x[k + 1] - x[k], rule)
}

/// Collapse `data` along `axis`.
///
/// `dx(lane, k)` gives the width of interval `k` for the lane whose index in
/// the remaining dimensions is `lane`. Lanes are independent; with
/// `parallel` they are spread over the rayon pool, which leaves each lane's
/// sum unchanged.
pub fn reduce_axis<D, W>(
    data: ArrayView<'_, f64, D>,
    axis: Axis,
    rule: QuadratureRule,
    parallel: bool,
    dx: W,
) -> Array<f64, D::Smaller>
where
    D: RemoveAxis,
    W: Fn(&[usize], usize) -> f64 + Sync,
{
    let mut out = Array::zeros(data.raw_dim().remove_axis(axis));
    // Lanes and output indices both run in logical order of the remaining
    // dimensions.
    let lanes: Vec<ArrayView1<'_, f64>> = data.lanes(axis).into_iter().collect();
    let index: Vec<D::Smaller> = indices(out.raw_dim())
        .into_iter()
        .map(IntoDimension::into_dimension)
        .collect();
    let lane_sum = |idx: &D::Smaller, lane: &ArrayView1<'_, f64>| {
        quadrature(lane.view(), |k| dx(idx.slice(), k), rule)
    };

    let sums: Vec<f64> = if parallel {
        index
            .par_iter()
            .zip(lanes.par_iter())
            .map(|(idx, lane)| lane_sum(idx, lane))
            .collect()
    } else {
        index
            .iter()
            .zip(lanes.iter())
            .map(|(idx, lane)| lane_sum(idx, lane))
            .collect()
    };
    out.iter_mut().zip(sums).for_each(|(o, sum)| *o = sum);
    out
}
