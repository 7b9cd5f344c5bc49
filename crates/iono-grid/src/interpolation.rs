//! Linear interpolation within a vertical column.

use num_traits::Float;

use crate::error::{GridError, Result};
use crate::index::{bracket, Bracket};

/// Linear interpolation between two values at fractional position `fac`.
pub fn lerp<T: Float>(v0: T, v1: T, fac: T) -> T {
    v0 + fac * (v1 - v0)
}

/// Interpolate at `y` given the bracket start `i` on axis `x` and the samples
/// `v0 = v[i]`, `v1 = v[i + 1]`.
///
/// A degenerate bracket (`x[i + 1] == x[i]`) returns `v0`. Queries at or
/// beyond either end of the bracket return that end's sample, so the result
/// is exact on the samples and extrapolates flatly outside them.
pub fn interpolate<T: Float>(x: &[T], i: usize, y: T, v0: T, v1: T) -> T {
    if i + 1 >= x.len() {
        return v0;
    }
    let (x0, x1) = (x[i], x[i + 1]);
    if !(x1 > x0) {
        return v0;
    }
    if y <= x0 {
        return v0;
    }
    if y >= x1 {
        return v1;
    }
    lerp(v0, v1, (y - x0) / (x1 - x0))
}

/// Interpolate from a precomputed [`Bracket`].
pub fn interpolate_bracket<T: Float>(b: &Bracket<T>, v0: T, v1: T) -> T {
    if b.fraction <= T::zero() {
        v0
    } else if b.fraction >= T::one() {
        v1
    } else {
        lerp(v0, v1, b.fraction)
    }
}

/// Sample a whole column (`x` heights, `v` values) at `y`.
///
/// Validates that `x` is monotonic and that `v` matches its length.
pub fn interpolate_column<T: Float>(x: &[T], v: &[T], y: T) -> Result<T> {
    if v.len() != x.len() {
        return Err(GridError::shape_mismatch(&[x.len()], &[v.len()]));
    }
    let b = bracket(x, y)?;
    Ok(column_value(v, &b))
}

/// Value of column `v` at bracket `b`, for a column already validated.
pub(crate) fn column_value<T: Float>(v: &[T], b: &Bracket<T>) -> T {
    if v.len() < 2 {
        return v[0];
    }
    interpolate_bracket(b, v[b.index], v[b.index + 1])
}
