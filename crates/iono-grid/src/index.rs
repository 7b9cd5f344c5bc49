//! Bracket search on monotonic, possibly non-uniform axes.
//!
//! Native model levels are pressure surfaces, so the geometric height of a
//! level differs from column to column. Every regrid lookup therefore has to
//! search the column it is working on rather than a shared axis.

use num_traits::Float;

use crate::error::{GridError, Result};

/// Bracket start index plus the fractional position of the query inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket<T> {
    /// Lower sample of the bracket: `x[index] <= y < x[index + 1]` for
    /// in-range queries.
    pub index: usize,
    /// `(y - x[index]) / (x[index + 1] - x[index])`. Below 0 or above 1 when
    /// the query was clamped, and 0 for a degenerate bracket.
    pub fraction: T,
}

impl<T: Float> Bracket<T> {
    /// Whether the query lay outside the axis and was clamped to an edge.
    pub fn is_extrapolated(&self) -> bool {
        self.fraction < T::zero() || self.fraction > T::one()
    }
}

/// Check that `x` is non-empty and monotonic non-decreasing.
pub fn validate_monotonic<T: Float>(x: &[T]) -> Result<()> {
    if x.is_empty() {
        return Err(GridError::invalid_axis("axis is empty"));
    }
    if let Some(pos) = x.windows(2).position(|w| !(w[1] >= w[0])) {
        return Err(GridError::invalid_axis(format!(
            "axis is not monotonic non-decreasing at {}",
            pos + 1
        )));
    }
    Ok(())
}

/// Reference linear scan for the bracket start of `y`.
///
/// Returns 0 for `y <= x[0]`, `N - 2` for `y >= x[N - 1]` (0 when `N == 1`),
/// otherwise the unique `i` with `x[i] <= y < x[i + 1]`.
pub fn bracket_index_linear<T: Float>(x: &[T], y: T) -> Result<usize> {
    validate_monotonic(x)?;
    Ok(scan_unchecked(x, y))
}

/// Binary-search version of [`bracket_index_linear`]; returns the same index
/// for every monotonic axis.
pub fn bracket_index<T: Float>(x: &[T], y: T) -> Result<usize> {
    validate_monotonic(x)?;
    Ok(search_unchecked(x, y))
}

/// Bracket index and fractional position of `y` on `x`.
pub fn bracket<T: Float>(x: &[T], y: T) -> Result<Bracket<T>> {
    validate_monotonic(x)?;
    Ok(bracket_unchecked(x, y))
}

fn scan_unchecked<T: Float>(x: &[T], y: T) -> usize {
    let n = x.len();
    if n < 2 || !(y > x[0]) {
        return 0;
    }
    for i in 0..n - 1 {
        if x[i] <= y && y < x[i + 1] {
            return i;
        }
    }
    n - 2
}

/// Search an axis already known to be monotonic.
fn search_unchecked<T: Float>(x: &[T], y: T) -> usize {
    let n = x.len();
    // NaN queries land here too.
    if n < 2 || !(y > x[0]) {
        return 0;
    }
    // Count of samples <= y, minus one, is the bracket start.
    let upper = x.partition_point(|&v| v <= y);
    (upper - 1).min(n - 2)
}

pub(crate) fn bracket_unchecked<T: Float>(x: &[T], y: T) -> Bracket<T> {
    let index = search_unchecked(x, y);
    if x.len() < 2 {
        return Bracket {
            index,
            fraction: T::zero(),
        };
    }
    let (x0, x1) = (x[index], x[index + 1]);
    let fraction = if x1 > x0 {
        (y - x0) / (x1 - x0)
    } else {
        T::zero()
    };
    Bracket { index, fraction }
}
