//! Masked statistics over cropped grid slices.
//!
//! A cell takes part in a statistic only if it is unmasked in the weight grid
//! and its value is finite: the effective mask is always the union of both.

use ndarray::{Array2, ArrayView2, ArrayView3, Axis, Zip};

use crate::error::{ReducerError, Result};
use crate::weights::WeightGrid;

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn check_shape(values: &ArrayView2<f64>, weights: &WeightGrid) -> Result<()> {
    if values.dim() != weights.shape() {
        return Err(ReducerError::ShapeMismatch {
            weights: weights.shape(),
            data: values.dim(),
        });
    }
    Ok(())
}

/// Coverage-weighted mean of the valid cells, `None` if there are none.
pub fn weighted_average(values: ArrayView2<f64>, weights: &WeightGrid) -> Result<Option<f64>> {
    check_shape(&values, weights)?;

    let mut sum = 0.0;
    let mut total_weight = 0.0;
    Zip::from(&values)
        .and(weights.weights())
        .and(weights.mask())
        .for_each(|&v, &w, &masked| {
            if !masked && v.is_finite() {
                sum += v * w;
                total_weight += w;
            }
        });

    Ok((total_weight > 0.0).then(|| sum / total_weight))
}

fn masked_fold(
    values: ArrayView2<f64>,
    weights: &WeightGrid,
    pick: fn(f64, f64) -> f64,
) -> Result<Option<f64>> {
    check_shape(&values, weights)?;

    let mut acc: Option<f64> = None;
    Zip::from(&values)
        .and(weights.mask())
        .for_each(|&v, &masked| {
            if !masked && v.is_finite() {
                acc = Some(acc.map_or(v, |a| pick(a, v)));
            }
        });

    Ok(acc)
}

/// Minimum over the valid cells. Coverage fractions are ignored.
pub fn masked_min(values: ArrayView2<f64>, weights: &WeightGrid) -> Result<Option<f64>> {
    masked_fold(values, weights, f64::min)
}

/// Maximum over the valid cells. Coverage fractions are ignored.
pub fn masked_max(values: ArrayView2<f64>, weights: &WeightGrid) -> Result<Option<f64>> {
    masked_fold(values, weights, f64::max)
}

fn fold_time(cube: ArrayView3<f64>, init: f64, f: impl Fn(f64, f64) -> f64) -> Array2<f64> {
    cube.fold_axis(Axis(0), init, |&acc, &v| if v.is_finite() { f(acc, v) } else { acc })
}

/// Per-cell minimum over time, skipping missing values. All-missing cells are `NaN`.
pub fn nan_min_over_time(cube: ArrayView3<f64>) -> Array2<f64> {
    fold_time(cube, f64::INFINITY, f64::min).mapv(|v| if v.is_infinite() { f64::NAN } else { v })
}

/// Per-cell maximum over time, skipping missing values. All-missing cells are `NaN`.
pub fn nan_max_over_time(cube: ArrayView3<f64>) -> Array2<f64> {
    fold_time(cube, f64::NEG_INFINITY, f64::max)
        .mapv(|v| if v.is_infinite() { f64::NAN } else { v })
}

/// Per-cell mean over time, skipping missing values. All-missing cells are `NaN`.
pub fn nan_mean_over_time(cube: ArrayView3<f64>) -> Array2<f64> {
    let sums = fold_time(cube, 0.0, |a, v| a + v);
    let counts = cube.fold_axis(Axis(0), 0usize, |&n, &v| n + usize::from(v.is_finite()));
    Zip::from(&sums)
        .and(&counts)
        .map_collect(|&s, &n| if n == 0 { f64::NAN } else { s / n as f64 })
}

/// `end - start` per cell, optionally clamped at zero.
pub fn difference(end: ArrayView2<f64>, start: ArrayView2<f64>, clamp_negative: bool) -> Array2<f64> {
    Zip::from(&end).and(&start).map_collect(|&e, &s| {
        let d = e - s;
        if clamp_negative && d < 0.0 {
            0.0
        } else {
            d
        }
    })
}
