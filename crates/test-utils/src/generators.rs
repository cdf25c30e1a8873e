//! Test data generators for creating synthetic forecast-like data.
//!
//! These generators create predictable, verifiable patterns that can be
//! reduced by hand in assertions.

use chrono::{DateTime, Duration, Utc};
use geo_types::{polygon, Polygon};
use ndarray::Array3;

/// Creates `n` evenly spaced coordinates starting at `start`.
///
/// A negative `step` gives a descending axis (north-to-south latitude).
///
/// # Example
///
/// ```
/// use test_utils::create_axis;
///
/// assert_eq!(create_axis(10.0, -0.5, 3), vec![10.0, 9.5, 9.0]);
/// ```
pub fn create_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Creates `n` valid times `hours` apart, starting at `init`.
pub fn create_times(init: DateTime<Utc>, hours: i64, n: usize) -> Vec<DateTime<Utc>> {
    (0..n)
        .map(|i| init + Duration::hours(hours * i as i64))
        .collect()
}

/// Creates a (time, lat, lon) cube with every value equal to `value`.
pub fn create_constant_cube(steps: usize, rows: usize, cols: usize, value: f64) -> Array3<f64> {
    Array3::from_elem((steps, rows, cols), value)
}

/// Creates a cumulative (running total) cube, uniform in space.
///
/// `increments[t]` is added at step `t`, so step 0 holds `increments[0]`.
/// Models accumulated fields like precipitation in metres.
pub fn create_cumulative_cube(increments: &[f64], rows: usize, cols: usize) -> Array3<f64> {
    let mut cube = Array3::zeros((increments.len(), rows, cols));
    let mut total = 0.0;
    for (t, inc) in increments.iter().enumerate() {
        total += inc;
        cube.index_axis_mut(ndarray::Axis(0), t).fill(total);
    }
    cube
}

/// Creates a cube whose values vary only with time: `values[t]` everywhere.
pub fn create_time_series_cube(values: &[f64], rows: usize, cols: usize) -> Array3<f64> {
    Array3::from_shape_fn((values.len(), rows, cols), |(t, _, _)| values[t])
}

/// Sets selected `(row, col)` cells to NaN at every time step.
pub fn with_missing_cells(mut cube: Array3<f64>, cells: &[(usize, usize)]) -> Array3<f64> {
    for &(r, c) in cells {
        for t in 0..cube.dim().0 {
            cube[[t, r, c]] = f64::NAN;
        }
    }
    cube
}

/// Creates an axis-aligned rectangular polygon.
pub fn create_rect_polygon(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Polygon<f64> {
    polygon![
        (x: min_lon, y: min_lat),
        (x: max_lon, y: min_lat),
        (x: max_lon, y: max_lat),
        (x: min_lon, y: max_lat),
        (x: min_lon, y: min_lat),
    ]
}

/// Creates a zero-area polygon whose vertices lie on one line.
pub fn create_degenerate_polygon(lon: f64, lat: f64) -> Polygon<f64> {
    polygon![
        (x: lon, y: lat),
        (x: lon + 1.0, y: lat + 1.0),
        (x: lon + 2.0, y: lat + 2.0),
        (x: lon, y: lat),
    ]
}
