//! One-dimensional coordinate axes.
//!
//! Forecast exports store latitude either north-to-south or south-to-north, so
//! an [`Axis`] keeps its samples in file order and tracks the direction rather
//! than re-sorting. Each sample owns a cell bounded by the midpoints to its
//! neighbours; the outermost cells extend half a spacing past the end samples.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Sort order of an axis in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisDirection {
    Ascending,
    Descending,
}

/// A strictly monotonic coordinate axis with cell edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    values: Vec<f64>,
    /// `values.len() + 1` edges. A cropped axis keeps the edges of its parent.
    edges: Vec<f64>,
    direction: AxisDirection,
}

impl Axis {
    /// Build an axis from coordinate samples.
    ///
    /// Requires at least two finite, strictly monotonic samples.
    pub fn new(name: &str, values: Vec<f64>) -> GridResult<Self> {
        if values.len() < 2 {
            return Err(GridError::invalid_axis(
                name,
                format!("need at least 2 samples, got {}", values.len()),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(GridError::invalid_axis(
                name,
                format!("non-finite coordinate {}", bad),
            ));
        }

        let direction = if values[1] > values[0] {
            AxisDirection::Ascending
        } else {
            AxisDirection::Descending
        };

        let monotonic = values.windows(2).all(|w| match direction {
            AxisDirection::Ascending => w[1] > w[0],
            AxisDirection::Descending => w[1] < w[0],
        });
        if !monotonic {
            return Err(GridError::invalid_axis(name, "not strictly monotonic"));
        }

        let n = values.len();
        let mut edges = Vec::with_capacity(n + 1);
        edges.push(values[0] - (values[1] - values[0]) / 2.0);
        for w in values.windows(2) {
            edges.push((w[0] + w[1]) / 2.0);
        }
        edges.push(values[n - 1] + (values[n - 1] - values[n - 2]) / 2.0);

        Ok(Self {
            values,
            edges,
            direction,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn direction(&self) -> AxisDirection {
        self.direction
    }

    /// Lower and upper bound of cell `i`, ordered regardless of direction.
    pub fn cell_bounds(&self, i: usize) -> (f64, f64) {
        let (a, b) = (self.edges[i], self.edges[i + 1]);
        (a.min(b), a.max(b))
    }

    /// Minimum and maximum sample coordinate.
    pub fn range(&self) -> (f64, f64) {
        let first = self.values[0];
        let last = self.values[self.values.len() - 1];
        (first.min(last), first.max(last))
    }

    /// Minimum and maximum cell edge: the area the axis covers.
    pub fn envelope(&self) -> (f64, f64) {
        let first = self.edges[0];
        let last = self.edges[self.edges.len() - 1];
        (first.min(last), first.max(last))
    }

    /// Contiguous index range of samples with `lo <= value <= hi`.
    ///
    /// Returns `None` when no sample falls inside. The bounds may be given in
    /// either order.
    pub fn indices_within(&self, lo: f64, hi: f64) -> Option<Range<usize>> {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let start = self.values.iter().position(|&v| v >= lo && v <= hi)?;
        let len = self.values[start..]
            .iter()
            .take_while(|&&v| v >= lo && v <= hi)
            .count();
        Some(start..start + len)
    }

    /// Contiguous index range of cells whose extent overlaps `(lo, hi)`.
    ///
    /// A cell that only touches the interval at an edge is left out. Returns
    /// `None` when no cell overlaps. The bounds may be given in either order.
    pub fn indices_overlapping(&self, lo: f64, hi: f64) -> Option<Range<usize>> {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let overlaps = |i: usize| {
            let (a, b) = self.cell_bounds(i);
            b > lo && a < hi
        };
        let start = (0..self.values.len()).find(|&i| overlaps(i))?;
        let len = (start..self.values.len()).take_while(|&i| overlaps(i)).count();
        Some(start..start + len)
    }

    /// Sub-axis over `range`, keeping the parent's cell edges.
    ///
    /// # Panics
    ///
    /// Panics if `range` is empty or out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Axis {
        assert!(
            range.start < range.end && range.end <= self.values.len(),
            "axis slice {:?} out of bounds for length {}",
            range,
            self.values.len()
        );
        Axis {
            values: self.values[range.clone()].to_vec(),
            edges: self.edges[range.start..range.end + 1].to_vec(),
            direction: self.direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascending_edges() {
        let axis = Axis::new("lon", vec![0.0, 1.0, 2.0]).unwrap();
        assert_eq!(axis.direction(), AxisDirection::Ascending);
        assert_eq!(axis.edges(), &[-0.5, 0.5, 1.5, 2.5]);
        assert_eq!(axis.cell_bounds(1), (0.5, 1.5));
        assert_eq!(axis.envelope(), (-0.5, 2.5));
    }

    #[test]
    fn test_descending_axis() {
        let axis = Axis::new("lat", vec![10.0, 9.5, 9.0, 8.5]).unwrap();
        assert_eq!(axis.direction(), AxisDirection::Descending);
        assert_eq!(axis.cell_bounds(0), (9.75, 10.25));
        assert_eq!(axis.range(), (8.5, 10.0));
        assert_eq!(axis.indices_within(8.9, 9.6), Some(1..3));
        assert_eq!(axis.indices_within(9.6, 8.9), Some(1..3));
    }

    #[test]
    fn test_rejects_bad_axes() {
        assert!(Axis::new("lat", vec![1.0]).is_err());
        assert!(Axis::new("lat", vec![1.0, 1.0]).is_err());
        assert!(Axis::new("lat", vec![1.0, 2.0, 1.5]).is_err());
        assert!(Axis::new("lat", vec![1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_indices_within_empty() {
        let axis = Axis::new("lon", vec![0.0, 1.0, 2.0]).unwrap();
        assert_eq!(axis.indices_within(5.0, 6.0), None);
        assert_eq!(axis.indices_within(0.2, 0.8), None);
        assert_eq!(axis.indices_within(2.0, 2.0), Some(2..3));
    }

    #[test]
    fn test_indices_overlapping_irregular_axis() {
        // Cell 3 spans [6, 14]
        let axis = Axis::new("lon", vec![0.0, 1.0, 2.0, 10.0]).unwrap();
        assert_eq!(axis.indices_within(6.5, 7.0), None);
        assert_eq!(axis.indices_overlapping(6.5, 7.0), Some(3..4));
        assert_eq!(axis.indices_overlapping(1.2, 6.5), Some(1..4));
        assert_eq!(axis.indices_overlapping(14.0, 15.0), None);
        assert_eq!(axis.indices_overlapping(0.5, 1.5), Some(1..2));
    }

    #[test]
    fn test_indices_overlapping_descending() {
        let axis = Axis::new("lat", vec![10.0, 9.5, 9.0, 8.5]).unwrap();
        assert_eq!(axis.indices_overlapping(9.0, 9.2), Some(2..3));
        assert_eq!(axis.indices_overlapping(9.6, 8.9), Some(1..3));
    }

    #[test]
    fn test_single_sample_slice_keeps_edges() {
        let axis = Axis::new("lon", vec![0.0, 1.0, 2.0]).unwrap();
        let cropped = axis.slice(1..2);
        assert_eq!(cropped.len(), 1);
        assert_eq!(cropped.values(), &[1.0]);
        assert_eq!(cropped.cell_bounds(0), (0.5, 1.5));
        assert_eq!(cropped.envelope(), (0.5, 1.5));
    }
}
