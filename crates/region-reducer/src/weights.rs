//! Polygon-to-grid coverage weights.
//!
//! Each grid cell is the rectangle spanned by its axis edges. A cell fully
//! inside the polygon has weight 1.0 and a cell that does not share any
//! interior with it is masked, both without recursion. Straddling cells are
//! split into four quadrants recursively; at the maximum depth a sub-cell
//! counts as covered when its centre is inside. A cell's weight is the mean
//! of its children.

use forecast_grid::Axis;
use geo::coordinate_position::CoordPos;
use geo::dimensions::Dimensions;
use geo::sweep::{Cross, Intersections, LineOrPoint};
use geo::{Area, BoundingRect, Contains, CoordsIter, Intersects, LineIntersection, Relate};
use geo_types::{coord, Line, LineString, MultiPolygon, Point, Rect};
use ndarray::Array2;
use thiserror::Error;
use tracing::debug;

/// Reasons a polygon cannot be turned into a weight grid.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("polygon has non-finite coordinates")]
    NonFinite,

    #[error("polygon is degenerate (zero area)")]
    Degenerate,

    #[error("polygon is not valid (self-intersecting or overlapping rings)")]
    Invalid,

    #[error("polygon lies entirely outside the grid envelope")]
    OutsideGrid,

    #[error("polygon covers no grid cell")]
    NoCoverage,
}

/// Fractional coverage per cell plus an explicit exclusion mask.
///
/// `mask[[i, j]] == true` means the cell is excluded; its weight is 0 and must
/// never take part in a statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightGrid {
    weights: Array2<f64>,
    mask: Array2<bool>,
}

impl WeightGrid {
    /// Build from raw coverage fractions; cells with zero (or non-finite)
    /// coverage are masked.
    pub fn from_coverage(coverage: Array2<f64>) -> Self {
        let mask = coverage.mapv(|w| !(w.is_finite() && w > 0.0));
        let weights = coverage.mapv(|w| if w.is_finite() && w > 0.0 { w.min(1.0) } else { 0.0 });
        Self { weights, mask }
    }

    /// `(lat, lon)` shape.
    pub fn shape(&self) -> (usize, usize) {
        self.weights.dim()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    pub fn is_masked(&self, row: usize, col: usize) -> bool {
        self.mask[[row, col]]
    }

    /// Number of cells with non-zero coverage.
    pub fn covered_cells(&self) -> usize {
        self.mask.iter().filter(|m| !**m).count()
    }

    /// True when every cell is masked.
    pub fn is_fully_masked(&self) -> bool {
        self.covered_cells() == 0
    }
}

/// Computes [`WeightGrid`]s by recursive cell subdivision.
#[derive(Debug, Clone, Copy)]
pub struct WeightMaskProvider {
    max_depth: u32,
}

impl Default for WeightMaskProvider {
    fn default() -> Self {
        Self { max_depth: 5 }
    }
}

impl WeightMaskProvider {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Coverage weights of `polygon` over the cells of `lat` x `lon`.
    pub fn compute(
        &self,
        polygon: &MultiPolygon<f64>,
        lat: &Axis,
        lon: &Axis,
    ) -> Result<WeightGrid, GeometryError> {
        let bbox = validate_geometry(polygon)?;

        let (lat_min, lat_max) = lat.envelope();
        let (lon_min, lon_max) = lon.envelope();
        if bbox.max().x <= lon_min
            || bbox.min().x >= lon_max
            || bbox.max().y <= lat_min
            || bbox.min().y >= lat_max
        {
            return Err(GeometryError::OutsideGrid);
        }

        let mut coverage = Array2::zeros((lat.len(), lon.len()));
        for i in 0..lat.len() {
            let (y0, y1) = lat.cell_bounds(i);
            if y1 <= bbox.min().y || y0 >= bbox.max().y {
                continue;
            }
            for j in 0..lon.len() {
                let (x0, x1) = lon.cell_bounds(j);
                if x1 <= bbox.min().x || x0 >= bbox.max().x {
                    continue;
                }
                let cell = Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 });
                coverage[[i, j]] = self.cell_coverage(polygon, cell, 0);
            }
        }

        let grid = WeightGrid::from_coverage(coverage);
        if grid.is_fully_masked() {
            return Err(GeometryError::NoCoverage);
        }

        debug!(
            rows = lat.len(),
            cols = lon.len(),
            covered = grid.covered_cells(),
            "Computed weight grid"
        );

        Ok(grid)
    }

    fn cell_coverage(&self, polygon: &MultiPolygon<f64>, cell: Rect<f64>, depth: u32) -> f64 {
        let matrix = polygon.relate(&cell.to_polygon());
        if matrix.is_contains() {
            return 1.0;
        }
        if matrix.get(CoordPos::Inside, CoordPos::Inside) == Dimensions::Empty {
            return 0.0;
        }

        if depth >= self.max_depth {
            let centre: Point<f64> = cell.center().into();
            return if polygon.contains(&centre) { 1.0 } else { 0.0 };
        }

        let (min, max, mid) = (cell.min(), cell.max(), cell.center());
        let quadrants = [
            Rect::new(min, mid),
            Rect::new(coord! { x: mid.x, y: min.y }, coord! { x: max.x, y: mid.y }),
            Rect::new(coord! { x: min.x, y: mid.y }, coord! { x: mid.x, y: max.y }),
            Rect::new(mid, max),
        ];

        quadrants
            .into_iter()
            .map(|q| self.cell_coverage(polygon, q, depth + 1))
            .sum::<f64>()
            / 4.0
    }
}

/// Check that a polygon can be weighted and return its bounding rectangle.
pub fn validate_geometry(polygon: &MultiPolygon<f64>) -> Result<Rect<f64>, GeometryError> {
    if polygon
        .coords_iter()
        .any(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(GeometryError::NonFinite);
    }

    let bbox = polygon.bounding_rect().ok_or(GeometryError::Degenerate)?;
    let area = polygon.unsigned_area();
    if area.is_nan() || area <= 0.0 {
        return Err(GeometryError::Degenerate);
    }

    if has_ring_crossings(polygon) || has_overlapping_parts(polygon) {
        return Err(GeometryError::Invalid);
    }

    Ok(bbox)
}

/// One non-degenerate edge of a ring, tagged with where it came from.
#[derive(Debug, Clone, Copy)]
struct RingEdge {
    line: Line<f64>,
    ring: usize,
    index: usize,
    edges: usize,
}

impl Cross for RingEdge {
    type Scalar = f64;

    fn line(&self) -> LineOrPoint<f64> {
        self.line.into()
    }
}

impl RingEdge {
    /// Consecutive edges of the same ring, which always share a vertex.
    fn is_adjacent(&self, other: &RingEdge) -> bool {
        self.ring == other.ring
            && ((self.index + 1) % self.edges == other.index
                || (other.index + 1) % other.edges == self.index)
    }
}

fn ring_edges(ring: usize, ring_string: &LineString<f64>) -> Vec<RingEdge> {
    let lines: Vec<Line<f64>> = ring_string.lines().filter(|l| l.start != l.end).collect();
    let edges = lines.len();
    lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| RingEdge { line, ring, index, edges })
        .collect()
}

/// Crossings or overlaps between ring edges, found with a plane sweep.
///
/// Edges of different rings may touch at a vertex; edges of one ring may
/// only meet their neighbours at the shared vertex.
fn has_ring_crossings(polygon: &MultiPolygon<f64>) -> bool {
    let rings = polygon
        .0
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()));
    let edges: Vec<RingEdge> = rings
        .enumerate()
        .flat_map(|(ring, ring_string)| ring_edges(ring, ring_string))
        .collect();

    Intersections::<_>::from_iter(edges).any(|(a, b, hit)| match hit {
        LineIntersection::Collinear { .. } => true,
        LineIntersection::SinglePoint { is_proper: true, .. } => true,
        LineIntersection::SinglePoint { .. } => a.ring == b.ring && !a.is_adjacent(&b),
    })
}

/// Parts of a multipolygon whose interiors intersect.
fn has_overlapping_parts(polygon: &MultiPolygon<f64>) -> bool {
    let parts = &polygon.0;
    parts.iter().enumerate().any(|(i, a)| {
        parts[i + 1..].iter().any(|b| {
            a.intersects(b)
                && a.relate(b).get(CoordPos::Inside, CoordPos::Inside) != Dimensions::Empty
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;
    use test_utils::{assert_approx_eq, create_axis, create_degenerate_polygon, create_rect_polygon};

    fn axes() -> (Axis, Axis) {
        // 4x4 unit cells with edges at -0.5, 0.5, ..., 3.5
        (
            Axis::new("lat", create_axis(0.0, 1.0, 4)).unwrap(),
            Axis::new("lon", create_axis(0.0, 1.0, 4)).unwrap(),
        )
    }

    fn multi(p: geo_types::Polygon<f64>) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![p])
    }

    #[test]
    fn test_aligned_rectangle_full_cells() {
        let (lat, lon) = axes();
        let poly = multi(create_rect_polygon(0.5, 0.5, 2.5, 2.5));
        let grid = WeightMaskProvider::default().compute(&poly, &lat, &lon).unwrap();

        assert_eq!(grid.shape(), (4, 4));
        assert_eq!(grid.covered_cells(), 4);
        for (i, j) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            assert_eq!(grid.weights()[[i, j]], 1.0);
            assert!(!grid.is_masked(i, j));
        }
        assert!(grid.is_masked(0, 0));
        assert_eq!(grid.weights()[[0, 0]], 0.0);
    }

    #[test]
    fn test_half_cell_coverage() {
        let (lat, lon) = axes();
        // Covers the left half of cell (1, 1)
        let poly = multi(create_rect_polygon(0.5, 0.5, 1.0, 1.5));
        let grid = WeightMaskProvider::new(4).compute(&poly, &lat, &lon).unwrap();

        assert_eq!(grid.covered_cells(), 1);
        assert_approx_eq!(grid.weights()[[1, 1]], 0.5, 1e-9);
    }

    #[test]
    fn test_triangle_coverage_converges() {
        let (lat, lon) = axes();
        // Lower-left triangle of cell (1, 1)
        let poly = multi(polygon![
            (x: 0.5, y: 0.5),
            (x: 1.5, y: 0.5),
            (x: 0.5, y: 1.5),
            (x: 0.5, y: 0.5),
        ]);
        let grid = WeightMaskProvider::new(6).compute(&poly, &lat, &lon).unwrap();
        assert_approx_eq!(grid.weights()[[1, 1]], 0.5, 0.05);
        assert!(grid.is_masked(2, 2));
    }

    #[test]
    fn test_weights_in_unit_interval() {
        let (lat, lon) = axes();
        let poly = multi(polygon![
            (x: 0.2, y: 0.1),
            (x: 3.1, y: 0.7),
            (x: 2.4, y: 3.3),
            (x: 0.2, y: 0.1),
        ]);
        let grid = WeightMaskProvider::default().compute(&poly, &lat, &lon).unwrap();
        for ((idx, w), m) in grid.weights().indexed_iter().zip(grid.mask().iter()) {
            assert!((0.0..=1.0).contains(w), "weight {} at {:?}", w, idx);
            assert_eq!(*m, *w == 0.0);
        }
    }

    #[test]
    fn test_descending_latitude() {
        let lat = Axis::new("lat", create_axis(3.0, -1.0, 4)).unwrap();
        let lon = Axis::new("lon", create_axis(0.0, 1.0, 4)).unwrap();
        let poly = multi(create_rect_polygon(0.5, 2.5, 1.5, 3.5));
        let grid = WeightMaskProvider::default().compute(&poly, &lat, &lon).unwrap();

        // Latitude 3.0 is row 0
        assert_eq!(grid.weights()[[0, 1]], 1.0);
        assert_eq!(grid.covered_cells(), 1);
    }

    #[test]
    fn test_degenerate_polygon() {
        let (lat, lon) = axes();
        let poly = multi(create_degenerate_polygon(0.0, 0.0));
        assert_eq!(
            WeightMaskProvider::default().compute(&poly, &lat, &lon),
            Err(GeometryError::Degenerate)
        );
    }

    #[test]
    fn test_self_intersecting_polygon() {
        let (lat, lon) = axes();
        // Asymmetric bowtie: non-zero signed area, edges cross
        let poly = multi(polygon![
            (x: 0.0, y: 0.0),
            (x: 3.0, y: 2.0),
            (x: 3.0, y: 0.0),
            (x: 0.0, y: 3.0),
            (x: 0.0, y: 0.0),
        ]);
        assert_eq!(
            WeightMaskProvider::default().compute(&poly, &lat, &lon),
            Err(GeometryError::Invalid)
        );
    }

    #[test]
    fn test_ring_touching_itself_is_invalid() {
        // Vertex (2, 1) lies on the far edge of the same ring
        let poly = multi(polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 1.0, y: 1.0),
            (x: 2.0, y: 1.0),
            (x: 1.0, y: 2.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ]);
        assert_eq!(validate_geometry(&poly), Err(GeometryError::Invalid));
    }

    #[test]
    fn test_overlapping_parts_are_invalid() {
        let poly = MultiPolygon::new(vec![
            create_rect_polygon(0.0, 0.0, 2.0, 2.0),
            create_rect_polygon(0.5, 0.5, 1.5, 1.5),
        ]);
        assert_eq!(validate_geometry(&poly), Err(GeometryError::Invalid));
    }

    #[test]
    fn test_valid_shapes_pass_validation() {
        // Parts touching at a corner, a polygon with a hole, a repeated vertex
        let touching = MultiPolygon::new(vec![
            create_rect_polygon(0.0, 0.0, 1.0, 1.0),
            create_rect_polygon(1.0, 1.0, 2.0, 2.0),
        ]);
        assert!(validate_geometry(&touching).is_ok());

        let holed = multi(polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 3.0), (x: 0.0, y: 3.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 2.0)]],
        ));
        assert!(validate_geometry(&holed).is_ok());

        let repeated = multi(polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]);
        assert!(validate_geometry(&repeated).is_ok());
    }

    #[test]
    fn test_non_finite_polygon() {
        let (lat, lon) = axes();
        let poly = multi(create_rect_polygon(0.0, 0.0, f64::NAN, 1.0));
        assert_eq!(
            WeightMaskProvider::default().compute(&poly, &lat, &lon),
            Err(GeometryError::NonFinite)
        );
    }

    #[test]
    fn test_polygon_outside_grid() {
        let (lat, lon) = axes();
        let poly = multi(create_rect_polygon(10.0, 10.0, 11.0, 11.0));
        assert_eq!(
            WeightMaskProvider::default().compute(&poly, &lat, &lon),
            Err(GeometryError::OutsideGrid)
        );
    }

    #[test]
    fn test_polygon_missing_every_centre() {
        let (lat, lon) = axes();
        // Tiny sliver far from any sub-cell centre at depth 0
        let poly = multi(create_rect_polygon(0.51, 0.51, 0.52, 0.52));
        assert_eq!(
            WeightMaskProvider::new(0).compute(&poly, &lat, &lon),
            Err(GeometryError::NoCoverage)
        );
    }
}
