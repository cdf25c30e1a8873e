//! Fan-out of weight computation across polygons.
//!
//! Jobs own their cropped axes and borrow the geometry immutably, so workers
//! share nothing mutable. With more than one worker the jobs run on a
//! dedicated rayon pool; `collect` into a `Result` is the join barrier and the
//! first geometry error fails the batch.

use std::collections::HashMap;

use forecast_grid::Axis;
use geo_types::MultiPolygon;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{ReducerError, Result};
use crate::weights::{WeightGrid, WeightMaskProvider};

/// One polygon's weight computation.
#[derive(Debug, Clone)]
pub struct WeightJob<'g> {
    pub id: String,
    pub geometry: &'g MultiPolygon<f64>,
    pub lat: Axis,
    pub lon: Axis,
}

impl WeightJob<'_> {
    fn run(&self, provider: &WeightMaskProvider) -> Result<(String, WeightGrid)> {
        let grid = provider
            .compute(self.geometry, &self.lat, &self.lon)
            .map_err(|source| ReducerError::Geometry {
                polygon: self.id.clone(),
                source,
            })?;
        debug!(polygon = %self.id, covered = grid.covered_cells(), "Weights computed");
        Ok((self.id.clone(), grid))
    }
}

/// Computes weight grids for many polygons, optionally in parallel.
#[derive(Debug, Clone, Copy)]
pub struct ParallelWeightComputer {
    workers: usize,
    provider: WeightMaskProvider,
}

impl ParallelWeightComputer {
    pub fn new(workers: usize, provider: WeightMaskProvider) -> Self {
        Self { workers, provider }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Weight grids keyed by polygon id. Any geometry error aborts the batch.
    pub fn compute_many(&self, jobs: Vec<WeightJob<'_>>) -> Result<HashMap<String, WeightGrid>> {
        if jobs.is_empty() {
            return Ok(HashMap::new());
        }

        info!(
            polygons = jobs.len(),
            workers = self.workers,
            depth = self.provider.max_depth(),
            "Computing weight grids"
        );

        if self.workers <= 1 || jobs.len() == 1 {
            return self.compute_sequential(&jobs);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("weights-{}", i))
            .build()
            .map_err(|e| ReducerError::WorkerPool(e.to_string()))?;

        let provider = self.provider;
        let results: Vec<(String, WeightGrid)> = pool.install(|| {
            jobs.par_iter()
                .map(|job| job.run(&provider))
                .collect::<Result<Vec<_>>>()
        })?;

        Ok(results.into_iter().collect())
    }

    fn compute_sequential(&self, jobs: &[WeightJob<'_>]) -> Result<HashMap<String, WeightGrid>> {
        jobs.iter().map(|job| job.run(&self.provider)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::GeometryError;
    use test_utils::{create_axis, create_degenerate_polygon, create_rect_polygon};

    fn axes() -> (Axis, Axis) {
        (
            Axis::new("lat", create_axis(0.0, 1.0, 6)).unwrap(),
            Axis::new("lon", create_axis(0.0, 1.0, 6)).unwrap(),
        )
    }

    fn polygons() -> Vec<MultiPolygon<f64>> {
        vec![
            create_rect_polygon(0.5, 0.5, 2.5, 2.5).into(),
            create_rect_polygon(2.7, 2.7, 4.2, 4.9).into(),
            create_rect_polygon(0.1, 3.0, 1.3, 5.2).into(),
        ]
    }

    fn jobs<'g>(geoms: &'g [MultiPolygon<f64>]) -> Vec<WeightJob<'g>> {
        let (lat, lon) = axes();
        geoms
            .iter()
            .enumerate()
            .map(|(i, g)| WeightJob {
                id: format!("p{}", i),
                geometry: g,
                lat: lat.clone(),
                lon: lon.clone(),
            })
            .collect()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let geoms = polygons();
        let provider = WeightMaskProvider::default();

        let sequential = ParallelWeightComputer::new(1, provider)
            .compute_many(jobs(&geoms))
            .unwrap();
        let parallel = ParallelWeightComputer::new(3, provider)
            .compute_many(jobs(&geoms))
            .unwrap();

        assert_eq!(sequential.len(), 3);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_degenerate_polygon_fails_batch() {
        let mut geoms = polygons();
        geoms.push(create_degenerate_polygon(1.0, 1.0).into());

        for workers in [1, 4] {
            let result = ParallelWeightComputer::new(workers, WeightMaskProvider::default())
                .compute_many(jobs(&geoms));
            match result {
                Err(ReducerError::Geometry { polygon, source }) => {
                    assert_eq!(polygon, "p3");
                    assert_eq!(source, GeometryError::Degenerate);
                }
                other => panic!("expected geometry error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_batch() {
        let result = ParallelWeightComputer::new(4, WeightMaskProvider::default())
            .compute_many(Vec::new())
            .unwrap();
        assert!(result.is_empty());
    }
}
