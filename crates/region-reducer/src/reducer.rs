//! Regional reduction of forecast parameters over polygons.
//!
//! A request runs in two phases. [`RegionalReducer::prepare`] resolves every
//! polygon to a crop window and a weight grid; polygons whose bounding box
//! misses the grid are set aside as out-of-domain. [`RegionalReducer::reduce_prepared`]
//! then walks the windows of one parameter for every prepared region. Weights
//! depend only on geometry and grid, so [`RegionalReducer::reduce_many`]
//! prepares once and reuses the result for every parameter.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use forecast_common::{format_iso, BoundingBox};
use forecast_grid::{CropWindow, GridDataset, GridError};
use ndarray::{Array2, Zip};
use tracing::{debug, info, warn};

use crate::config::{ForecastSource, ReducerConfig};
use crate::error::{ReducerError, Result};
use crate::parallel::{ParallelWeightComputer, WeightJob};
use crate::parameters::Parameter;
use crate::polygon::PolygonCollection;
use crate::registry::{ChartType, ReducerKind, TemporalPolicy, TimeReduction, ValueType};
use crate::report::{RegionReport, Series};
use crate::stats::round2;
use crate::weights::{validate_geometry, WeightGrid, WeightMaskProvider};
use crate::windows::{check_time_axis, Window};

/// A fully resolved reduction: what to derive, how to collapse time, over
/// which windows, and how to label the result.
#[derive(Debug, Clone, PartialEq)]
pub struct ReduceRequest {
    pub parameter: Parameter,
    pub policy: TemporalPolicy,
    pub windows: Vec<Window>,
    pub chart_type: ChartType,
    pub value_type: ValueType,
    pub t_reduced: TimeReduction,
    pub parameter_name: String,
    pub unit: String,
}

impl ReduceRequest {
    /// Request for a registered reducer with windows from `source`.
    pub fn from_kind(kind: ReducerKind, source: &ForecastSource) -> Result<Self> {
        let spec = kind.spec();
        Ok(Self {
            parameter: spec.parameter,
            policy: spec.policy,
            windows: spec.windowing.windows(source)?,
            chart_type: spec.chart_type,
            value_type: spec.value_type,
            t_reduced: spec.t_reduced,
            parameter_name: spec.parameter_name.to_string(),
            unit: spec.unit().to_string(),
        })
    }

    /// Ad hoc combination of parameter, policy and windows.
    pub fn custom(parameter: Parameter, policy: TemporalPolicy, windows: Vec<Window>) -> Self {
        let t_reduced = if windows.iter().all(Window::is_instant) {
            TimeReduction::Step
        } else {
            TimeReduction::Period
        };
        Self {
            parameter,
            policy,
            windows,
            chart_type: policy.chart_type(),
            value_type: policy.value_type(),
            t_reduced,
            parameter_name: parameter.name().to_string(),
            unit: parameter.unit().to_string(),
        }
    }
}

/// One polygon resolved against the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRegion {
    pub id: String,
    pub crop: CropWindow,
    pub weights: WeightGrid,
}

/// Output of [`RegionalReducer::prepare`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedRegions {
    /// In input order.
    pub regions: Vec<PreparedRegion>,
    pub out_of_domain: Vec<String>,
}

impl PreparedRegions {
    pub fn region(&self, id: &str) -> Option<&PreparedRegion> {
        self.regions.iter().find(|r| r.id == id)
    }
}

/// Computes polygon-weighted statistics from a read-only dataset.
pub struct RegionalReducer<'a> {
    dataset: &'a GridDataset,
    config: ReducerConfig,
    provider: WeightMaskProvider,
    fcst_init: Option<DateTime<Utc>>,
}

impl<'a> RegionalReducer<'a> {
    pub fn new(dataset: &'a GridDataset, config: ReducerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dataset,
            provider: WeightMaskProvider::new(config.subdivision_depth),
            config,
            fcst_init: None,
        })
    }

    /// Override the `fcst_init` label; defaults to the first dataset time.
    pub fn with_fcst_init(mut self, init: DateTime<Utc>) -> Self {
        self.fcst_init = Some(init);
        self
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    pub fn dataset(&self) -> &GridDataset {
        self.dataset
    }

    /// Reduce a registered parameter by name.
    pub fn reduce(
        &self,
        name: &str,
        polygons: &PolygonCollection,
        unique_field: &str,
    ) -> Result<RegionReport> {
        let kind = ReducerKind::from_name(name)?;
        self.reduce_kind(kind, polygons, unique_field)
    }

    pub fn reduce_kind(
        &self,
        kind: ReducerKind,
        polygons: &PolygonCollection,
        unique_field: &str,
    ) -> Result<RegionReport> {
        let request = ReduceRequest::from_kind(kind, &self.config.source)?;
        self.reduce_request(&request, polygons, unique_field)
    }

    pub fn reduce_request(
        &self,
        request: &ReduceRequest,
        polygons: &PolygonCollection,
        unique_field: &str,
    ) -> Result<RegionReport> {
        check_time_axis(&request.windows, self.dataset.times().len())?;
        let prepared = self.prepare(polygons, unique_field)?;
        self.reduce_prepared(request, &prepared)
    }

    /// Reduce several registered parameters, computing weights once.
    ///
    /// Names are resolved before any weight is computed, so an unknown name
    /// fails fast.
    pub fn reduce_many<S: AsRef<str>>(
        &self,
        names: &[S],
        polygons: &PolygonCollection,
        unique_field: &str,
    ) -> Result<Vec<RegionReport>> {
        let requests = names
            .iter()
            .map(|name| {
                let kind = ReducerKind::from_name(name.as_ref())?;
                let request = ReduceRequest::from_kind(kind, &self.config.source)?;
                check_time_axis(&request.windows, self.dataset.times().len())?;
                Ok(request)
            })
            .collect::<Result<Vec<_>>>()?;

        let prepared = self.prepare(polygons, unique_field)?;
        requests
            .iter()
            .map(|request| self.reduce_prepared(request, &prepared))
            .collect()
    }

    /// Resolve every polygon to a crop window and weight grid.
    pub fn prepare(
        &self,
        polygons: &PolygonCollection,
        unique_field: &str,
    ) -> Result<PreparedRegions> {
        let ids = polygons.identifiers(unique_field)?;

        let (lat_lo, lat_hi) = self.dataset.lat().envelope();
        let (lon_lo, lon_hi) = self.dataset.lon().envelope();
        let grid_extent = BoundingBox::new(lon_lo, lat_lo, lon_hi, lat_hi);

        let mut jobs = Vec::with_capacity(ids.len());
        let mut crops = Vec::with_capacity(ids.len());
        let mut out_of_domain = Vec::new();

        for (id, record) in ids.into_iter().zip(polygons.iter()) {
            let rect = validate_geometry(&record.geometry).map_err(|source| {
                ReducerError::Geometry {
                    polygon: id.clone(),
                    source,
                }
            })?;

            let bbox = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
            let crop = if grid_extent.intersects(&bbox) {
                self.dataset.cell_window(&bbox)
            } else {
                Err(GridError::OutOfDomain {
                    bottom: bbox.min_lat,
                    top: bbox.max_lat,
                    left: bbox.min_lon,
                    right: bbox.max_lon,
                })
            };

            match crop {
                Ok(crop) => {
                    let (crop_lat, crop_lon) = self.dataset.crop_axes(&crop);
                    debug!(
                        polygon = %id,
                        rows = crop.lat.len(),
                        cols = crop.lon.len(),
                        "Polygon cropped"
                    );
                    jobs.push(WeightJob {
                        id: id.clone(),
                        geometry: &record.geometry,
                        lat: crop_lat,
                        lon: crop_lon,
                    });
                    crops.push((id, crop));
                }
                Err(GridError::OutOfDomain { .. }) => {
                    warn!(polygon = %id, bbox = %bbox, "Polygon outside grid domain");
                    out_of_domain.push(id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let computer = ParallelWeightComputer::new(self.config.workers, self.provider);
        let mut weights: HashMap<String, WeightGrid> = computer.compute_many(jobs)?;

        let regions = crops
            .into_iter()
            .filter_map(|(id, crop)| {
                weights
                    .remove(&id)
                    .map(|weights| PreparedRegion { id, crop, weights })
            })
            .collect();

        Ok(PreparedRegions {
            regions,
            out_of_domain,
        })
    }

    /// Evaluate one request over already prepared regions.
    pub fn reduce_prepared(
        &self,
        request: &ReduceRequest,
        prepared: &PreparedRegions,
    ) -> Result<RegionReport> {
        let times = self.dataset.times();
        check_time_axis(&request.windows, times.len())?;

        info!(
            parameter = %request.parameter,
            policy = ?request.policy,
            windows = request.windows.len(),
            polygons = prepared.regions.len(),
            out_of_domain = prepared.out_of_domain.len(),
            "Reducing parameter"
        );

        let labels = request
            .windows
            .iter()
            .map(|w| w.time_label(times))
            .collect::<Result<Vec<_>>>()?;

        let clamp = self.config.clamp_negative_accumulation;
        let mut r_data = BTreeMap::new();

        for region in &prepared.regions {
            let cube = request.parameter.derive(self.dataset, &region.crop)?;
            let mut series = Series::default();

            for (window, label) in request.windows.iter().zip(&labels) {
                let field = request.policy.window_field(cube.view(), window, clamp);

                if request.policy == TemporalPolicy::AccumulatedDifference {
                    let negative = negative_cells(&field, &region.weights);
                    if negative > 0 {
                        warn!(
                            polygon = %region.id,
                            window = window.index,
                            cells = negative,
                            "Negative accumulation in window"
                        );
                    }
                }

                let value = request.policy.reduce_field(&field, &region.weights)?;
                series.push(label.clone(), value.map(round2));
            }

            debug!(polygon = %region.id, values = series.len(), "Region reduced");
            r_data.insert(region.id.clone(), series);
        }

        for id in &prepared.out_of_domain {
            r_data.insert(id.clone(), Series::default());
        }

        let init = self.fcst_init.unwrap_or_else(|| self.dataset.init_time());

        info!(parameter = %request.parameter, regions = r_data.len(), "Reduction complete");

        Ok(RegionReport {
            fcst_init: format_iso(&init),
            chart_type: request.chart_type,
            value_type: request.value_type,
            t_reduced: request.t_reduced,
            parameter_name: request.parameter_name.clone(),
            unit: request.unit.clone(),
            r_data,
            out_of_domain: prepared.out_of_domain.clone(),
        })
    }
}

fn negative_cells(field: &Array2<f64>, weights: &WeightGrid) -> usize {
    let mut count = 0;
    Zip::from(field).and(weights.mask()).for_each(|&v, &masked| {
        if !masked && v < 0.0 {
            count += 1;
        }
    });
    count
}
