//! In-memory gridded forecast dataset.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use forecast_common::{format_iso, BoundingBox};
use serde::Serialize;
use tracing::debug;

use crate::axis::Axis;
use crate::error::{GridError, GridResult};
use crate::variable::GridVariable;

/// Contiguous lat/lon index ranges produced by bounding-box resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropWindow {
    pub lat: Range<usize>,
    pub lon: Range<usize>,
}

impl CropWindow {
    /// `(lat, lon)` shape of the cropped slice.
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }
}

/// A read-only forecast grid: two coordinate axes, a time axis and named
/// (time, lat, lon) variables.
#[derive(Debug, Clone)]
pub struct GridDataset {
    lat: Axis,
    lon: Axis,
    times: Vec<DateTime<Utc>>,
    variables: BTreeMap<String, GridVariable>,
    source: Option<PathBuf>,
}

impl GridDataset {
    /// Load a dataset from a NetCDF file.
    pub fn load(path: impl AsRef<Path>) -> GridResult<Self> {
        crate::native::read_dataset(path.as_ref())
    }

    /// Start building a dataset from arrays already in memory.
    pub fn builder(lat: Vec<f64>, lon: Vec<f64>, times: Vec<DateTime<Utc>>) -> GridDatasetBuilder {
        GridDatasetBuilder {
            lat,
            lon,
            times,
            variables: Vec::new(),
            source: None,
        }
    }

    pub fn lat(&self) -> &Axis {
        &self.lat
    }

    pub fn lon(&self) -> &Axis {
        &self.lon
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> GridResult<&GridVariable> {
        self.variables
            .get(name)
            .ok_or_else(|| GridError::UnknownVariable(name.to_string()))
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// First valid time: the forecast initialization.
    pub fn init_time(&self) -> DateTime<Utc> {
        self.times[0]
    }

    /// Extent of the sample coordinates.
    pub fn envelope(&self) -> BoundingBox {
        let (min_lat, max_lat) = self.lat.range();
        let (min_lon, max_lon) = self.lon.range();
        BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
    }

    /// Resolve an inclusive lat/lon box to index ranges on both axes.
    ///
    /// Fails with [`GridError::OutOfDomain`] when either axis has no sample in
    /// range. Ranges are never clamped to the nearest sample.
    pub fn bounding_box_indices(
        &self,
        bottom_lat: f64,
        top_lat: f64,
        left_lon: f64,
        right_lon: f64,
    ) -> GridResult<CropWindow> {
        let out_of_domain = || GridError::OutOfDomain {
            bottom: bottom_lat,
            top: top_lat,
            left: left_lon,
            right: right_lon,
        };

        let lat = self
            .lat
            .indices_within(bottom_lat, top_lat)
            .ok_or_else(out_of_domain)?;
        let lon = self
            .lon
            .indices_within(left_lon, right_lon)
            .ok_or_else(out_of_domain)?;

        debug!(
            lat_start = lat.start,
            lat_end = lat.end,
            lon_start = lon.start,
            lon_end = lon.end,
            "Resolved bounding box indices"
        );

        Ok(CropWindow { lat, lon })
    }

    /// Same as [`bounding_box_indices`](Self::bounding_box_indices) for a
    /// [`BoundingBox`].
    pub fn crop_window(&self, bbox: &BoundingBox) -> GridResult<CropWindow> {
        self.bounding_box_indices(bbox.min_lat, bbox.max_lat, bbox.min_lon, bbox.max_lon)
    }

    /// Index ranges of every cell whose extent overlaps `bbox`.
    ///
    /// Unlike [`crop_window`](Self::crop_window) this follows cell edges, so a
    /// box inside a single wide cell still resolves to that cell. Fails with
    /// [`GridError::OutOfDomain`] when no cell overlaps on either axis.
    pub fn cell_window(&self, bbox: &BoundingBox) -> GridResult<CropWindow> {
        let out_of_domain = || GridError::OutOfDomain {
            bottom: bbox.min_lat,
            top: bbox.max_lat,
            left: bbox.min_lon,
            right: bbox.max_lon,
        };

        let lat = self
            .lat
            .indices_overlapping(bbox.min_lat, bbox.max_lat)
            .ok_or_else(out_of_domain)?;
        let lon = self
            .lon
            .indices_overlapping(bbox.min_lon, bbox.max_lon)
            .ok_or_else(out_of_domain)?;

        Ok(CropWindow { lat, lon })
    }

    /// Cropped `(lat, lon)` axes for a window.
    pub fn crop_axes(&self, window: &CropWindow) -> (Axis, Axis) {
        (
            self.lat.slice(window.lat.clone()),
            self.lon.slice(window.lon.clone()),
        )
    }

    /// Catalogue entry describing the dataset.
    pub fn summary(&self) -> DatasetSummary {
        let envelope = self.envelope();
        DatasetSummary {
            source: self.source.as_ref().map(|p| p.display().to_string()),
            variables: self
                .variables
                .values()
                .map(|v| VariableSummary {
                    name: v.name.clone(),
                    long_name: v.long_name.clone(),
                    units: v.units.clone(),
                })
                .collect(),
            lat_bounds: [envelope.min_lat, envelope.max_lat],
            lon_bounds: [envelope.min_lon, envelope.max_lon],
            init_time: format_iso(&self.init_time()),
            steps: self.times.len(),
        }
    }
}

/// Builder for [`GridDataset`] from in-memory arrays.
#[derive(Debug)]
pub struct GridDatasetBuilder {
    lat: Vec<f64>,
    lon: Vec<f64>,
    times: Vec<DateTime<Utc>>,
    variables: Vec<GridVariable>,
    source: Option<PathBuf>,
}

impl GridDatasetBuilder {
    pub fn variable(mut self, variable: GridVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Validate axes and variable shapes.
    pub fn build(self) -> GridResult<GridDataset> {
        let lat = Axis::new("latitude", self.lat)?;
        let lon = Axis::new("longitude", self.lon)?;

        if self.times.is_empty() {
            return Err(GridError::invalid_axis("time", "no time steps"));
        }
        if !self.times.windows(2).all(|w| w[1] > w[0]) {
            return Err(GridError::invalid_axis("time", "not strictly increasing"));
        }

        let expected = (self.times.len(), lat.len(), lon.len());
        let mut variables = BTreeMap::new();
        for var in self.variables {
            if var.shape() != expected {
                return Err(GridError::InvalidFormat(format!(
                    "variable '{}' has shape {:?}, expected (time, lat, lon) = {:?}",
                    var.name,
                    var.shape(),
                    expected
                )));
            }
            variables.insert(var.name.clone(), var);
        }

        Ok(GridDataset {
            lat,
            lon,
            times: self.times,
            variables,
            source: self.source,
        })
    }
}

/// Summary of a loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub variables: Vec<VariableSummary>,
    pub lat_bounds: [f64; 2],
    pub lon_bounds: [f64; 2],
    pub init_time: String,
    pub steps: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSummary {
    pub name: String,
    pub long_name: Option<String>,
    pub units: Option<String>,
}
