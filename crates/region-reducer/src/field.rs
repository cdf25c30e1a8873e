//! Per-window 2-D fields over a lat/lon box, for map and animation frames.
//!
//! Same derivation and temporal policy as the regional reducer, without the
//! spatial reduction.

use forecast_common::BoundingBox;
use forecast_grid::GridDataset;
use ndarray::Array2;
use tracing::info;

use crate::error::Result;
use crate::reducer::ReduceRequest;
use crate::report::TimeLabel;
use crate::windows::check_time_axis;

/// One rendered window.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxFrame {
    /// `%d-%b` label of the window start.
    pub label: String,
    pub time: TimeLabel,
    /// `(lat, lon)` field, `NaN` where the source is missing.
    pub data: Array2<f64>,
}

/// Fields of every window over the cropped box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxFields {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub frames: Vec<BoxFrame>,
    pub parameter_name: String,
    pub unit: String,
}

impl BoxFields {
    /// Minimum and maximum finite value across all frames, for a shared
    /// colour scale.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.frames
            .iter()
            .flat_map(|f| f.data.iter().copied())
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Evaluate `request` over `bbox` without spatial reduction.
pub fn box_fields(
    dataset: &GridDataset,
    request: &ReduceRequest,
    bbox: &BoundingBox,
    clamp_negative: bool,
) -> Result<BoxFields> {
    let times = dataset.times();
    check_time_axis(&request.windows, times.len())?;

    let crop = dataset.crop_window(bbox)?;
    let (lat, lon) = dataset.crop_axes(&crop);
    let cube = request.parameter.derive(dataset, &crop)?;

    info!(
        parameter = %request.parameter,
        bbox = %bbox,
        rows = lat.len(),
        cols = lon.len(),
        frames = request.windows.len(),
        "Building box fields"
    );

    let frames = request
        .windows
        .iter()
        .map(|window| {
            Ok(BoxFrame {
                label: window.day_label(times)?,
                time: window.time_label(times)?,
                data: request.policy.window_field(cube.view(), window, clamp_negative),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BoxFields {
        lat: lat.values().to_vec(),
        lon: lon.values().to_vec(),
        frames,
        parameter_name: request.parameter_name.clone(),
        unit: request.unit.clone(),
    })
}
