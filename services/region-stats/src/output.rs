//! JSON documents written to stdout.

use std::collections::BTreeMap;

use forecast_grid::{DatasetSummary, GridDataset};
use region_reducer::stats::round2;
use region_reducer::{
    BoxFields, ChartType, PolygonCollection, ReducerKind, RegionReport, TimeLabel, TimeReduction,
    ValueType,
};
use serde::Serialize;

/// One entry of `--list-reducers`.
#[derive(Debug, Clone, Serialize)]
pub struct ReducerEntry {
    pub name: &'static str,
    pub parameter_name: &'static str,
    pub unit: &'static str,
    pub chart_type: ChartType,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(rename = "t-reduced")]
    pub t_reduced: TimeReduction,
    pub description: &'static str,
}

/// The registered reducers, in registry order.
pub fn reducer_catalog() -> Vec<ReducerEntry> {
    ReducerKind::ALL
        .iter()
        .map(|kind| {
            let spec = kind.spec();
            ReducerEntry {
                name: kind.name(),
                parameter_name: spec.parameter_name,
                unit: spec.unit(),
                chart_type: spec.chart_type,
                value_type: spec.value_type,
                t_reduced: spec.t_reduced,
                description: spec.description,
            }
        })
        .collect()
}

/// Output of `--inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub dataset: DatasetSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_fields: Option<Vec<String>>,
}

impl Inspection {
    pub fn new(dataset: &GridDataset, polygons: Option<&PolygonCollection>) -> Self {
        Self {
            dataset: dataset.summary(),
            unique_fields: polygons.map(PolygonCollection::unique_fields),
        }
    }
}

/// Reports keyed by reducer name.
pub fn reports_by_name(reports: Vec<RegionReport>, names: &[String]) -> BTreeMap<String, RegionReport> {
    names.iter().cloned().zip(reports).collect()
}

/// Output of `--bbox`: per-window fields over the box, missing cells as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDocument {
    pub parameter_name: String,
    pub unit: String,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_range: Option<[f64; 2]>,
    pub frames: Vec<FrameDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameDocument {
    pub label: String,
    pub time: TimeLabel,
    /// Row-major `[lat][lon]` values.
    pub values: Vec<Vec<Option<f64>>>,
}

impl From<&BoxFields> for FieldDocument {
    fn from(fields: &BoxFields) -> Self {
        Self {
            parameter_name: fields.parameter_name.clone(),
            unit: fields.unit.clone(),
            lat: fields.lat.clone(),
            lon: fields.lon.clone(),
            value_range: fields.value_range().map(|(lo, hi)| [round2(lo), round2(hi)]),
            frames: fields
                .frames
                .iter()
                .map(|frame| FrameDocument {
                    label: frame.label.clone(),
                    time: frame.time.clone(),
                    values: frame
                        .data
                        .rows()
                        .into_iter()
                        .map(|row| {
                            row.iter()
                                .map(|&v| v.is_finite().then(|| round2(v)))
                                .collect()
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
