//! Report structures handed to rendering and serialization layers.
//!
//! Key names are part of the external contract:
//!
//! ```json
//! {
//!   "fcst_init": "2024-03-07T00:00:00Z",
//!   "chart_type": "column",
//!   "type": "accumulated",
//!   "t-reduced": "period",
//!   "parameter_name": "Rainfall",
//!   "unit": "mm",
//!   "r_data": {
//!     "colombo": {
//!       "time": [["2024-03-07T00:00:00Z", "2024-03-08T00:00:00Z"]],
//!       "value": [3.0]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::registry::{ChartType, TimeReduction, ValueType};

/// Label of one output value: a timestamp or a `[start, end]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeLabel {
    Instant(String),
    Period([String; 2]),
}

/// Time series of one region. `None` marks a window without valid cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub time: Vec<TimeLabel>,
    pub value: Vec<Option<f64>>,
}

impl Series {
    pub fn push(&mut self, time: TimeLabel, value: Option<f64>) {
        self.time.push(time);
        self.value.push(value);
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Regional statistics for one reducer over every polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionReport {
    pub fcst_init: String,
    pub chart_type: ChartType,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(rename = "t-reduced")]
    pub t_reduced: TimeReduction,
    pub parameter_name: String,
    pub unit: String,
    pub r_data: BTreeMap<String, Series>,
    /// Polygons whose bounding box misses the grid; they have empty series.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub out_of_domain: Vec<String>,
}

impl RegionReport {
    pub fn series(&self, id: &str) -> Option<&Series> {
        self.r_data.get(id)
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RegionReport {
        let mut series = Series::default();
        series.push(
            TimeLabel::Period([
                "2024-03-07T00:00:00Z".to_string(),
                "2024-03-08T00:00:00Z".to_string(),
            ]),
            Some(3.0),
        );
        series.push(TimeLabel::Instant("2024-03-08T06:00:00Z".to_string()), None);

        RegionReport {
            fcst_init: "2024-03-07T00:00:00Z".to_string(),
            chart_type: ChartType::Column,
            value_type: ValueType::Accumulated,
            t_reduced: TimeReduction::Period,
            parameter_name: "Rainfall".to_string(),
            unit: "mm".to_string(),
            r_data: BTreeMap::from([("colombo".to_string(), series)]),
            out_of_domain: Vec::new(),
        }
    }

    #[test]
    fn test_stable_key_names() {
        let json = report().to_json().unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "fcst_init",
            "chart_type",
            "type",
            "t-reduced",
            "parameter_name",
            "unit",
            "r_data",
        ] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
        assert!(!obj.contains_key("out_of_domain"));
        assert_eq!(json["type"], "accumulated");
        assert_eq!(json["t-reduced"], "period");
        assert_eq!(json["r_data"]["colombo"]["time"][0][1], "2024-03-08T00:00:00Z");
        assert_eq!(json["r_data"]["colombo"]["time"][1], "2024-03-08T06:00:00Z");
        assert_eq!(json["r_data"]["colombo"]["value"][0], 3.0);
        assert!(json["r_data"]["colombo"]["value"][1].is_null());
    }

    #[test]
    fn test_out_of_domain_listed_when_present() {
        let mut report = report();
        report.out_of_domain.push("atlantis".to_string());
        report.r_data.insert("atlantis".to_string(), Series::default());

        let json = report.to_json().unwrap();
        assert_eq!(json["out_of_domain"][0], "atlantis");

        let back: RegionReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
