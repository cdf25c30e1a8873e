//! The closed catalogue of reducers.
//!
//! Every reducer is a [`ReducerKind`] whose [`ReducerSpec`] fixes the
//! physical parameter, temporal policy, windowing and report metadata.

use std::fmt;
use std::str::FromStr;

use ndarray::{s, Array2, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::config::ForecastSource;
use crate::error::{ReducerError, Result};
use crate::parameters::Parameter;
use crate::stats;
use crate::weights::WeightGrid;
use crate::windows::{daily_windows, instant_steps, step_windows, Window};

/// How a window's time slices collapse into one 2-D field, and how that
/// field is reduced over a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemporalPolicy {
    /// `cube[end] - cube[start]`, or `cube[end]` for a window starting at
    /// initialization (the accumulator is zero there).
    AccumulatedDifference,
    /// Per-cell minimum over `start..=end`, then regional minimum.
    DailyMinimum,
    /// Per-cell maximum over `start..=end`, then regional maximum.
    DailyMaximum,
    /// Per-cell mean over `start..=end`, then weighted average.
    WindowAverage,
    /// `cube[end]`, then weighted average.
    InstantStep,
}

impl TemporalPolicy {
    /// Collapse the window's time slices into a single (lat, lon) field.
    pub fn window_field(
        &self,
        cube: ArrayView3<f64>,
        window: &Window,
        clamp_negative: bool,
    ) -> Array2<f64> {
        let span = cube.slice(s![window.start..=window.end, .., ..]);
        match self {
            Self::AccumulatedDifference if window.start == 0 => {
                cube.slice(s![window.end, .., ..]).to_owned()
            }
            Self::AccumulatedDifference => stats::difference(
                cube.slice(s![window.end, .., ..]),
                cube.slice(s![window.start, .., ..]),
                clamp_negative,
            ),
            Self::DailyMinimum => stats::nan_min_over_time(span),
            Self::DailyMaximum => stats::nan_max_over_time(span),
            Self::WindowAverage => stats::nan_mean_over_time(span),
            Self::InstantStep => cube.slice(s![window.end, .., ..]).to_owned(),
        }
    }

    /// Reduce a window field over the region described by `weights`.
    pub fn reduce_field(&self, field: &Array2<f64>, weights: &WeightGrid) -> Result<Option<f64>> {
        match self {
            Self::DailyMinimum => stats::masked_min(field.view(), weights),
            Self::DailyMaximum => stats::masked_max(field.view(), weights),
            Self::AccumulatedDifference | Self::WindowAverage | Self::InstantStep => {
                stats::weighted_average(field.view(), weights)
            }
        }
    }

    /// Default report metadata for ad hoc requests.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::AccumulatedDifference => ValueType::Accumulated,
            _ => ValueType::Instant,
        }
    }

    pub fn chart_type(&self) -> ChartType {
        match self {
            Self::AccumulatedDifference => ChartType::Column,
            _ => ChartType::Line,
        }
    }
}

/// How the windows of a registry entry are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Windowing {
    Daily,
    Step,
    Instant,
}

impl Windowing {
    pub fn windows(&self, source: &ForecastSource) -> Result<Vec<Window>> {
        match self {
            Self::Daily => daily_windows(source.lead_days, source.steps_per_day),
            Self::Step => step_windows(source.total_steps()?),
            Self::Instant => instant_steps(source.total_steps()?),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Column,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Accumulated,
    Instant,
}

/// Whether values describe a period or a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeReduction {
    Period,
    Step,
}

/// Static description of a registered reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReducerSpec {
    pub kind: ReducerKind,
    pub parameter: Parameter,
    pub policy: TemporalPolicy,
    pub windowing: Windowing,
    pub chart_type: ChartType,
    pub value_type: ValueType,
    pub t_reduced: TimeReduction,
    pub parameter_name: &'static str,
    pub description: &'static str,
}

impl ReducerSpec {
    pub fn unit(&self) -> &'static str {
        self.parameter.unit()
    }
}

/// Registered reducers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReducerKind {
    RainfallDaily,
    RainfallStep,
    TminDaily,
    TmaxDaily,
    TemperatureStep,
    WindSpeedDaily,
    RelativeHumidityDaily,
}

impl ReducerKind {
    pub const ALL: [ReducerKind; 7] = [
        Self::RainfallDaily,
        Self::RainfallStep,
        Self::TminDaily,
        Self::TmaxDaily,
        Self::TemperatureStep,
        Self::WindSpeedDaily,
        Self::RelativeHumidityDaily,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::RainfallDaily => "rainfall_daily",
            Self::RainfallStep => "rainfall_step",
            Self::TminDaily => "tmin_daily",
            Self::TmaxDaily => "tmax_daily",
            Self::TemperatureStep => "temperature_step",
            Self::WindSpeedDaily => "wind_speed_daily",
            Self::RelativeHumidityDaily => "relative_humidity_daily",
        }
    }

    /// Look up a reducer by its registered name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| ReducerError::UnknownParameter(name.to_string()))
    }

    pub fn spec(&self) -> ReducerSpec {
        use ChartType::*;
        use TemporalPolicy::*;

        let (parameter, policy, windowing, chart_type, value_type, t_reduced, parameter_name, description) =
            match self {
                Self::RainfallDaily => (
                    Parameter::Rainfall,
                    AccumulatedDifference,
                    Windowing::Daily,
                    Column,
                    ValueType::Accumulated,
                    TimeReduction::Period,
                    "Rainfall",
                    "Daily accumulated rainfall, weighted average over the region",
                ),
                Self::RainfallStep => (
                    Parameter::Rainfall,
                    AccumulatedDifference,
                    Windowing::Step,
                    Column,
                    ValueType::Accumulated,
                    TimeReduction::Period,
                    "Rainfall",
                    "Per-step accumulated rainfall, weighted average over the region",
                ),
                Self::TminDaily => (
                    Parameter::Temperature,
                    DailyMinimum,
                    Windowing::Daily,
                    Line,
                    ValueType::Instant,
                    TimeReduction::Period,
                    "Temperature Minimum (day)",
                    "Daily minimum temperature, minimum over the region",
                ),
                Self::TmaxDaily => (
                    Parameter::Temperature,
                    DailyMaximum,
                    Windowing::Daily,
                    Line,
                    ValueType::Instant,
                    TimeReduction::Period,
                    "Temperature Maximum (day)",
                    "Daily maximum temperature, maximum over the region",
                ),
                Self::TemperatureStep => (
                    Parameter::Temperature,
                    InstantStep,
                    Windowing::Instant,
                    Line,
                    ValueType::Instant,
                    TimeReduction::Step,
                    "Temperature",
                    "Temperature at every forecast step, weighted average over the region",
                ),
                Self::WindSpeedDaily => (
                    Parameter::WindSpeed,
                    WindowAverage,
                    Windowing::Daily,
                    Line,
                    ValueType::Instant,
                    TimeReduction::Period,
                    "Wind Speed Average (day)",
                    "Daily mean wind speed, weighted average over the region",
                ),
                Self::RelativeHumidityDaily => (
                    Parameter::RelativeHumidity,
                    WindowAverage,
                    Windowing::Daily,
                    Line,
                    ValueType::Instant,
                    TimeReduction::Period,
                    "Relative Humidity Average (day)",
                    "Daily mean relative humidity, weighted average over the region",
                ),
            };

        ReducerSpec {
            kind: *self,
            parameter,
            policy,
            windowing,
            chart_type,
            value_type,
            t_reduced,
            parameter_name,
            description,
        }
    }
}

impl FromStr for ReducerKind {
    type Err = ReducerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for ReducerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
