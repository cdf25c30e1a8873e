//! Polygon-weighted regional statistics over gridded forecasts.
//!
//! This crate turns a [`forecast_grid::GridDataset`] and a collection of
//! administrative polygons into per-region time series:
//!
//! - **Weights**: fractional cell coverage by recursive subdivision
//! - **Windows**: daily, per-step and instant slices of the time axis
//! - **Reduction**: weighted averages or masked extremes per window
//!
//! # Architecture
//!
//! ```text
//! PolygonCollection + unique field
//!      │
//!      ▼
//! RegionalReducer::prepare
//!      │
//!      ├─► Resolve ids (UnknownUniqueField)
//!      │
//!      ├─► Crop window per polygon bbox
//!      │         │
//!      │         └─► Miss: listed as out_of_domain
//!      │
//!      └─► ParallelWeightComputer (rayon pool)
//!               │
//!               ▼
//!          WeightGrid per polygon
//!               │
//!               ▼
//! RegionalReducer::reduce_prepared
//!      │
//!      ├─► Parameter::derive on the crop (unit conversion)
//!      │
//!      ├─► TemporalPolicy::window_field per window
//!      │
//!      └─► TemporalPolicy::reduce_field → RegionReport
//! ```
//!
//! # Example
//!
//! ```ignore
//! use forecast_grid::GridDataset;
//! use region_reducer::{PolygonCollection, ReducerConfig, RegionalReducer};
//!
//! let ds = GridDataset::load("/data/hres/20240307_00.nc")?;
//! let reducer = RegionalReducer::new(&ds, ReducerConfig::default())?;
//! let report = reducer.reduce("rainfall_daily", &districts, "ADM2_EN")?;
//! println!("{}", serde_json::to_string(&report)?);
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod parallel;
pub mod parameters;
pub mod polygon;
pub mod reducer;
pub mod registry;
pub mod report;
pub mod stats;
pub mod weights;
pub mod windows;

// Re-export commonly used types at crate root
pub use config::{ForecastSource, ReducerConfig, SourceRegistry, MAX_SUBDIVISION_DEPTH};
pub use error::{ReducerError, Result};
pub use field::{box_fields, BoxFields, BoxFrame};
pub use parallel::{ParallelWeightComputer, WeightJob};
pub use parameters::Parameter;
pub use polygon::{AttributeValue, PolygonCollection, PolygonRecord};
pub use reducer::{PreparedRegion, PreparedRegions, ReduceRequest, RegionalReducer};
pub use registry::{
    ChartType, ReducerKind, ReducerSpec, TemporalPolicy, TimeReduction, ValueType, Windowing,
};
pub use report::{RegionReport, Series, TimeLabel};
pub use weights::{GeometryError, WeightGrid, WeightMaskProvider};
pub use windows::{
    check_time_axis, daily_windows, explicit_windows, instant_steps, step_windows, Window,
};
