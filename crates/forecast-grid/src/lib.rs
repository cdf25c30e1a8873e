//! Gridded forecast datasets.
//!
//! A [`GridDataset`] holds latitude and longitude [`Axis`] values, a UTC time
//! axis and named (time, lat, lon) [`GridVariable`]s with missing data as
//! `NaN`. Datasets are read-only once built; share them by reference or `Arc`.
//!
//! # Loading
//!
//! ```ignore
//! use forecast_grid::GridDataset;
//!
//! let ds = GridDataset::load("/data/hres/20240307_00.nc")?;
//! let t2m = ds.variable("t2m")?;
//! let window = ds.bounding_box_indices(5.9, 9.9, 79.5, 81.9)?;
//! let cube = t2m.crop(&window);
//! ```

pub mod axis;
pub mod dataset;
pub mod error;
pub mod native;
pub mod variable;

pub use axis::{Axis, AxisDirection};
pub use dataset::{CropWindow, DatasetSummary, GridDataset, GridDatasetBuilder, VariableSummary};
pub use error::{GridError, GridResult};
pub use native::silence_hdf5_errors;
pub use variable::GridVariable;
