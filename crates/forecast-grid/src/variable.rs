//! Named 3-D forecast variables.

use ndarray::{s, Array3, ArrayView3};

use crate::dataset::CropWindow;
use crate::error::{GridError, GridResult};

/// A (time, lat, lon) variable. Missing data is stored as `NaN`.
#[derive(Debug, Clone)]
pub struct GridVariable {
    pub name: String,
    pub units: Option<String>,
    pub long_name: Option<String>,
    pub data: Array3<f64>,
}

impl GridVariable {
    pub fn new(name: impl Into<String>, data: Array3<f64>) -> Self {
        Self {
            name: name.into(),
            units: None,
            long_name: None,
            data,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = Some(long_name.into());
        self
    }

    /// `(time, lat, lon)` shape.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Check declared units against accepted spellings.
    ///
    /// Variables without a `units` attribute pass: many exports omit it and
    /// the collaborator contract fixes the unit per variable name.
    pub fn expect_units(&self, accepted: &[&str]) -> GridResult<()> {
        match &self.units {
            Some(units) if !accepted.iter().any(|a| a.eq_ignore_ascii_case(units.trim())) => {
                Err(GridError::UnitMismatch {
                    variable: self.name.clone(),
                    expected: accepted.iter().map(|s| s.to_string()).collect(),
                    found: units.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// All time steps over a crop window.
    pub fn crop(&self, window: &CropWindow) -> ArrayView3<'_, f64> {
        self.data
            .slice(s![.., window.lat.clone(), window.lon.clone()])
    }
}
