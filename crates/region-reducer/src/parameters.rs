//! Physical parameters and their derivation from source variables.
//!
//! Source variables come in model units (kelvin, metres, m/s); every
//! parameter is converted to its reporting unit on the cropped window only.

use forecast_grid::{CropWindow, GridDataset};
use ndarray::{Array3, Zip};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Magnus coefficient `a` for saturation vapour pressure over water.
pub const MAGNUS_A: f64 = 17.625;
/// Magnus coefficient `b` (degC).
pub const MAGNUS_B: f64 = 243.04;

const KELVIN: &[&str] = &["K", "kelvin", "degK"];
const METRES: &[&str] = &["m", "metres", "meters", "m of water equivalent"];
const METRES_PER_SECOND: &[&str] = &["m s**-1", "m s-1", "m/s"];

pub fn kelvin_to_celsius(k: f64) -> f64 {
    k - 273.15
}

pub fn metres_to_millimetres(m: f64) -> f64 {
    m * 1000.0
}

/// Wind speed in km/h from u/v components in m/s.
pub fn wind_speed_kmh(u: f64, v: f64) -> f64 {
    (u * u + v * v).sqrt() * 3.6
}

/// Relative humidity (%) from temperature and dewpoint in degC
/// (August-Roche-Magnus).
pub fn relative_humidity(t: f64, td: f64) -> f64 {
    100.0 * (MAGNUS_A * td / (MAGNUS_B + td)).exp() / (MAGNUS_A * t / (MAGNUS_B + t)).exp()
}

/// A reportable physical parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// Total precipitation `lsp + cp`, mm.
    Rainfall,
    /// 2 m temperature, degC.
    Temperature,
    /// 10 m wind speed, km/h.
    WindSpeed,
    /// 2 m relative humidity, %.
    RelativeHumidity,
}

impl Parameter {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rainfall => "rainfall",
            Self::Temperature => "temperature",
            Self::WindSpeed => "wind_speed",
            Self::RelativeHumidity => "relative_humidity",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Rainfall => "mm",
            Self::Temperature => "degC",
            Self::WindSpeed => "km/h",
            Self::RelativeHumidity => "%",
        }
    }

    /// Source variables read from the grid.
    pub fn source_variables(&self) -> &'static [&'static str] {
        match self {
            Self::Rainfall => &["lsp", "cp"],
            Self::Temperature => &["t2m"],
            Self::WindSpeed => &["u10", "v10"],
            Self::RelativeHumidity => &["t2m", "d2m"],
        }
    }

    /// Derived (time, lat, lon) cube over `window`, in reporting units.
    ///
    /// Missing source values propagate as `NaN`.
    pub fn derive(&self, dataset: &GridDataset, window: &CropWindow) -> Result<Array3<f64>> {
        let cube = match self {
            Self::Rainfall => {
                let lsp = dataset.variable("lsp")?;
                let cp = dataset.variable("cp")?;
                lsp.expect_units(METRES)?;
                cp.expect_units(METRES)?;
                Zip::from(lsp.crop(window))
                    .and(cp.crop(window))
                    .map_collect(|&l, &c| metres_to_millimetres(l + c))
            }
            Self::Temperature => {
                let t2m = dataset.variable("t2m")?;
                t2m.expect_units(KELVIN)?;
                t2m.crop(window).mapv(kelvin_to_celsius)
            }
            Self::WindSpeed => {
                let u10 = dataset.variable("u10")?;
                let v10 = dataset.variable("v10")?;
                u10.expect_units(METRES_PER_SECOND)?;
                v10.expect_units(METRES_PER_SECOND)?;
                Zip::from(u10.crop(window))
                    .and(v10.crop(window))
                    .map_collect(|&u, &v| wind_speed_kmh(u, v))
            }
            Self::RelativeHumidity => {
                let t2m = dataset.variable("t2m")?;
                let d2m = dataset.variable("d2m")?;
                t2m.expect_units(KELVIN)?;
                d2m.expect_units(KELVIN)?;
                Zip::from(t2m.crop(window))
                    .and(d2m.crop(window))
                    .map_collect(|&t, &td| {
                        relative_humidity(kelvin_to_celsius(t), kelvin_to_celsius(td))
                    })
            }
        };
        Ok(cube)
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
