//! Native NetCDF reading using the netcdf library.
//!
//! Reads CF-style forecast exports: 1-D latitude, longitude and time
//! coordinate variables plus any number of (time, lat, lon) data variables.
//! Packed integers are unpacked with `scale_factor`/`add_offset`, and
//! `_FillValue`/`missing_value` samples become `NaN`.

use std::path::Path;
use std::sync::Once;

use chrono::{DateTime, Utc};
use forecast_common::CfTimeUnits;
use ndarray::Array3;
use netcdf::types::{FloatType, IntType, NcVariableType};
use tracing::{debug, info};

use crate::dataset::GridDataset;
use crate::error::{GridError, GridResult};
use crate::variable::GridVariable;

const LAT_NAMES: &[&str] = &["latitude", "lat"];
const LON_NAMES: &[&str] = &["longitude", "lon"];
const TIME_NAMES: &[&str] = &["time", "valid_time"];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints diagnostics even when the Rust side handles the
/// error, e.g. when probing for optional attributes. Safe to call repeatedly;
/// call it before the first NetCDF operation.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Read a forecast NetCDF file into a [`GridDataset`].
pub fn read_dataset(path: &Path) -> GridResult<GridDataset> {
    silence_hdf5_errors();

    let display = path.display().to_string();
    let file = netcdf::open(path).map_err(|e| GridError::source_unavailable(&display, e))?;

    let lat_var = find_variable(&file, LAT_NAMES)?;
    let lon_var = find_variable(&file, LON_NAMES)?;
    let time_var = find_variable(&file, TIME_NAMES)?;

    let lat_dim = single_dimension(&lat_var)?;
    let lon_dim = single_dimension(&lon_var)?;
    let time_dim = single_dimension(&time_var)?;

    let lat = read_values(&lat_var)?;
    let lon = read_values(&lon_var)?;
    let times = read_times(&time_var)?;

    let coordinate_names = [lat_var.name(), lon_var.name(), time_var.name()];
    let shape = (times.len(), lat.len(), lon.len());

    let mut builder = GridDataset::builder(lat, lon, times).source(path);
    let mut loaded = 0usize;

    for var in file.variables() {
        let name = var.name();
        if coordinate_names.contains(&name) {
            continue;
        }

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name().to_string()).collect();
        if dims != [time_dim.as_str(), lat_dim.as_str(), lon_dim.as_str()] {
            debug!(variable = %name, dims = ?dims, "Skipping variable not on (time, lat, lon)");
            continue;
        }
        if !is_numeric(&var) {
            debug!(variable = %name, "Skipping non-numeric variable");
            continue;
        }

        let values = read_values(&var)?;
        let data = Array3::from_shape_vec(shape, values).map_err(|e| {
            GridError::InvalidFormat(format!("Invalid shape/data size for {}: {}", name, e))
        })?;

        let mut variable = GridVariable::new(name.clone(), data);
        if let Some(units) = get_str_attr(&var, "units") {
            variable = variable.with_units(units);
        }
        if let Some(long_name) = get_str_attr(&var, "long_name") {
            variable = variable.with_long_name(long_name);
        }

        builder = builder.variable(variable);
        loaded += 1;
    }

    let dataset = builder.build()?;

    info!(
        path = %display,
        variables = loaded,
        steps = shape.0,
        lat = shape.1,
        lon = shape.2,
        "Loaded forecast dataset"
    );

    Ok(dataset)
}

fn find_variable<'f>(file: &'f netcdf::File, names: &[&str]) -> GridResult<netcdf::Variable<'f>> {
    names
        .iter()
        .find_map(|n| file.variable(n))
        .ok_or_else(|| {
            GridError::InvalidFormat(format!("Missing coordinate variable (one of {:?})", names))
        })
}

fn single_dimension(var: &netcdf::Variable) -> GridResult<String> {
    match var.dimensions() {
        [dim] => Ok(dim.name().to_string()),
        dims => Err(GridError::InvalidFormat(format!(
            "Coordinate variable '{}' must be 1-D, has {} dimensions",
            var.name(),
            dims.len()
        ))),
    }
}

fn read_times(var: &netcdf::Variable) -> GridResult<Vec<DateTime<Utc>>> {
    let units = get_str_attr(var, "units").ok_or_else(|| {
        GridError::InvalidFormat(format!("Time variable '{}' has no units", var.name()))
    })?;
    let units =
        CfTimeUnits::parse(&units).map_err(|e| GridError::InvalidFormat(e.to_string()))?;

    read_values(var)?
        .into_iter()
        .map(|v| {
            units
                .to_datetime(v)
                .ok_or_else(|| GridError::InvalidFormat(format!("Invalid time value {}", v)))
        })
        .collect()
}

fn is_numeric(var: &netcdf::Variable) -> bool {
    matches!(var.vartype(), NcVariableType::Float(_) | NcVariableType::Int(_))
}

/// Read all values as f64 with CF unpacking and missing-value masking.
fn read_values(var: &netcdf::Variable) -> GridResult<Vec<f64>> {
    let raw = read_raw(var)?;

    let fill_value = get_f64_attr(var, "_FillValue");
    let missing_value = get_f64_attr(var, "missing_value");
    let scale_factor = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);

    let is_missing = |v: f64| {
        v.is_nan() || Some(v) == fill_value || Some(v) == missing_value
    };

    Ok(raw
        .into_iter()
        .map(|v| {
            if is_missing(v) {
                f64::NAN
            } else {
                v * scale_factor + add_offset
            }
        })
        .collect())
}

fn read_raw(var: &netcdf::Variable) -> GridResult<Vec<f64>> {
    let vartype = var.vartype();
    let name = var.name();
    let read_err = |e: netcdf::Error| {
        GridError::InvalidFormat(format!("Failed to read {}: {}", name, e))
    };

    match vartype {
        NcVariableType::Float(FloatType::F64) => var.get_values::<f64, _>(..).map_err(read_err),
        NcVariableType::Float(FloatType::F32) => Ok(var
            .get_values::<f32, _>(..)
            .map_err(read_err)?
            .into_iter()
            .map(f64::from)
            .collect()),
        NcVariableType::Int(IntType::I64) => Ok(var
            .get_values::<i64, _>(..)
            .map_err(read_err)?
            .into_iter()
            .map(|x| x as f64)
            .collect()),
        NcVariableType::Int(IntType::I32) => Ok(var
            .get_values::<i32, _>(..)
            .map_err(read_err)?
            .into_iter()
            .map(f64::from)
            .collect()),
        NcVariableType::Int(IntType::I16) => Ok(var
            .get_values::<i16, _>(..)
            .map_err(read_err)?
            .into_iter()
            .map(f64::from)
            .collect()),
        NcVariableType::Int(IntType::I8) => Ok(var
            .get_values::<i8, _>(..)
            .map_err(read_err)?
            .into_iter()
            .map(f64::from)
            .collect()),
        NcVariableType::Int(IntType::U64) => Ok(var
            .get_values::<u64, _>(..)
            .map_err(read_err)?
            .into_iter()
            .map(|x| x as f64)
            .collect()),
        NcVariableType::Int(IntType::U32) => Ok(var
            .get_values::<u32, _>(..)
            .map_err(read_err)?
            .into_iter()
            .map(f64::from)
            .collect()),
        NcVariableType::Int(IntType::U16) => Ok(var
            .get_values::<u16, _>(..)
            .map_err(read_err)?
            .into_iter()
            .map(f64::from)
            .collect()),
        NcVariableType::Int(IntType::U8) => Ok(var
            .get_values::<u8, _>(..)
            .map_err(read_err)?
            .into_iter()
            .map(f64::from)
            .collect()),
        other => Err(GridError::InvalidFormat(format!(
            "Unsupported variable type for {}: {:?}",
            name, other
        ))),
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
