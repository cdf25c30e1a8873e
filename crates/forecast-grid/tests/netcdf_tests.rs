//! Tests for reading forecast NetCDF files.

use chrono::{TimeZone, Utc};
use forecast_grid::{AxisDirection, GridDataset, GridError};
use test_utils::assert_approx_eq;

/// Write a small CF-style forecast file: 3 steps, 3 lat (north to south), 2 lon.
fn write_sample(path: &std::path::Path) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;

    file.add_dimension("time", 3)?;
    file.add_dimension("latitude", 3)?;
    file.add_dimension("longitude", 2)?;

    {
        let mut var = file.add_variable::<f64>("time", &["time"])?;
        var.put_attribute("units", "hours since 2024-03-07 00:00:00")?;
        var.put_values(&[0.0, 6.0, 12.0], ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("latitude", &["latitude"])?;
        var.put_attribute("units", "degrees_north")?;
        var.put_values(&[8.0, 7.0, 6.0], ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("longitude", &["longitude"])?;
        var.put_attribute("units", "degrees_east")?;
        var.put_values(&[80.0, 81.0], ..)?;
    }
    {
        let mut var = file.add_variable::<f32>("t2m", &["time", "latitude", "longitude"])?;
        var.put_attribute("units", "K")?;
        var.put_attribute("long_name", "2 metre temperature")?;
        var.put_attribute("missing_value", -9999.0f32)?;
        let mut values = vec![300.0f32; 18];
        values[0] = -9999.0;
        var.put_values(&values, ..)?;
    }
    {
        let mut var = file.add_variable::<i16>("lsp", &["time", "latitude", "longitude"])?;
        var.put_attribute("units", "m")?;
        var.put_attribute("scale_factor", 0.0001f64)?;
        var.put_attribute("add_offset", 0.0f64)?;
        let values: Vec<i16> = (0..18).map(|i| i as i16 * 10).collect();
        var.put_values(&values, ..)?;
    }
    {
        // Static field: must be skipped by the loader
        let mut var = file.add_variable::<f32>("lsm", &["latitude", "longitude"])?;
        var.put_values(&[1.0f32; 6], ..)?;
    }

    Ok(())
}

#[test]
fn test_load_cf_forecast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forecast.nc");
    write_sample(&path).unwrap();

    let ds = GridDataset::load(&path).unwrap();

    assert_eq!(ds.lat().values(), &[8.0, 7.0, 6.0]);
    assert_eq!(ds.lat().direction(), AxisDirection::Descending);
    assert_eq!(ds.lon().values(), &[80.0, 81.0]);
    assert_eq!(ds.times().len(), 3);
    assert_eq!(
        ds.init_time(),
        Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap()
    );
    assert_eq!(
        ds.times()[2],
        Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap()
    );

    let names: Vec<&str> = ds.variable_names().collect();
    assert_eq!(names, vec!["lsp", "t2m"]);

    let t2m = ds.variable("t2m").unwrap();
    assert_eq!(t2m.units.as_deref(), Some("K"));
    assert_eq!(t2m.long_name.as_deref(), Some("2 metre temperature"));
    assert!(t2m.data[[0, 0, 0]].is_nan());
    assert_approx_eq!(t2m.data[[0, 0, 1]], 300.0, 1e-4);

    let lsp = ds.variable("lsp").unwrap();
    // index 5 -> raw 50 -> 0.005 m
    assert_approx_eq!(lsp.data[[0, 2, 1]], 0.005, 1e-9);
    assert_approx_eq!(lsp.data[[2, 2, 1]], 0.017, 1e-9);

    assert!(!ds.has_variable("lsm"));
}

#[test]
fn test_summary_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forecast.nc");
    write_sample(&path).unwrap();

    let summary = GridDataset::load(&path).unwrap().summary();
    assert_eq!(summary.lat_bounds, [6.0, 8.0]);
    assert_eq!(summary.lon_bounds, [80.0, 81.0]);
    assert_eq!(summary.init_time, "2024-03-07T00:00:00Z");
    assert_eq!(summary.steps, 3);
    assert!(summary.source.is_some());
}

#[test]
fn test_missing_file_is_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let result = GridDataset::load(dir.path().join("does-not-exist.nc"));
    assert!(matches!(result, Err(GridError::SourceUnavailable { .. })));
}
