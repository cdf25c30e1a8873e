//! End-to-end tests of the `region-stats` binary.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

fn region_stats() -> Command {
    Command::new(env!("CARGO_BIN_EXE_region-stats"))
}

/// 3 six-hourly steps at 300.15 K on a 3x2 grid, latitude north to south.
fn write_forecast(path: &Path) -> Result<(), netcdf::Error> {
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
        var.put_values(&[8.0, 7.0, 6.0], ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("longitude", &["longitude"])?;
        var.put_values(&[80.0, 81.0], ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("t2m", &["time", "latitude", "longitude"])?;
        var.put_attribute("units", "K")?;
        var.put_values(&[300.15; 18], ..)?;
    }

    Ok(())
}

const DISTRICTS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"district": "Puttalam", "code": 61},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[79.5, 6.5], [80.5, 6.5], [80.5, 8.5], [79.5, 8.5], [79.5, 6.5]]]
            }
        },
        {
            "type": "Feature",
            "properties": {"district": "Maldives", "code": 99},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[73.0, 3.0], [74.0, 3.0], [74.0, 4.0], [73.0, 4.0], [73.0, 3.0]]]
            }
        }
    ]
}"#;

const SOURCES: &str = "sources:\n  - name: SHORT\n    lead_days: 1\n    steps_per_day: 2\n";

#[test]
fn test_list_reducers() {
    let output = region_stats().arg("--list-reducers").output().unwrap();
    assert!(output.status.success());

    let catalog: Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = catalog
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"rainfall_daily"));
    assert!(names.contains(&"relative_humidity_daily"));
}

#[test]
fn test_reduce_temperature() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("forecast.nc");
    let polygons = dir.path().join("districts.geojson");
    let sources = dir.path().join("sources.yaml");
    write_forecast(&dataset).unwrap();
    std::fs::write(&polygons, DISTRICTS).unwrap();
    std::fs::write(&sources, SOURCES).unwrap();

    let output = region_stats()
        .arg("--dataset")
        .arg(&dataset)
        .arg("--polygons")
        .arg(&polygons)
        .args(["--reducer", "tmax_daily", "--reducer", "temperature_step"])
        .args(["--unique-field", "district"])
        .args(["--source", "SHORT"])
        .arg("--sources-config")
        .arg(&sources)
        .args(["--fcst-init", "20240307_00", "--workers", "2"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let reports: Value = serde_json::from_slice(&output.stdout).unwrap();

    let tmax = &reports["tmax_daily"];
    assert_eq!(tmax["fcst_init"], "2024-03-07T00:00:00Z");
    assert_eq!(tmax["unit"], "degC");
    assert_eq!(tmax["r_data"]["Puttalam"]["value"][0], 27.0);
    assert_eq!(tmax["r_data"]["Puttalam"]["time"][0][1], "2024-03-07T12:00:00Z");
    assert_eq!(tmax["out_of_domain"][0], "Maldives");
    assert_eq!(tmax["r_data"]["Maldives"]["value"].as_array().unwrap().len(), 0);

    let steps = &reports["temperature_step"];
    assert_eq!(steps["t-reduced"], "step");
    assert_eq!(steps["r_data"]["Puttalam"]["value"].as_array().unwrap().len(), 3);
    assert_eq!(steps["r_data"]["Puttalam"]["time"][2], "2024-03-07T12:00:00Z");
}

#[test]
fn test_inspect_lists_unique_fields() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("forecast.nc");
    let polygons = dir.path().join("districts.geojson");
    write_forecast(&dataset).unwrap();
    std::fs::write(&polygons, DISTRICTS).unwrap();

    let output = region_stats()
        .arg("--dataset")
        .arg(&dataset)
        .arg("--polygons")
        .arg(&polygons)
        .arg("--inspect")
        .output()
        .unwrap();
    assert!(output.status.success());

    let inspection: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(inspection["dataset"]["steps"], 3);
    assert_eq!(inspection["dataset"]["variables"][0]["name"], "t2m");
    assert_eq!(inspection["unique_fields"][0], "code");
    assert_eq!(inspection["unique_fields"][1], "district");
}

#[test]
fn test_box_fields() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("forecast.nc");
    let sources = dir.path().join("sources.yaml");
    write_forecast(&dataset).unwrap();
    std::fs::write(&sources, SOURCES).unwrap();

    let output = region_stats()
        .arg("--dataset")
        .arg(&dataset)
        .args(["--bbox", "79.5,6.5,80.5,8.5", "--reducer", "temperature_step"])
        .args(["--source", "SHORT"])
        .arg("--sources-config")
        .arg(&sources)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let documents: Value = serde_json::from_slice(&output.stdout).unwrap();
    let fields = &documents["temperature_step"];
    assert_eq!(fields["lat"], serde_json::json!([8.0, 7.0]));
    assert_eq!(fields["lon"], serde_json::json!([80.0]));
    assert_eq!(fields["frames"].as_array().unwrap().len(), 3);
    assert_eq!(fields["frames"][0]["label"], "07-Mar");
    assert_eq!(fields["frames"][2]["values"], serde_json::json!([[27.0], [27.0]]));
}

#[test]
fn test_unknown_reducer_fails() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("forecast.nc");
    let polygons = dir.path().join("districts.geojson");
    write_forecast(&dataset).unwrap();
    std::fs::write(&polygons, DISTRICTS).unwrap();

    let output = region_stats()
        .arg("--dataset")
        .arg(&dataset)
        .arg("--polygons")
        .arg(&polygons)
        .args(["--reducer", "snowfall_daily", "--unique-field", "district"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("UNKNOWN_PARAMETER"));
}

#[test]
fn test_missing_dataset_reports_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.nc");

    let output = region_stats()
        .arg("--dataset")
        .arg(&missing)
        .arg("--inspect")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SOURCE_UNAVAILABLE"), "stderr: {}", stderr);
}
