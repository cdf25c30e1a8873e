//! GeoJSON polygon input.
//!
//! Only `Polygon` and `MultiPolygon` features are accepted. Feature
//! properties become polygon attributes; nested arrays and objects are
//! dropped since they cannot identify a region.

use std::path::Path;

use anyhow::{bail, Context, Result};
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use region_reducer::{AttributeValue, PolygonCollection, PolygonRecord};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// GeoJSON FeatureCollection.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    /// Always "FeatureCollection".
    #[serde(rename = "type")]
    pub collection_type: String,

    pub features: Vec<Feature>,
}

/// GeoJSON Feature.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    /// Always "Feature".
    #[serde(rename = "type")]
    pub feature_type: String,

    pub geometry: Option<Geometry>,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// GeoJSON geometry; positions are `[lon, lat(, z)]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    fn to_multi_polygon(&self) -> Result<MultiPolygon<f64>> {
        match self {
            Self::Polygon { coordinates } => Ok(MultiPolygon::new(vec![to_polygon(coordinates)?])),
            Self::MultiPolygon { coordinates } => Ok(MultiPolygon::new(
                coordinates
                    .iter()
                    .map(|rings| to_polygon(rings))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Self::Unsupported => bail!("geometry is not a Polygon or MultiPolygon"),
        }
    }
}

fn to_ring(positions: &[Vec<f64>]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => bail!("position with fewer than two coordinates"),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>> {
    let Some((exterior, interiors)) = rings.split_first() else {
        bail!("polygon without rings");
    };
    Ok(Polygon::new(
        to_ring(exterior)?,
        interiors.iter().map(|r| to_ring(r)).collect::<Result<Vec<_>>>()?,
    ))
}

fn to_attribute(value: &Value) -> Option<AttributeValue> {
    match value {
        Value::Null => Some(AttributeValue::Null),
        Value::Bool(b) => Some(AttributeValue::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(AttributeValue::Int)
            .or_else(|| n.as_f64().map(AttributeValue::Float)),
        Value::String(s) => Some(AttributeValue::String(s.clone())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

impl FeatureCollection {
    /// Convert every feature into a polygon record, in order.
    pub fn into_polygons(self) -> Result<PolygonCollection> {
        if self.collection_type != "FeatureCollection" {
            bail!("expected a FeatureCollection, got '{}'", self.collection_type);
        }

        self.features
            .into_iter()
            .enumerate()
            .map(|(i, feature)| {
                let geometry = feature
                    .geometry
                    .as_ref()
                    .with_context(|| format!("feature {} has no geometry", i))?
                    .to_multi_polygon()
                    .with_context(|| format!("feature {}", i))?;

                let mut record = PolygonRecord::new(geometry);
                for (key, value) in feature.properties.unwrap_or_default() {
                    match to_attribute(&value) {
                        Some(attr) => record = record.with_attribute(key, attr),
                        None => debug!(feature = i, property = %key, "Skipping nested property"),
                    }
                }
                Ok(record)
            })
            .collect()
    }
}

/// Parse a GeoJSON FeatureCollection string.
pub fn parse_polygons(json: &str) -> Result<PolygonCollection> {
    let collection: FeatureCollection =
        serde_json::from_str(json).context("Failed to parse GeoJSON FeatureCollection")?;
    collection.into_polygons()
}

/// Read polygons from a GeoJSON file.
pub fn load_polygons(path: &Path) -> Result<PolygonCollection> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read polygons: {}", path.display()))?;
    let polygons =
        parse_polygons(&content).with_context(|| format!("Invalid polygons: {}", path.display()))?;
    info!(path = %path.display(), polygons = polygons.len(), "Loaded polygons");
    Ok(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISTRICTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"ADM2_EN": "Colombo", "ADM2_PCODE": 11, "area": 0.06, "tags": ["coast"]},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[79.8, 6.8], [80.1, 6.8], [80.1, 7.0], [79.8, 7.0], [79.8, 6.8]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"ADM2_EN": "Jaffna", "ADM2_PCODE": 41, "area": 0.1},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[79.9, 9.5, 0.0], [80.2, 9.5, 0.0], [80.2, 9.8, 0.0], [79.9, 9.5, 0.0]]],
                        [[[79.7, 9.6], [79.8, 9.6], [79.8, 9.7], [79.7, 9.6]]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_districts() {
        let polygons = parse_polygons(DISTRICTS).unwrap();
        assert_eq!(polygons.len(), 2);

        let first = &polygons.records()[0];
        assert_eq!(first.attribute("ADM2_EN"), Some(&AttributeValue::from("Colombo")));
        assert_eq!(first.attribute("ADM2_PCODE"), Some(&AttributeValue::Int(11)));
        assert!(first.attribute("tags").is_none());

        assert_eq!(polygons.records()[1].geometry.0.len(), 2);
        assert_eq!(
            polygons.identifiers("ADM2_PCODE").unwrap(),
            vec!["11".to_string(), "41".to_string()]
        );
        // Float values cannot identify a region
        assert_eq!(polygons.unique_fields(), vec!["ADM2_EN", "ADM2_PCODE"]);
    }

    #[test]
    fn test_rejects_non_polygon_geometry() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [80.0, 7.0]}}
            ]
        }"#;
        let err = parse_polygons(json).unwrap_err();
        assert!(format!("{:#}", err).contains("not a Polygon"));
    }

    #[test]
    fn test_rejects_missing_geometry() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": null, "geometry": null}]
        }"#;
        assert!(parse_polygons(json).is_err());
    }
}
