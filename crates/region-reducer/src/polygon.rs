//! Polygon records and collections.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use geo_types::{MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::{ReducerError, Result};

/// Scalar attribute value attached to a polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Identifier text for int and string values.
    pub fn as_identifier(&self) -> Option<String> {
        match self {
            Self::Int(i) => Some(i.to_string()),
            Self::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// A region geometry with its attribute record.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRecord {
    pub geometry: MultiPolygon<f64>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl PolygonRecord {
    pub fn new(geometry: impl Into<MultiPolygon<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self::new(MultiPolygon::new(vec![polygon]))
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

/// Ordered polygon records, as yielded by the polygon source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonCollection {
    records: Vec<PolygonRecord>,
}

impl PolygonCollection {
    pub fn new(records: Vec<PolygonRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PolygonRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &PolygonRecord> {
        self.records.iter()
    }

    /// Identifier of every record, in order, read from `field`.
    ///
    /// The field must be present on every record, hold an integer or string,
    /// and be unique across the collection. Uniqueness is checked on the
    /// identifier text, which keys the report, so the integer `1` and the
    /// string `"1"` are duplicates.
    pub fn identifiers(&self, field: &str) -> Result<Vec<String>> {
        let mut seen = HashSet::with_capacity(self.records.len());
        let mut ids = Vec::with_capacity(self.records.len());

        for (i, record) in self.records.iter().enumerate() {
            let value = record.attribute(field).ok_or_else(|| {
                ReducerError::unknown_unique_field(field, format!("absent on record {}", i))
            })?;
            let id = value.as_identifier().ok_or_else(|| {
                ReducerError::unknown_unique_field(
                    field,
                    format!("record {} holds '{}', not an integer or string", i, value),
                )
            })?;
            if !seen.insert(id.clone()) {
                return Err(ReducerError::unknown_unique_field(
                    field,
                    format!("duplicate value '{}'", id),
                ));
            }
            ids.push(id);
        }

        Ok(ids)
    }

    /// Attribute fields usable as a unique identifier: present on every
    /// record with an integer or string value, all values distinct.
    pub fn unique_fields(&self) -> Vec<String> {
        let Some(first) = self.records.first() else {
            return Vec::new();
        };

        first
            .attributes
            .keys()
            .filter(|field| self.identifiers(field).is_ok())
            .cloned()
            .collect()
    }
}

impl FromIterator<PolygonRecord> for PolygonCollection {
    fn from_iter<I: IntoIterator<Item = PolygonRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
