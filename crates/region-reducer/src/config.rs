//! Configuration for regional reduction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ReducerError, Result};

/// Deepest subdivision level accepted for weight computation.
pub const MAX_SUBDIVISION_DEPTH: u32 = 12;

/// Configuration for the regional reducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Maximum recursion depth when subdividing boundary cells.
    pub subdivision_depth: u32,

    /// Worker threads for weight computation (1 = sequential).
    pub workers: usize,

    /// Clamp per-cell negative accumulation differences to zero.
    pub clamp_negative_accumulation: bool,

    /// Forecast source timing.
    pub source: ForecastSource,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            subdivision_depth: 5,
            workers: 4,
            clamp_negative_accumulation: false,
            source: ForecastSource::default(),
        }
    }
}

impl ReducerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("REDUCER_SUBDIVISION_DEPTH") {
            if let Ok(depth) = val.parse() {
                config.subdivision_depth = depth;
            }
        }

        if let Ok(val) = std::env::var("REDUCER_WORKERS") {
            if let Ok(workers) = val.parse() {
                config.workers = workers;
            }
        }

        if let Ok(val) = std::env::var("REDUCER_CLAMP_NEGATIVE_ACCUMULATION") {
            config.clamp_negative_accumulation = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("FORECAST_LEAD_DAYS") {
            if let Ok(days) = val.parse() {
                config.source.lead_days = days;
            }
        }

        if let Ok(val) = std::env::var("FORECAST_STEPS_PER_DAY") {
            if let Ok(steps) = val.parse() {
                config.source.steps_per_day = steps;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ReducerError::config("workers must be > 0"));
        }

        if self.subdivision_depth > MAX_SUBDIVISION_DEPTH {
            return Err(ReducerError::config(format!(
                "subdivision_depth must be <= {}",
                MAX_SUBDIVISION_DEPTH
            )));
        }

        self.source.validate()
    }
}

/// Timing of a forecast product: how many lead days and steps per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastSource {
    pub name: String,
    pub lead_days: usize,
    pub steps_per_day: usize,
}

impl Default for ForecastSource {
    fn default() -> Self {
        Self {
            name: "ECMWF_HRES".to_string(),
            lead_days: 10,
            steps_per_day: 4,
        }
    }
}

impl ForecastSource {
    /// Steps after the initial state (`lead_days * steps_per_day`).
    pub fn total_steps(&self) -> Result<usize> {
        self.lead_days.checked_mul(self.steps_per_day).ok_or_else(|| {
            ReducerError::config(format!(
                "{}: lead_days * steps_per_day overflows",
                self.name
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.lead_days == 0 {
            return Err(ReducerError::config(format!(
                "{}: lead_days must be > 0",
                self.name
            )));
        }
        if self.steps_per_day == 0 {
            return Err(ReducerError::config(format!(
                "{}: steps_per_day must be > 0",
                self.name
            )));
        }
        self.total_steps()?;
        Ok(())
    }
}

/// Named forecast sources, usually loaded from YAML:
///
/// ```yaml
/// sources:
///   - name: ECMWF_HRES
///     lead_days: 10
///     steps_per_day: 4
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRegistry {
    sources: BTreeMap<String, ForecastSource>,
}

#[derive(Debug, Deserialize)]
struct SourceFile {
    sources: Vec<ForecastSource>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        let source = ForecastSource::default();
        Self {
            sources: BTreeMap::from([(source.name.clone(), source)]),
        }
    }
}

impl SourceRegistry {
    /// Parse a registry from YAML. Every source is validated; duplicate
    /// names are rejected.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: SourceFile = serde_yaml::from_str(yaml)?;

        let mut sources = BTreeMap::new();
        for source in file.sources {
            source.validate()?;
            if sources.contains_key(&source.name) {
                return Err(ReducerError::config(format!(
                    "duplicate forecast source: {}",
                    source.name
                )));
            }
            sources.insert(source.name.clone(), source);
        }

        Ok(Self { sources })
    }

    pub fn get(&self, name: &str) -> Option<&ForecastSource> {
        self.sources.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}
