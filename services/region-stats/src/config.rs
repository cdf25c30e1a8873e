//! Run configuration: environment defaults, source registry and CLI overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use forecast_common::parse_init_time;
use region_reducer::{ReducerConfig, SourceRegistry};
use tracing::info;

/// Values given on the command line; `None` keeps the environment default.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub workers: Option<usize>,
    pub depth: Option<u32>,
    pub source: Option<String>,
    pub sources_config: Option<PathBuf>,
    pub clamp_negative: bool,
}

/// Load a forecast source registry from a YAML file.
pub fn load_sources(path: &Path) -> Result<SourceRegistry> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sources config: {}", path.display()))?;
    let registry = SourceRegistry::from_yaml_str(&content)
        .with_context(|| format!("Invalid sources config: {}", path.display()))?;
    info!(
        path = %path.display(),
        sources = ?registry.names().collect::<Vec<_>>(),
        "Loaded forecast sources"
    );
    Ok(registry)
}

/// Reducer configuration from the environment with overrides applied.
pub fn resolve(overrides: &Overrides) -> Result<ReducerConfig> {
    resolve_from(ReducerConfig::from_env(), overrides)
}

/// Apply overrides on top of `base` and validate the result.
pub fn resolve_from(mut config: ReducerConfig, overrides: &Overrides) -> Result<ReducerConfig> {
    if let Some(name) = &overrides.source {
        let registry = match &overrides.sources_config {
            Some(path) => load_sources(path)?,
            None => SourceRegistry::default(),
        };
        config.source = registry
            .get(name)
            .cloned()
            .with_context(|| {
                format!(
                    "Unknown forecast source '{}' (known: {})",
                    name,
                    registry.names().collect::<Vec<_>>().join(", ")
                )
            })?;
    }

    if let Some(workers) = overrides.workers {
        config.workers = workers;
    }
    if let Some(depth) = overrides.depth {
        config.subdivision_depth = depth;
    }
    if overrides.clamp_negative {
        config.clamp_negative_accumulation = true;
    }

    config.validate().context("Invalid reducer configuration")?;
    Ok(config)
}

/// Parse an optional `YYYYmmdd_HH` initialization label.
pub fn parse_fcst_init(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|s| parse_init_time(s).with_context(|| format!("Invalid --fcst-init '{}'", s)))
        .transpose()
}
