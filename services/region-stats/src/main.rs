//! Regional forecast statistics.
//!
//! Reduces a gridded forecast over administrative polygons and prints the
//! per-region time series as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use forecast_common::BoundingBox;
use forecast_grid::{GridDataset, GridError};
use region_reducer::{box_fields, ReduceRequest, ReducerError, ReducerKind, RegionalReducer};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use region_stats::config::{self, Overrides};
use region_stats::geojson::load_polygons;
use region_stats::output::{reducer_catalog, reports_by_name, FieldDocument, Inspection};

#[derive(Parser, Debug)]
#[command(name = "region-stats")]
#[command(about = "Polygon-weighted regional statistics from gridded forecasts")]
struct Args {
    /// NetCDF forecast file
    #[arg(short, long, env = "FORECAST_DATASET", required_unless_present = "list_reducers")]
    dataset: Option<PathBuf>,

    /// GeoJSON FeatureCollection of region polygons
    #[arg(short, long, env = "REGION_POLYGONS")]
    polygons: Option<PathBuf>,

    /// Reducer to run (repeatable, default: all registered)
    #[arg(short, long = "reducer")]
    reducers: Vec<String>,

    /// Polygon attribute holding a unique region id
    #[arg(short, long, env = "REGION_UNIQUE_FIELD")]
    unique_field: Option<String>,

    /// Worker threads for weight computation
    #[arg(long)]
    workers: Option<usize>,

    /// Maximum cell subdivision depth
    #[arg(long)]
    depth: Option<u32>,

    /// Forecast source name (sets lead days and steps per day)
    #[arg(long, env = "FORECAST_SOURCE")]
    source: Option<String>,

    /// YAML file with forecast source definitions
    #[arg(long, env = "FORECAST_SOURCES_CONFIG")]
    sources_config: Option<PathBuf>,

    /// Clamp negative accumulation differences to zero
    #[arg(long)]
    clamp_negative: bool,

    /// Forecast initialization label, YYYYmmdd_HH (default: first time step)
    #[arg(long)]
    fcst_init: Option<String>,

    /// Print per-window fields over "left,bottom,right,top" instead of
    /// regional statistics
    #[arg(long, value_parser = parse_bbox)]
    bbox: Option<BoundingBox>,

    /// Print the reducer catalogue and exit
    #[arg(long)]
    list_reducers: bool,

    /// Print a dataset summary (and unique polygon fields) and exit
    #[arg(long)]
    inspect: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_bbox(s: &str) -> std::result::Result<BoundingBox, String> {
    BoundingBox::from_csv(s).map_err(|e| e.to_string())
}

fn main() {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
    }

    if let Err(e) = run(args) {
        error!(code = error_code(&e), error = %format!("{:#}", e), "region-stats failed");
        std::process::exit(1);
    }
}

/// Structured code of the first reducer or grid error in the chain.
fn error_code(err: &anyhow::Error) -> &'static str {
    err.chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<ReducerError>()
                .map(ReducerError::code)
                .or_else(|| cause.downcast_ref::<GridError>().map(GridError::code))
        })
        .unwrap_or("INTERNAL_ERROR")
}

fn run(args: Args) -> Result<()> {
    if args.list_reducers {
        return print_json(&reducer_catalog());
    }

    let dataset_path = args
        .dataset
        .as_deref()
        .context("--dataset is required")?;

    forecast_grid::silence_hdf5_errors();
    let dataset = GridDataset::load(dataset_path)
        .with_context(|| format!("Failed to load dataset: {}", dataset_path.display()))?;

    let polygons = args.polygons.as_deref().map(load_polygons).transpose()?;

    if args.inspect {
        return print_json(&Inspection::new(&dataset, polygons.as_ref()));
    }

    let overrides = Overrides {
        workers: args.workers,
        depth: args.depth,
        source: args.source.clone(),
        sources_config: args.sources_config.clone(),
        clamp_negative: args.clamp_negative,
    };
    let reducer_config = config::resolve(&overrides)?;

    let names: Vec<String> = if args.reducers.is_empty() {
        ReducerKind::ALL.iter().map(|k| k.name().to_string()).collect()
    } else {
        args.reducers.clone()
    };

    if let Some(bbox) = &args.bbox {
        info!(bbox = %bbox, reducers = ?names, "Building box fields");
        let mut documents = std::collections::BTreeMap::new();
        for name in &names {
            let kind = ReducerKind::from_name(name)?;
            let request = ReduceRequest::from_kind(kind, &reducer_config.source)?;
            let fields = box_fields(
                &dataset,
                &request,
                bbox,
                reducer_config.clamp_negative_accumulation,
            )?;
            documents.insert(name.clone(), FieldDocument::from(&fields));
        }
        return print_json(&documents);
    }

    let Some(polygons) = polygons else {
        bail!("--polygons is required");
    };
    let Some(unique_field) = args.unique_field.as_deref() else {
        bail!(
            "--unique-field is required (candidates: {})",
            polygons.unique_fields().join(", ")
        );
    };

    let fcst_init = config::parse_fcst_init(args.fcst_init.as_deref())?;

    info!(
        dataset = %dataset_path.display(),
        polygons = polygons.len(),
        reducers = ?names,
        source = %reducer_config.source.name,
        workers = reducer_config.workers,
        "Starting regional reduction"
    );

    let mut reducer = RegionalReducer::new(&dataset, reducer_config)?;
    if let Some(init) = fcst_init {
        reducer = reducer.with_fcst_init(init);
    }

    let reports = reducer.reduce_many(&names, &polygons, unique_field)?;
    print_json(&reports_by_name(reports, &names))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
