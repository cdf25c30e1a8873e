//! Regional forecast statistics service library.
//!
//! Input loading, run configuration and output documents for the
//! `region-stats` command line tool.

pub mod config;
pub mod geojson;
pub mod output;
