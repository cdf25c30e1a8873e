//! Common types and utilities shared across the regional forecast statistics crates.

pub mod bbox;
pub mod time;

pub use bbox::{BboxParseError, BoundingBox};
pub use time::{
    format_day_label, format_iso, parse_init_time, CfTimeUnits, TimeParseError, TimeUnit,
    DAY_LABEL_FORMAT, INIT_TIME_FORMAT, ISO_FORMAT,
};
