//! Time handling utilities for forecast data.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp format used in every serialized report (ISO 8601 / ECMA-262).
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Short day label used for frame titles, e.g. `07-Mar`.
pub const DAY_LABEL_FORMAT: &str = "%d-%b";

/// Format used by the forecast state store for model run times, e.g. `20240307_00`.
pub const INIT_TIME_FORMAT: &str = "%Y%m%d_%H";

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_iso(dt: &DateTime<Utc>) -> String {
    dt.format(ISO_FORMAT).to_string()
}

/// Format a timestamp as a short day label (`%d-%b`).
pub fn format_day_label(dt: &DateTime<Utc>) -> String {
    dt.format(DAY_LABEL_FORMAT).to_string()
}

/// Parse a forecast initialization time in `YYYYmmdd_HH` form.
pub fn parse_init_time(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let ndt = NaiveDateTime::parse_from_str(&format!("{}:00", s.trim()), "%Y%m%d_%H:%M")
        .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))?;
    Ok(Utc.from_utc_datetime(&ndt))
}

/// Unit of a CF time coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(Self::Seconds),
            "min" | "mins" | "minute" | "minutes" => Some(Self::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(Self::Hours),
            "d" | "day" | "days" => Some(Self::Days),
            _ => None,
        }
    }

    /// Length of one unit in seconds.
    pub fn seconds(&self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3600.0,
            Self::Days => 86400.0,
        }
    }
}

/// Parsed CF `"<unit> since <epoch>"` time units.
///
/// Only the standard (proleptic Gregorian) calendar is supported, which is
/// what operational NWP NetCDF exports use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub epoch: DateTime<Utc>,
}

impl CfTimeUnits {
    /// Parse a CF units string such as `hours since 1900-01-01 00:00:00.0`.
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let (unit, epoch) = s
            .split_once(" since ")
            .ok_or_else(|| TimeParseError::InvalidUnits(s.to_string()))?;

        let unit = TimeUnit::from_str(unit.trim())
            .ok_or_else(|| TimeParseError::InvalidUnits(s.to_string()))?;
        let epoch =
            parse_epoch(epoch).ok_or_else(|| TimeParseError::InvalidUnits(s.to_string()))?;

        Ok(Self { unit, epoch })
    }

    /// Convert a raw coordinate value to an absolute timestamp.
    ///
    /// Values are rounded to the nearest millisecond.
    pub fn to_datetime(&self, value: f64) -> Option<DateTime<Utc>> {
        if !value.is_finite() {
            return None;
        }
        let millis = (value * self.unit.seconds() * 1000.0).round();
        if millis.abs() > i64::MAX as f64 {
            return None;
        }
        self.epoch
            .checked_add_signed(Duration::milliseconds(millis as i64))
    }
}

fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    let cleaned = s
        .trim()
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim()
        .replace('T', " ");

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(&cleaned, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid CF time units: {0}")]
    InvalidUnits(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_format_iso() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 7, 6, 0, 0).unwrap();
        assert_eq!(format_iso(&dt), "2024-03-07T06:00:00Z");
        assert_eq!(format_day_label(&dt), "07-Mar");
    }

    #[test]
    fn test_parse_init_time() {
        let dt = parse_init_time("20240307_12").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap());
        assert!(parse_init_time("2024-03-07").is_err());
    }

    #[test]
    fn test_cf_hours_since_1900() {
        let units = CfTimeUnits::parse("hours since 1900-01-01 00:00:00.0").unwrap();
        assert_eq!(units.unit, TimeUnit::Hours);
        assert_eq!(units.epoch.year(), 1900);

        // 2024-01-01T00:00:00Z is 1086600 hours after 1900-01-01
        let dt = units.to_datetime(1_086_600.0).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_cf_seconds_since_epoch_iso() {
        let units = CfTimeUnits::parse("seconds since 1970-01-01T00:00:00Z").unwrap();
        let dt = units.to_datetime(21_600.0).unwrap();
        assert_eq!(dt.hour(), 6);
        assert_eq!(dt.day(), 1);
    }

    #[test]
    fn test_cf_days_since_date_only() {
        let units = CfTimeUnits::parse("days since 2000-01-01").unwrap();
        assert_eq!(units.unit, TimeUnit::Days);
        let dt = units.to_datetime(1.25).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2000, 1, 2, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_cf_invalid_units() {
        assert!(CfTimeUnits::parse("hours after 1900-01-01").is_err());
        assert!(CfTimeUnits::parse("fortnights since 1900-01-01").is_err());
        assert!(CfTimeUnits::parse("hours since yesterday").is_err());
    }
}
