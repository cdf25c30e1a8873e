//! Temporal windowing over the forecast time axis.
//!
//! Windows are pure index pairs; calendar labels are resolved against a time
//! axis only when a report is built.

use chrono::{DateTime, Utc};
use forecast_common::{format_day_label, format_iso};
use serde::{Deserialize, Serialize};

use crate::error::{ReducerError, Result};
use crate::report::TimeLabel;

/// An inclusive `(start, end)` index pair into the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Window {
    pub fn new(index: usize, start: usize, end: usize) -> Self {
        Self { index, start, end }
    }

    /// A window covering a single raw step.
    pub fn is_instant(&self) -> bool {
        self.start == self.end
    }

    /// `(start, end)` as a tuple.
    pub fn bounds(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Start and end timestamps.
    pub fn calendar(&self, times: &[DateTime<Utc>]) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        match (times.get(self.start), times.get(self.end)) {
            (Some(start), Some(end)) => Ok((*start, *end)),
            _ => Err(ReducerError::invalid_window(format!(
                "window {} ({}, {}) exceeds time axis of {} steps",
                self.index,
                self.start,
                self.end,
                times.len()
            ))),
        }
    }

    /// Serialized time label: one timestamp for instant windows, a
    /// `[start, end]` pair otherwise.
    pub fn time_label(&self, times: &[DateTime<Utc>]) -> Result<TimeLabel> {
        let (start, end) = self.calendar(times)?;
        Ok(if self.is_instant() {
            TimeLabel::Instant(format_iso(&start))
        } else {
            TimeLabel::Period([format_iso(&start), format_iso(&end)])
        })
    }

    /// Short `%d-%b` label of the window start, used for frame titles.
    pub fn day_label(&self, times: &[DateTime<Utc>]) -> Result<String> {
        let (start, _) = self.calendar(times)?;
        Ok(format_day_label(&start))
    }
}

/// Contiguous per-day windows: `(d * steps_per_day, (d + 1) * steps_per_day)`.
pub fn daily_windows(lead_days: usize, steps_per_day: usize) -> Result<Vec<Window>> {
    if lead_days == 0 || steps_per_day == 0 {
        return Err(ReducerError::invalid_window(format!(
            "lead_days ({}) and steps_per_day ({}) must be positive",
            lead_days, steps_per_day
        )));
    }
    if lead_days.checked_mul(steps_per_day).is_none() {
        return Err(ReducerError::invalid_window(format!(
            "{} days of {} steps overflow the step index",
            lead_days, steps_per_day
        )));
    }

    Ok((0..lead_days)
        .map(|day| {
            let start = day * steps_per_day;
            Window::new(day, start, start + steps_per_day)
        })
        .collect())
}

/// Unit windows `(i - 1, i)` for every step `i` in `1..=total_steps`.
pub fn step_windows(total_steps: usize) -> Result<Vec<Window>> {
    if total_steps == 0 {
        return Err(ReducerError::invalid_window("total_steps must be positive"));
    }

    Ok((1..=total_steps)
        .map(|i| Window::new(i - 1, i - 1, i))
        .collect())
}

/// Instant windows `(i, i)` for every raw step `i` in `0..=total_steps`,
/// including the initial state.
pub fn instant_steps(total_steps: usize) -> Result<Vec<Window>> {
    if total_steps == 0 {
        return Err(ReducerError::invalid_window("total_steps must be positive"));
    }

    Ok((0..=total_steps).map(|i| Window::new(i, i, i)).collect())
}

/// Caller-provided `(start, end)` pairs.
pub fn explicit_windows(pairs: &[(usize, usize)]) -> Result<Vec<Window>> {
    if pairs.is_empty() {
        return Err(ReducerError::invalid_window("no windows given"));
    }

    pairs
        .iter()
        .enumerate()
        .map(|(index, &(start, end))| {
            if start > end {
                Err(ReducerError::invalid_window(format!(
                    "window {} has start {} > end {}",
                    index, start, end
                )))
            } else {
                Ok(Window::new(index, start, end))
            }
        })
        .collect()
}

/// Ensure every window ends inside a time axis of `n_times` steps.
pub fn check_time_axis(windows: &[Window], n_times: usize) -> Result<()> {
    match windows.iter().find(|w| w.end >= n_times) {
        Some(w) => Err(ReducerError::invalid_window(format!(
            "window {} ends at step {} but the time axis has {} steps",
            w.index, w.end, n_times
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::time;

    #[test]
    fn test_daily_windows() {
        let windows = daily_windows(10, 4).unwrap();
        assert_eq!(windows.len(), 10);
        assert_eq!(windows[0].bounds(), (0, 4));
        assert_eq!(windows[9].bounds(), (36, 40));
        assert_eq!(windows[0].start, 0);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_step_windows() {
        let windows = step_windows(40).unwrap();
        assert_eq!(windows.len(), 40);
        assert_eq!(windows[0].bounds(), (0, 1));
        assert_eq!(windows[39].bounds(), (39, 40));
    }

    #[test]
    fn test_instant_steps() {
        let windows = instant_steps(40).unwrap();
        assert_eq!(windows.len(), 41);
        assert!(windows.iter().all(Window::is_instant));
        assert_eq!(windows[40].bounds(), (40, 40));
    }

    #[test]
    fn test_invalid_counts() {
        assert!(matches!(daily_windows(0, 4), Err(ReducerError::InvalidWindowSpec(_))));
        assert!(matches!(daily_windows(10, 0), Err(ReducerError::InvalidWindowSpec(_))));
        assert!(matches!(
            daily_windows(usize::MAX, 2),
            Err(ReducerError::InvalidWindowSpec(_))
        ));
        assert!(step_windows(0).is_err());
        assert!(instant_steps(0).is_err());
        assert!(explicit_windows(&[]).is_err());
        assert!(explicit_windows(&[(0, 4), (5, 2)]).is_err());
    }

    #[test]
    fn test_explicit_windows() {
        let windows = explicit_windows(&[(0, 8), (8, 8)]).unwrap();
        assert_eq!(windows[1], Window::new(1, 8, 8));
    }

    #[test]
    fn test_check_time_axis() {
        let windows = daily_windows(10, 4).unwrap();
        assert!(check_time_axis(&windows, 41).is_ok());
        assert!(check_time_axis(&windows, 40).is_err());
    }

    #[test]
    fn test_calendar_labels() {
        let times = time::six_hourly();
        let windows = daily_windows(10, 4).unwrap();

        assert_eq!(
            windows[1].time_label(&times).unwrap(),
            TimeLabel::Period([
                "2024-03-08T00:00:00Z".to_string(),
                "2024-03-09T00:00:00Z".to_string()
            ])
        );
        assert_eq!(windows[1].day_label(&times).unwrap(), "08-Mar");

        let instant = Window::new(0, 2, 2);
        assert_eq!(
            instant.time_label(&times).unwrap(),
            TimeLabel::Instant("2024-03-07T12:00:00Z".to_string())
        );

        assert!(Window::new(0, 40, 41).calendar(&times).is_err());
    }
}
