//! Common test fixtures for region-stats tests.
//!
//! Pre-defined grids, times and regions that represent the usual forecast
//! reduction scenarios.

/// Common grid specifications for testing.
pub mod grid {
    /// Regular 0.1 degree grid over Sri Lanka, latitude stored north to south.
    pub const SRI_LANKA_0P1: GridSpec = GridSpec {
        lat_start: 9.9,
        lat_step: -0.1,
        rows: 41,
        lon_start: 79.5,
        lon_step: 0.1,
        cols: 25,
    };

    /// Small 1 degree grid for hand-computed expectations.
    pub const UNIT_4X4: GridSpec = GridSpec {
        lat_start: 0.0,
        lat_step: 1.0,
        rows: 4,
        lon_start: 0.0,
        lon_step: 1.0,
        cols: 4,
    };

    /// Grid specification helper.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub lat_start: f64,
        pub lat_step: f64,
        pub rows: usize,
        pub lon_start: f64,
        pub lon_step: f64,
        pub cols: usize,
    }

    impl GridSpec {
        /// Latitude samples in storage order.
        pub fn lats(&self) -> Vec<f64> {
            crate::create_axis(self.lat_start, self.lat_step, self.rows)
        }

        /// Longitude samples in storage order.
        pub fn lons(&self) -> Vec<f64> {
            crate::create_axis(self.lon_start, self.lon_step, self.cols)
        }

        /// `(rows, cols)` shape.
        pub fn shape(&self) -> (usize, usize) {
            (self.rows, self.cols)
        }
    }
}

/// Forecast timing fixtures.
pub mod time {
    use chrono::{DateTime, TimeZone, Utc};

    /// Steps per day for a six-hourly forecast.
    pub const STEPS_PER_DAY: usize = 4;

    /// Lead days of a standard medium-range run.
    pub const LEAD_DAYS: usize = 10;

    /// Raw steps in a standard run, including the initial state.
    pub const TOTAL_STEPS: usize = STEPS_PER_DAY * LEAD_DAYS + 1;

    /// Reference model initialization time.
    pub fn init() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap()
    }

    /// Six-hourly valid times for a full run.
    pub fn six_hourly() -> Vec<DateTime<Utc>> {
        crate::create_times(init(), 6, TOTAL_STEPS)
    }
}

/// Physical constants used in conversion expectations.
pub mod values {
    /// 27 degC in kelvin.
    pub const T_300_15_K: f64 = 300.15;

    /// Large-scale precipitation sample in metres.
    pub const LSP_M: f64 = 0.002;

    /// Convective precipitation sample in metres.
    pub const CP_M: f64 = 0.001;
}
