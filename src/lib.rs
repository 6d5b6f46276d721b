//! # Gauge Complex Core Library
//!
//! This library assembles rain gauge and disdrometer readings, delivered one
//! file per gauge, into a single in-memory hierarchy anchored to one ground
//! radar site, and then produces a time-synchronized view of each network.
//!
//! ## Hierarchy
//!
//! ```text
//! GaugeComplex (one radar site)
//! └── GaugeNetwork (≤ 16 per complex)
//!     └── Gauge (≤ 300 per network)
//!         └── observations (GaugeTime + 1 or 20 bin values)
//! ```
//!
//! Every level owns the next one outright; there are no back references.
//!
//! ## Data Flow
//! 1. **Read**: a [`reader::GaugeSource`] produces one populated [`Gauge`]
//! 2. **Assemble**: [`GaugeComplex::build`] groups gauges into networks and checks
//!    every new network against the [`registry::SiteRegistry`]. Any violation
//!    discards the whole partial complex.
//! 3. **Order**: [`sort::sort_by_time`] copies a gauge into chronological order
//! 4. **Merge**: [`merge::merge_by_time`] folds all gauges of a network into one
//!    series of [`merge::Instant`]s keyed on exact timestamp equality
//!
//! ## Core Types
//!
//! The crate root exports the two value types every module shares:
//! - [`GaugeTime`]: calendar timestamp of one observation
//! - [`Instrument`]: the instrument kind, which fixes a gauge's bin width

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// Module declarations
pub mod complex;
pub mod config;
pub mod gauge;
pub mod granule;
pub mod merge;
pub mod reader;
pub mod registry;
pub mod report;
pub mod sitelist;
pub mod sort;

#[cfg(test)]
mod tests;

pub use complex::{BuildError, GaugeComplex, GaugeNetwork, MAX_GAUGE_NETWORKS, MAX_NETWORK_GAUGES};
pub use gauge::{Gauge, GaugeHeader, Observation};
pub use merge::{merge_by_time, Instant};
pub use sort::sort_by_time;

/// Number of drop-size bins reported by a disdrometer.
pub const DISDROMETER_BINS: usize = 20;

/// Timestamp of a single gauge observation.
///
/// The day of year is what the raw files carry; `month` and `day` are derived
/// from it at read time and stored alongside so that ordering can compare
/// every field directly.
///
/// # Example
/// ```
/// use gauge_complex_lib::GaugeTime;
///
/// let t = GaugeTime::from_jday(1998, 32, 14, 5, 0.0).unwrap();
/// assert_eq!((t.month, t.day), (2, 1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaugeTime {
    /// Four-digit year
    pub year: i32,
    /// Day of year, 1-based
    pub jday: u32,
    /// Month, 1-12
    pub month: u32,
    /// Day of month, 1-31
    pub day: u32,
    /// Hour of day, 0-23
    pub hour: u32,
    /// Minute of hour, 0-59
    pub minute: u32,
    /// Fractional second
    pub sec: f32,
}

impl GaugeTime {
    /// Build a timestamp from year and day of year, deriving month and day.
    ///
    /// Returns `None` when `jday` does not exist in `year` (0, or 366 in a
    /// common year). A second of `-0.0` is stored as `0.0` so that it
    /// compares equal to an unsigned zero.
    pub fn from_jday(year: i32, jday: u32, hour: u32, minute: u32, sec: f32) -> Option<Self> {
        let date = NaiveDate::from_yo_opt(year, jday)?;
        Some(GaugeTime {
            year,
            jday,
            month: date.month(),
            day: date.day(),
            hour,
            minute,
            sec: if sec == 0.0 { 0.0 } else { sec },
        })
    }
}

impl std::fmt::Display for GaugeTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04} {:03} ({:02}/{:02}) {:02}:{:02}:{:04.1}",
            self.year, self.jday, self.month, self.day, self.hour, self.minute, self.sec
        )
    }
}

/// Kind of instrument a build reads.
///
/// Chosen once per build and threaded through every source, so all gauges of
/// a complex share one bin width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    /// Tipping bucket or similar gauge reporting one rain rate per observation
    RainGauge,
    /// Disdrometer reporting a 20-bin drop size distribution per observation
    Disdrometer,
}

impl Instrument {
    /// Number of values carried by each observation.
    pub fn bin_count(self) -> usize {
        match self {
            Instrument::RainGauge => 1,
            Instrument::Disdrometer => DISDROMETER_BINS,
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instrument::RainGauge => write!(f, "raingauge"),
            Instrument::Disdrometer => write!(f, "disdrometer"),
        }
    }
}
