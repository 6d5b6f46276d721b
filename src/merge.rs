//! # Multi-Gauge Merge
//!
//! Folds the independently timestamped gauges of one network into a single
//! time series. Every gauge is first copied into time order, then a k-way
//! merge walks one cursor per gauge:
//!
//! 1. take the earliest timestamp under any cursor that is not exhausted
//! 2. emit an [`Instant`] at that timestamp
//! 3. every gauge whose cursor sits on that exact timestamp contributes its
//!    reading and advances; all others are recorded as absent
//!
//! Each step advances at least one cursor, so the merge ends after at most
//! the total observation count of the network. No reading is interpolated.

use crate::complex::{GaugeComplex, GaugeNetwork};
use crate::gauge::Gauge;
use crate::sort::{compare_time, sort_by_time};
use crate::GaugeTime;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

/// Position and number of a gauge within its network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GaugeId {
    /// Index in network order
    pub index: usize,
    /// Gauge number from the file header
    pub number: i32,
}

/// One gauge's contribution to an [`Instant`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Reading {
    pub gauge: GaugeId,
    /// Bin values, or `None` when the gauge has no observation at this time
    pub values: Option<Vec<f32>>,
}

/// Every gauge of a network at one timestamp.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Instant {
    pub time: GaugeTime,
    /// One entry per gauge, in network order
    pub readings: Vec<Reading>,
}

impl Instant {
    /// Values reported by the gauge with this number, if it reported.
    pub fn values_for(&self, number: i32) -> Option<&[f32]> {
        self.readings
            .iter()
            .find(|r| r.gauge.number == number)
            .and_then(|r| r.values.as_deref())
    }

    /// Gauges that reported at this timestamp.
    pub fn present(&self) -> impl Iterator<Item = GaugeId> + '_ {
        self.readings
            .iter()
            .filter(|r| r.values.is_some())
            .map(|r| r.gauge)
    }
}

/// Merge all gauges of `network` into one strictly increasing instant series.
///
/// Gauges are sorted in parallel; the input network is not modified.
pub fn merge_by_time(network: &GaugeNetwork) -> Vec<Instant> {
    let sorted: Vec<Gauge> = network.gauges().par_iter().map(sort_by_time).collect();
    merge_sorted(&sorted)
}

/// Merge every network of `complex`, concurrently, returning one series per
/// network in network order.
pub fn merge_complex(complex: &GaugeComplex) -> Vec<Vec<Instant>> {
    complex.networks().par_iter().map(merge_by_time).collect()
}

/// k-way merge of gauges that are already in time order.
///
/// Callers must pass chronologically sorted gauges (see
/// [`crate::sort::sort_by_time`]); unsorted input still terminates but the
/// output is not monotonic.
pub fn merge_sorted(gauges: &[Gauge]) -> Vec<Instant> {
    let mut cursors = vec![0usize; gauges.len()];
    let mut instants = Vec::new();

    loop {
        let earliest = gauges
            .iter()
            .zip(&cursors)
            .filter_map(|(gauge, &cursor)| gauge.times().get(cursor))
            .min_by(|a, b| compare_time(a, b))
            .copied();
        let Some(time) = earliest else {
            break;
        };

        let readings = gauges
            .iter()
            .zip(cursors.iter_mut())
            .enumerate()
            .map(|(index, (gauge, cursor))| {
                let values = match gauge.observation(*cursor) {
                    Some(obs) if compare_time(&obs.time, &time) == Ordering::Equal => {
                        *cursor += 1;
                        Some(obs.values.to_vec())
                    }
                    _ => None,
                };
                Reading {
                    gauge: GaugeId {
                        index,
                        number: gauge.header.number,
                    },
                    values,
                }
            })
            .collect();
        instants.push(Instant { time, readings });
    }

    instants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauge::GaugeHeader;
    use crate::Instrument;

    fn at(minute: u32) -> GaugeTime {
        GaugeTime::from_jday(1998, 32, 12, minute, 0.0).unwrap()
    }

    fn gauge(number: i32, minutes: &[u32]) -> Gauge {
        let header = GaugeHeader {
            number,
            ..GaugeHeader::default()
        };
        let mut gauge = Gauge::new(header, Instrument::RainGauge, minutes.len());
        for &m in minutes {
            gauge.append(at(m), &[m as f32]).unwrap();
        }
        gauge
    }

    #[test]
    fn test_merge_sorted_empty_inputs() {
        assert!(merge_sorted(&[]).is_empty());
        assert!(merge_sorted(&[gauge(1, &[]), gauge(2, &[])]).is_empty());
    }

    #[test]
    fn test_single_gauge_maps_one_to_one() {
        let instants = merge_sorted(&[gauge(1, &[1, 2, 3])]);
        assert_eq!(instants.len(), 3);
        assert!(instants.iter().all(|i| i.readings.len() == 1));
        assert_eq!(instants[2].values_for(1), Some(&[3.0][..]));
    }

    #[test]
    fn test_duplicate_times_in_one_gauge_get_separate_instants() {
        let instants = merge_sorted(&[gauge(1, &[5, 5]), gauge(2, &[5])]);
        assert_eq!(instants.len(), 2);
        assert_eq!(instants[0].present().count(), 2);
        assert_eq!(instants[1].present().map(|g| g.number).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_signed_zero_seconds_share_an_instant() {
        let mut a = gauge(1, &[]);
        let mut b = gauge(2, &[]);
        let negative = GaugeTime::from_jday(1998, 32, 14, 5, -0.0).unwrap();
        let positive = GaugeTime::from_jday(1998, 32, 14, 5, 0.0).unwrap();
        a.append(negative, &[1.0]).unwrap();
        b.append(positive, &[2.0]).unwrap();

        let instants = merge_sorted(&[a, b]);
        assert_eq!(instants.len(), 1);
        assert_eq!(instants[0].present().count(), 2);
    }

    #[test]
    fn test_present_and_values_for() {
        let instants = merge_sorted(&[gauge(10, &[1]), gauge(20, &[2])]);
        assert_eq!(instants[0].values_for(10), Some(&[1.0][..]));
        assert_eq!(instants[0].values_for(20), None);
        assert_eq!(instants[0].values_for(99), None);
        let ids: Vec<GaugeId> = instants[1].present().collect();
        assert_eq!(ids, vec![GaugeId { index: 1, number: 20 }]);
    }
}
