//! Chronological ordering of gauge observations.
//!
//! Raw files are not guaranteed to be in time order, and the store keeps
//! observations in arrival order. [`sort_by_time`] returns a sorted copy and
//! leaves the original alone.

use crate::gauge::Gauge;
use crate::GaugeTime;
use std::cmp::Ordering;

/// Order two timestamps field by field: year, day of year, month, day, hour,
/// minute, second.
///
/// Month and day follow from the day of year but are compared anyway, in
/// this order, so that hand-built timestamps order the same way as read ones.
pub fn compare_time(a: &GaugeTime, b: &GaugeTime) -> Ordering {
    a.year
        .cmp(&b.year)
        .then(a.jday.cmp(&b.jday))
        .then(a.month.cmp(&b.month))
        .then(a.day.cmp(&b.day))
        .then(a.hour.cmp(&b.hour))
        .then(a.minute.cmp(&b.minute))
        .then_with(|| a.sec.total_cmp(&b.sec))
}

/// Copy `gauge` with its observations in ascending time order.
///
/// The sort is stable: observations with equal timestamps keep their
/// relative arrival order.
pub fn sort_by_time(gauge: &Gauge) -> Gauge {
    let times = gauge.times();
    let mut order: Vec<usize> = (0..times.len()).collect();
    order.sort_by(|&i, &j| compare_time(&times[i], &times[j]));
    gauge.permuted(&order)
}

/// True when no observation is earlier than the one before it.
pub fn is_sorted_by_time(gauge: &Gauge) -> bool {
    gauge
        .times()
        .windows(2)
        .all(|w| compare_time(&w[0], &w[1]) != Ordering::Greater)
}
