//! # Per-Gauge Observation Store
//!
//! A [`Gauge`] couples the descriptive header read from a gauge file with a
//! growable store of observations. The store keeps timestamps and bin values
//! in two flat buffers; observation `i` owns values
//! `i * bin_count .. (i + 1) * bin_count`, so nothing ever holds an address
//! into a buffer that may move.
//!
//! ## Capacity
//!
//! Raw files do not announce how many records they hold. A gauge starts with a
//! provisional capacity (one day of minute samples is the usual guess) and
//! each time it fills up the capacity grows by [`GROWTH_INCREMENT`]. Growth
//! never touches the bin width or any stored observation.

use crate::{GaugeTime, Instrument};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Observations added to a full gauge's capacity in one growth step.
pub const GROWTH_INCREMENT: usize = 2500;

/// Errors raised by the observation store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GaugeError {
    /// An observation's value vector does not match the gauge's bin count
    #[error("observation has {found} bins, gauge expects {expected}")]
    BinWidthMismatch { expected: usize, found: usize },
}

/// Descriptive header of one gauge, as carried by its raw file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GaugeHeader {
    /// Name of the network this gauge reports to (KSC, STJ, ...)
    pub network: String,
    /// Gauge number within its network
    pub number: i32,
    /// Gauge name
    pub name: String,
    /// Gauge type: "TIP", "HAN", "REC", "ORG", "DSD"
    pub kind: String,
    /// Product identifier (GMIN, 2A56, 2A57), when the file names one
    pub product_id: Option<String>,
    /// Ground validation site, when the file names one
    pub gv_site: Option<String>,
    /// Primary radar, when the file names one
    pub radar: Option<String>,
    /// Sampling resolution in minutes
    pub resolution: f32,
    /// Latitude in degrees
    pub latitude: f32,
    /// Longitude in degrees
    pub longitude: f32,
    /// Range from the primary radar in km
    pub range: f32,
    /// Azimuth from the primary radar in degrees
    pub azimuth: f32,
    /// Elevation above mean sea level in m
    pub elevation: f32,
}

/// Borrowed view of one stored observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation<'a> {
    pub time: GaugeTime,
    pub values: &'a [f32],
}

/// One rain gauge or disdrometer with its observations in insertion order.
#[derive(Clone, Debug, Serialize)]
pub struct Gauge {
    pub header: GaugeHeader,
    instrument: Instrument,
    capacity: usize,
    times: Vec<GaugeTime>,
    values: Vec<f32>,
}

impl Gauge {
    /// Create an empty gauge able to hold `capacity` observations before its
    /// first growth.
    pub fn new(header: GaugeHeader, instrument: Instrument, capacity: usize) -> Self {
        Gauge {
            header,
            instrument,
            capacity,
            times: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity * instrument.bin_count()),
        }
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    /// Values per observation; fixed for the gauge's whole life.
    pub fn bin_count(&self) -> usize {
        self.instrument.bin_count()
    }

    /// Number of stored observations.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Observations the store can hold before it grows again.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one observation, growing the store when it is full.
    ///
    /// # Errors
    /// [`GaugeError::BinWidthMismatch`] when `values` does not hold exactly
    /// [`Gauge::bin_count`] entries. The gauge is unchanged in that case.
    pub fn append(&mut self, time: GaugeTime, values: &[f32]) -> Result<(), GaugeError> {
        let expected = self.bin_count();
        if values.len() != expected {
            return Err(GaugeError::BinWidthMismatch {
                expected,
                found: values.len(),
            });
        }
        if self.times.len() >= self.capacity {
            self.grow();
        }
        self.times.push(time);
        self.values.extend_from_slice(values);
        Ok(())
    }

    fn grow(&mut self) {
        let capacity = self.capacity + GROWTH_INCREMENT;
        self.times.reserve_exact(capacity - self.times.len());
        self.values
            .reserve_exact(capacity * self.bin_count() - self.values.len());
        debug!(
            "Gauge {} ({}): capacity {} -> {}",
            self.header.name, self.header.network, self.capacity, capacity
        );
        self.capacity = capacity;
    }

    /// Trim the store to the `len` observations actually consumed.
    ///
    /// Capacity is left as is. A `len` at or beyond the current length is a
    /// no-op.
    pub fn finalize(&mut self, len: usize) {
        if len < self.times.len() {
            self.times.truncate(len);
            self.values.truncate(len * self.bin_count());
        }
    }

    /// Timestamps of all observations, in store order.
    pub fn times(&self) -> &[GaugeTime] {
        &self.times
    }

    pub fn observation(&self, index: usize) -> Option<Observation<'_>> {
        let time = *self.times.get(index)?;
        let width = self.bin_count();
        let values = &self.values[index * width..(index + 1) * width];
        Some(Observation { time, values })
    }

    /// Iterate observations in store order.
    pub fn observations(&self) -> impl Iterator<Item = Observation<'_>> + '_ {
        self.times
            .iter()
            .zip(self.values.chunks_exact(self.bin_count()))
            .map(|(&time, values)| Observation { time, values })
    }

    /// Copy of this gauge whose observation `i` is this gauge's `order[i]`.
    ///
    /// `order` must be a permutation of `0..self.len()`.
    pub(crate) fn permuted(&self, order: &[usize]) -> Gauge {
        let width = self.bin_count();
        let mut copy = Gauge {
            header: self.header.clone(),
            instrument: self.instrument,
            capacity: self.len(),
            times: Vec::with_capacity(order.len()),
            values: Vec::with_capacity(order.len() * width),
        };
        for &index in order {
            copy.times.push(self.times[index]);
            copy.values
                .extend_from_slice(&self.values[index * width..(index + 1) * width]);
        }
        copy
    }
}
