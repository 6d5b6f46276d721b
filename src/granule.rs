//! # Granule Checks
//!
//! A downstream product file holds one granule: 24 hours of data from one
//! complex, at most one observation per minute per gauge. The writer of that
//! file owns these limits; this module gives it the checks and the
//! per-network descriptors it needs without touching the complex.

use crate::complex::GaugeComplex;
use serde::Serialize;
use thiserror::Error;

/// Observations one gauge may contribute to a 24-hour granule.
pub const MAX_OBS_PER_GRANULE: usize = 1440;

/// Longest network name a product descriptor carries.
pub const DESCRIPTOR_NAME_LEN: usize = 21;

/// Why a complex cannot be written as one granule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GranuleError {
    #[error("gauge complex has no networks")]
    Empty,

    #[error("gauge {gauge} in network {network} has {nobs} observations, limit is {max}")]
    TooManyObservations {
        network: String,
        gauge: String,
        nobs: usize,
        max: usize,
    },

    #[error("gauge {gauge} in network {network}: observation {index} is on day {found}, granule day is {expected}")]
    MixedDays {
        network: String,
        gauge: String,
        index: usize,
        expected: u32,
        found: u32,
    },
}

/// Product a complex is written as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ProductKind {
    /// Rain gauge rain rates (2A-56)
    RainGauge,
    /// Disdrometer drop size distributions (2A-57)
    Disdrometer,
}

impl ProductKind {
    pub fn product_id(self) -> &'static str {
        match self {
            ProductKind::RainGauge => "2A56",
            ProductKind::Disdrometer => "2A57",
        }
    }
}

/// Summary of one network as listed in a product header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkDescriptor {
    pub name: String,
    pub valid_sensors: usize,
    pub network_id: usize,
}

/// Product kind of `complex`, decided by its first network's gauge type.
pub fn product_kind(complex: &GaugeComplex) -> Result<ProductKind, GranuleError> {
    let first = complex.networks().first().ok_or(GranuleError::Empty)?;
    if first.kind == "DSD" {
        Ok(ProductKind::Disdrometer)
    } else {
        Ok(ProductKind::RainGauge)
    }
}

/// One descriptor per network, in network order.
pub fn network_descriptors(complex: &GaugeComplex) -> Vec<NetworkDescriptor> {
    complex
        .networks()
        .iter()
        .enumerate()
        .map(|(network_id, network)| NetworkDescriptor {
            name: network.name.chars().take(DESCRIPTOR_NAME_LEN).collect(),
            valid_sensors: network.len(),
            network_id,
        })
        .collect()
}

/// Check that every gauge fits in one granule: at most `max_obs`
/// observations, all on the day of its first observation.
pub fn validate_granule(complex: &GaugeComplex, max_obs: usize) -> Result<ProductKind, GranuleError> {
    let kind = product_kind(complex)?;
    for (network, gauge) in complex.gauges() {
        if gauge.len() > max_obs {
            return Err(GranuleError::TooManyObservations {
                network: network.name.clone(),
                gauge: gauge.header.name.clone(),
                nobs: gauge.len(),
                max: max_obs,
            });
        }
        let Some(first) = gauge.times().first() else {
            continue;
        };
        if let Some((index, time)) = gauge
            .times()
            .iter()
            .enumerate()
            .find(|(_, t)| t.jday != first.jday)
        {
            return Err(GranuleError::MixedDays {
                network: network.name.clone(),
                gauge: gauge.header.name.clone(),
                index,
                expected: first.jday,
                found: time.jday,
            });
        }
    }
    Ok(kind)
}
