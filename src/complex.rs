//! # Gauge Complex Assembly
//!
//! A [`GaugeComplex`] holds every gauge network attached to one ground radar
//! site. [`GaugeComplex::build`] is the only way to obtain one: it reads the
//! sources in order, files each gauge under its network, and checks every
//! newly seen network against the site registry.
//!
//! ## Invariants
//! - at most [`MAX_GAUGE_NETWORKS`] networks per complex
//! - at most [`MAX_NETWORK_GAUGES`] gauges per network
//! - every network resolves to the radar site of the first network added
//! - every gauge of a network has the network's bin width
//!
//! ## Rollback
//!
//! The partially built complex lives in a builder private to this module. Any
//! error drops the builder together with every network and gauge gathered so
//! far, so a caller either gets a complete, valid complex or nothing.

use crate::gauge::Gauge;
use crate::reader::{GaugeSource, ReadError};
use crate::registry::{RegistryError, SiteRegistry};
use crate::Instrument;
use log::{debug, error, info};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

/// Maximum gauge networks attached to one radar site.
pub const MAX_GAUGE_NETWORKS: usize = 16;

/// Maximum gauges in one network.
pub const MAX_NETWORK_GAUGES: usize = 300;

/// Reasons a build is abandoned. None of them are retried.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A source failed to produce a gauge
    #[error("error reading gauge source {origin}")]
    Source {
        origin: String,
        #[source]
        error: ReadError,
    },

    /// The site registry has no radar for a network
    #[error("gauge network {network} has no radar site")]
    UnknownNetwork {
        network: String,
        #[source]
        error: RegistryError,
    },

    /// A network belongs to a different radar than the complex
    #[error("network {network} belongs to radar site {site}, not to this complex's {expected}")]
    SiteMismatch {
        network: String,
        site: String,
        expected: String,
    },

    /// Adding another network would exceed [`MAX_GAUGE_NETWORKS`]
    #[error("exceeded max number of gauge networks: {max}")]
    TooManyNetworks { max: usize },

    /// Adding another gauge would exceed [`MAX_NETWORK_GAUGES`]
    #[error("exceeded max number of gauges: {max} in network {network}")]
    TooManyGauges { network: String, max: usize },

    /// A gauge's bin width differs from the rest of its network
    #[error("gauge {gauge} has {found} bins, network {network} holds {expected}-bin gauges")]
    BinWidthMismatch {
        network: String,
        gauge: String,
        expected: usize,
        found: usize,
    },
}

/// Gauges of one network, in arrival order.
#[derive(Clone, Debug, Serialize)]
pub struct GaugeNetwork {
    /// Network name (KSC, STJ, ...)
    pub name: String,
    /// Network location tag, taken from the first gauge's GV site
    pub location: Option<String>,
    /// Gauge type tag, taken from the first gauge
    pub kind: String,
    instrument: Instrument,
    gauges: Vec<Gauge>,
}

impl GaugeNetwork {
    fn new(first: &Gauge) -> Self {
        GaugeNetwork {
            name: first.header.network.clone(),
            location: first.header.gv_site.clone(),
            kind: first.header.kind.clone(),
            instrument: first.instrument(),
            gauges: Vec::new(),
        }
    }

    fn push(&mut self, gauge: Gauge) -> Result<(), BuildError> {
        if gauge.instrument() != self.instrument {
            return Err(BuildError::BinWidthMismatch {
                network: self.name.clone(),
                gauge: gauge.header.name.clone(),
                expected: self.instrument.bin_count(),
                found: gauge.bin_count(),
            });
        }
        if self.gauges.len() >= MAX_NETWORK_GAUGES {
            return Err(BuildError::TooManyGauges {
                network: self.name.clone(),
                max: MAX_NETWORK_GAUGES,
            });
        }
        self.gauges.push(gauge);
        Ok(())
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn gauges(&self) -> &[Gauge] {
        &self.gauges
    }

    /// Number of gauges in the network.
    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    /// Find a gauge by its number within the network.
    pub fn gauge(&self, number: i32) -> Option<&Gauge> {
        self.gauges.iter().find(|g| g.header.number == number)
    }
}

/// All gauge networks attached to one radar site.
#[derive(Clone, Debug, Serialize)]
pub struct GaugeComplex {
    radar_site: Option<String>,
    networks: Vec<GaugeNetwork>,
}

impl GaugeComplex {
    /// Assemble a complex from `sources`, read strictly in order.
    ///
    /// The first network added fixes the radar site, so reordering the same
    /// sources can turn a valid build into a [`BuildError::SiteMismatch`].
    /// An empty source list yields an empty complex with no radar site.
    ///
    /// # Example
    /// ```
    /// use gauge_complex_lib::{GaugeComplex, Gauge, GaugeHeader, Instrument};
    /// use gauge_complex_lib::reader::{GaugeSource, ReadError};
    /// use gauge_complex_lib::registry::StaticRegistry;
    ///
    /// struct Fixed(&'static str);
    ///
    /// impl GaugeSource for Fixed {
    ///     fn read(&self) -> Result<Gauge, ReadError> {
    ///         let header = GaugeHeader { network: self.0.to_string(), ..GaugeHeader::default() };
    ///         Ok(Gauge::new(header, Instrument::RainGauge, 0))
    ///     }
    ///     fn describe(&self) -> String {
    ///         self.0.to_string()
    ///     }
    /// }
    ///
    /// let registry = StaticRegistry::new().with("KSC", "MELB").with("STJ", "MELB");
    /// let complex = GaugeComplex::build([Fixed("KSC"), Fixed("STJ"), Fixed("KSC")], &registry).unwrap();
    /// assert_eq!(complex.radar_site(), Some("MELB"));
    /// assert_eq!(complex.len(), 2);
    /// assert_eq!(complex.gauge_count(), 3);
    /// ```
    pub fn build<I, S, R>(sources: I, registry: &R) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: GaugeSource,
        R: SiteRegistry + ?Sized,
    {
        let mut builder = ComplexBuilder::new(registry);
        for source in sources {
            info!("Reading gauge source: {}", source.describe());
            let gauge = source.read().map_err(|error| BuildError::Source {
                origin: source.describe(),
                error,
            });
            builder.add(gauge).map_err(abandon)?;
        }
        Ok(builder.finish())
    }

    /// Like [`GaugeComplex::build`], but reads all sources in parallel first.
    ///
    /// Gauges are still assembled in source order, so site adoption and every
    /// error are the same as for a sequential build. All sources are read even
    /// when an early one fails.
    pub fn build_concurrent<S, R>(sources: &[S], registry: &R) -> Result<Self, BuildError>
    where
        S: GaugeSource + Sync,
        R: SiteRegistry + ?Sized,
    {
        let gauges: Vec<Result<Gauge, BuildError>> = sources
            .par_iter()
            .map(|source| {
                source.read().map_err(|error| BuildError::Source {
                    origin: source.describe(),
                    error,
                })
            })
            .collect();
        info!("Read {} gauge sources", gauges.len());

        let mut builder = ComplexBuilder::new(registry);
        for gauge in gauges {
            builder.add(gauge).map_err(abandon)?;
        }
        Ok(builder.finish())
    }

    /// Radar site shared by every network; `None` only for an empty complex.
    pub fn radar_site(&self) -> Option<&str> {
        self.radar_site.as_deref()
    }

    pub fn networks(&self) -> &[GaugeNetwork] {
        &self.networks
    }

    /// Number of networks.
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn network(&self, name: &str) -> Option<&GaugeNetwork> {
        self.networks.iter().find(|n| n.name == name)
    }

    /// Total gauges over all networks.
    pub fn gauge_count(&self) -> usize {
        self.networks.iter().map(GaugeNetwork::len).sum()
    }

    /// Every gauge with its network, networks first, both in arrival order.
    pub fn gauges(&self) -> impl Iterator<Item = (&GaugeNetwork, &Gauge)> + '_ {
        self.networks
            .iter()
            .flat_map(|network| network.gauges.iter().map(move |gauge| (network, gauge)))
    }
}

fn abandon(err: BuildError) -> BuildError {
    error!("Discarding partial gauge complex: {err}");
    err
}

/// In-progress complex. Never leaves this module.
struct ComplexBuilder<'r, R: ?Sized> {
    registry: &'r R,
    radar_site: Option<String>,
    networks: Vec<GaugeNetwork>,
}

impl<'r, R: SiteRegistry + ?Sized> ComplexBuilder<'r, R> {
    fn new(registry: &'r R) -> Self {
        ComplexBuilder {
            registry,
            radar_site: None,
            networks: Vec::new(),
        }
    }

    fn add(&mut self, gauge: Result<Gauge, BuildError>) -> Result<(), BuildError> {
        let gauge = gauge?;
        let index = match self
            .networks
            .iter()
            .position(|n| n.name == gauge.header.network)
        {
            Some(index) => index,
            None => self.open_network(&gauge)?,
        };
        self.networks[index].push(gauge)
    }

    /// Resolve and register the network of `gauge`, returning its index.
    fn open_network(&mut self, gauge: &Gauge) -> Result<usize, BuildError> {
        let name = &gauge.header.network;
        let site = self
            .registry
            .lookup(name)
            .map_err(|error| BuildError::UnknownNetwork {
                network: name.clone(),
                error,
            })?;

        if let Some(expected) = &self.radar_site {
            if *expected != site {
                return Err(BuildError::SiteMismatch {
                    network: name.clone(),
                    site,
                    expected: expected.clone(),
                });
            }
        }
        if self.networks.len() >= MAX_GAUGE_NETWORKS {
            return Err(BuildError::TooManyNetworks {
                max: MAX_GAUGE_NETWORKS,
            });
        }

        if self.radar_site.is_none() {
            info!("Gauge complex anchored to radar site {site} by network {name}");
            self.radar_site = Some(site);
        }
        debug!("Creating gauge network: {name}");
        self.networks.push(GaugeNetwork::new(gauge));
        Ok(self.networks.len() - 1)
    }

    fn finish(self) -> GaugeComplex {
        GaugeComplex {
            radar_site: self.radar_site,
            networks: self.networks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauge::GaugeHeader;
    use crate::registry::StaticRegistry;

    struct Stub {
        network: &'static str,
        instrument: Instrument,
    }

    impl GaugeSource for Stub {
        fn read(&self) -> Result<Gauge, ReadError> {
            let header = GaugeHeader {
                network: self.network.to_string(),
                kind: "TIP".to_string(),
                ..GaugeHeader::default()
            };
            Ok(Gauge::new(header, self.instrument, 0))
        }

        fn describe(&self) -> String {
            format!("stub:{}", self.network)
        }
    }

    fn rain(network: &'static str) -> Stub {
        Stub {
            network,
            instrument: Instrument::RainGauge,
        }
    }

    #[test]
    fn test_networks_keep_arrival_order() {
        let registry = StaticRegistry::new().with("B", "S").with("A", "S");
        let complex =
            GaugeComplex::build([rain("B"), rain("A"), rain("B"), rain("B")], &registry).unwrap();
        let names: Vec<&str> = complex.networks().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(complex.network("B").unwrap().len(), 3);
        assert_eq!(complex.gauges().count(), 4);
    }

    #[test]
    fn test_empty_build_has_no_site() {
        let complex = GaugeComplex::build(Vec::<Stub>::new(), &StaticRegistry::new()).unwrap();
        assert!(complex.is_empty());
        assert_eq!(complex.radar_site(), None);
    }

    #[test]
    fn test_mixed_bin_width_in_network_is_rejected() {
        let registry = StaticRegistry::new().with("KSC", "MELB");
        let sources = [
            rain("KSC"),
            Stub {
                network: "KSC",
                instrument: Instrument::Disdrometer,
            },
        ];
        let err = GaugeComplex::build(sources, &registry).unwrap_err();
        assert!(matches!(
            err,
            BuildError::BinWidthMismatch {
                expected: 1,
                found: 20,
                ..
            }
        ));
    }

    #[test]
    fn test_concurrent_build_matches_sequential() {
        let registry = StaticRegistry::new().with("A", "S").with("B", "S");
        let sources = vec![rain("A"), rain("B"), rain("A")];
        let sequential = GaugeComplex::build(&sources, &registry).unwrap();
        let concurrent = GaugeComplex::build_concurrent(&sources, &registry).unwrap();
        assert_eq!(sequential.len(), concurrent.len());
        assert_eq!(sequential.radar_site(), concurrent.radar_site());
        for (a, b) in sequential.networks().iter().zip(concurrent.networks()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.len(), b.len());
        }
    }

    #[test]
    fn test_error_messages_name_the_culprit() {
        let registry = StaticRegistry::new().with("KSC", "MELB").with("DAR", "DARW");
        let err = GaugeComplex::build([rain("KSC"), rain("DAR")], &registry).unwrap_err();
        assert_eq!(
            err.to_string(),
            "network DAR belongs to radar site DARW, not to this complex's MELB"
        );

        let err = GaugeComplex::build([rain("XYZ")], &registry).unwrap_err();
        assert_eq!(err.to_string(), "gauge network XYZ has no radar site");
        assert!(std::error::Error::source(&err).is_some());
    }
}
