//! # Radar Site Registry
//!
//! Maps a gauge network name to the ground radar site the network belongs
//! to. The complex builder only sees the [`SiteRegistry`] trait; this module
//! also provides the two implementations the crate uses:
//!
//! - [`StaticRegistry`]: an in-memory name → site map
//! - [`RadarDatabase`]: the whitespace-separated radar database file kept
//!   under `<top_dir>/sitelist/radar.dat`
//!
//! ## Radar Database Format
//!
//! ```text
//! # gv_site network radar  lat     lon
//! MELB      KSC     MELB   28.1133 -80.6542
//! MELB      STJ     MELB   28.1133 -80.6542
//! ```
//!
//! Lines starting with `#` are comments. Blank lines are ignored.

use crate::complex::MAX_GAUGE_NETWORKS;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or querying site information.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The network name has no entry in the registry
    #[error("gauge network {0} not found in site registry")]
    NotFound(String),

    /// No network in the registry is attached to this radar
    #[error("radar {0} not found in site registry")]
    UnknownRadar(String),

    /// A database or site list file could not be read
    #[error("cannot read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    /// A database line is malformed
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A radar lists more networks than a complex can hold
    #[error("radar {radar} has more than {max} gauge networks")]
    TooManyNetworks { radar: String, max: usize },

    /// A site list holds more gauges than a network can hold
    #[error("site list for {network} has more than {max} gauges")]
    TooManyGauges { network: String, max: usize },
}

/// Resolves a gauge network to the radar site it is attached to.
///
/// Implementations may perform I/O; any failure, including timeouts, must be
/// reported as an error rather than a placeholder site.
pub trait SiteRegistry {
    fn lookup(&self, network: &str) -> Result<String, RegistryError>;
}

impl<R: SiteRegistry + ?Sized> SiteRegistry for &R {
    fn lookup(&self, network: &str) -> Result<String, RegistryError> {
        (**self).lookup(network)
    }
}

impl SiteRegistry for HashMap<String, String> {
    fn lookup(&self, network: &str) -> Result<String, RegistryError> {
        self.get(network)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(network.to_string()))
    }
}

/// In-memory registry, handy for tests and for callers that already hold the
/// network → site table.
///
/// # Example
/// ```
/// use gauge_complex_lib::registry::{SiteRegistry, StaticRegistry};
///
/// let registry = StaticRegistry::new().with("KSC", "MELB");
/// assert_eq!(registry.lookup("KSC").unwrap(), "MELB");
/// assert!(registry.lookup("DAR").is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct StaticRegistry {
    sites: HashMap<String, String>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, network: &str, site: &str) -> Self {
        self.insert(network, site);
        self
    }

    pub fn insert(&mut self, network: &str, site: &str) {
        self.sites.insert(network.to_string(), site.to_string());
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for StaticRegistry {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        StaticRegistry {
            sites: iter
                .into_iter()
                .map(|(network, site)| (network.into(), site.into()))
                .collect(),
        }
    }
}

impl SiteRegistry for StaticRegistry {
    fn lookup(&self, network: &str) -> Result<String, RegistryError> {
        self.sites.lookup(network)
    }
}

/// One line of the radar database.
#[derive(Clone, Debug, PartialEq)]
pub struct RadarEntry {
    pub gv_site: String,
    pub network: String,
    pub radar: String,
    pub latitude: f32,
    pub longitude: f32,
}

/// Networks attached to one radar, with the radar's position.
#[derive(Clone, Debug, PartialEq)]
pub struct RadarNetworks {
    pub networks: Vec<String>,
    pub latitude: f32,
    pub longitude: f32,
}

/// The parsed radar database.
#[derive(Clone, Debug, Default)]
pub struct RadarDatabase {
    entries: Vec<RadarEntry>,
}

impl RadarDatabase {
    /// Load `<top_dir>/sitelist/radar.dat`.
    pub fn from_top_dir<P: AsRef<Path>>(top_dir: P) -> Result<Self, RegistryError> {
        Self::load(top_dir.as_ref().join("sitelist").join("radar.dat"))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|error| RegistryError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let database = Self::parse(&text)?;
        debug!(
            "Loaded {} radar database entries from {}",
            database.entries.len(),
            path.display()
        );
        Ok(database)
    }

    pub fn parse(text: &str) -> Result<Self, RegistryError> {
        let mut entries = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let &[gv_site, network, radar, lat, lon, ..] = &fields[..] else {
                return Err(RegistryError::Parse {
                    line: index + 1,
                    message: format!("expected 5 fields, found {}", fields.len()),
                });
            };
            let coordinate = |text: &str| {
                text.parse::<f32>().map_err(|_| RegistryError::Parse {
                    line: index + 1,
                    message: format!("invalid coordinate '{text}'"),
                })
            };
            entries.push(RadarEntry {
                gv_site: gv_site.to_string(),
                network: network.to_string(),
                radar: radar.to_string(),
                latitude: coordinate(lat)?,
                longitude: coordinate(lon)?,
            });
        }
        Ok(RadarDatabase { entries })
    }

    pub fn entries(&self) -> &[RadarEntry] {
        &self.entries
    }

    /// All networks attached to `radar`, in database order, with the radar
    /// position taken from its first entry.
    pub fn networks_for_radar(&self, radar: &str) -> Result<RadarNetworks, RegistryError> {
        let matching: Vec<&RadarEntry> = self.entries.iter().filter(|e| e.radar == radar).collect();
        let first = matching
            .first()
            .ok_or_else(|| RegistryError::UnknownRadar(radar.to_string()))?;
        if matching.len() > MAX_GAUGE_NETWORKS {
            return Err(RegistryError::TooManyNetworks {
                radar: radar.to_string(),
                max: MAX_GAUGE_NETWORKS,
            });
        }
        Ok(RadarNetworks {
            networks: matching.iter().map(|e| e.network.clone()).collect(),
            latitude: first.latitude,
            longitude: first.longitude,
        })
    }
}

impl SiteRegistry for RadarDatabase {
    fn lookup(&self, network: &str) -> Result<String, RegistryError> {
        self.entries
            .iter()
            .find(|e| e.network == network)
            .map(|e| e.radar.clone())
            .ok_or_else(|| RegistryError::NotFound(network.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const RADAR_DAT: &str = "\
# Ground validation radar database
# gv_site network radar lat lon
MELB KSC MELB 28.1133 -80.6542
MELB STJ MELB 28.1133 -80.6542

DARW DAR DARW -12.2491 131.0444
";

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let db = RadarDatabase::parse(RADAR_DAT).unwrap();
        assert_eq!(db.entries().len(), 3);
        assert_eq!(db.entries()[2].gv_site, "DARW");
        assert_eq!(db.entries()[2].latitude, -12.2491);
    }

    #[test]
    fn test_lookup_returns_radar_for_network() {
        let db = RadarDatabase::parse(RADAR_DAT).unwrap();
        assert_eq!(db.lookup("STJ").unwrap(), "MELB");
        assert_eq!(db.lookup("DAR").unwrap(), "DARW");
        assert!(matches!(db.lookup("XXX"), Err(RegistryError::NotFound(n)) if n == "XXX"));
    }

    #[test]
    fn test_networks_for_radar() {
        let db = RadarDatabase::parse(RADAR_DAT).unwrap();
        let melb = db.networks_for_radar("MELB").unwrap();
        assert_eq!(melb.networks, vec!["KSC", "STJ"]);
        assert_eq!(melb.latitude, 28.1133);
        assert!(matches!(
            db.networks_for_radar("KWAJ"),
            Err(RegistryError::UnknownRadar(_))
        ));
    }

    #[test]
    fn test_networks_for_radar_enforces_network_limit() {
        let text: String = (0..=MAX_GAUGE_NETWORKS)
            .map(|n| format!("MELB N{n} MELB 28.0 -80.0\n"))
            .collect();
        let db = RadarDatabase::parse(&text).unwrap();
        assert!(matches!(
            db.networks_for_radar("MELB"),
            Err(RegistryError::TooManyNetworks { max, .. }) if max == MAX_GAUGE_NETWORKS
        ));
    }

    #[test]
    fn test_parse_rejects_short_and_malformed_lines() {
        let short = RadarDatabase::parse("MELB KSC MELB 28.1\n").unwrap_err();
        assert!(matches!(short, RegistryError::Parse { line: 1, .. }));

        let bad = RadarDatabase::parse("# header\nMELB KSC MELB north -80.6\n").unwrap_err();
        assert!(matches!(bad, RegistryError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_from_top_dir_reads_sitelist_radar_dat() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sitelist")).unwrap();
        fs::write(dir.path().join("sitelist/radar.dat"), RADAR_DAT).unwrap();

        let db = RadarDatabase::from_top_dir(dir.path()).unwrap();
        assert_eq!(db.lookup("KSC").unwrap(), "MELB");

        let missing = RadarDatabase::from_top_dir(dir.path().join("nope")).unwrap_err();
        assert!(matches!(missing, RegistryError::Io { .. }));
    }

    #[test]
    fn test_static_registry_and_hashmap_agree() {
        let map: HashMap<String, String> =
            [("N1".to_string(), "SITE1".to_string())].into_iter().collect();
        let registry: StaticRegistry = [("N1", "SITE1")].into_iter().collect();
        assert_eq!(map.lookup("N1").unwrap(), registry.lookup("N1").unwrap());
        assert!(registry.lookup("N2").is_err());
    }
}
