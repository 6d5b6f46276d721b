//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! gauge-config.toml file: where the site database lives, which instrument a
//! build reads, and the limits a granule must respect.

use crate::granule::MAX_OBS_PER_GRANULE;
use crate::Instrument;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file, relative to the working directory.
pub const CONFIG_FILE: &str = "gauge-config.toml";

/// Errors raised while reading or writing a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no config file at {0:?}")]
    Missing(PathBuf),

    #[error("config IO: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config file format: {0}")]
    Format(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration loaded from gauge-config.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Location of the site database
    pub data: DataConfig,
    /// Complex assembly options
    pub build: BuildConfig,
    /// Limits of one output granule
    pub granule: GranuleConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Site database location
#[derive(Debug, Deserialize, Serialize)]
pub struct DataConfig {
    /// Directory holding `sitelist/radar.dat` and the `<network>_loc.dat` files
    pub top_dir: PathBuf,
}

/// Complex assembly options
#[derive(Debug, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Instrument kind of every input file: "raingauge" or "disdrometer"
    pub instrument: Instrument,
    /// Read input files in parallel before assembling them in order
    pub concurrent_reads: bool,
}

/// Granule limits
#[derive(Debug, Deserialize, Serialize)]
pub struct GranuleConfig {
    /// Observations one gauge may contribute to a 24-hour granule
    pub max_obs_per_gauge: usize,
}

/// Log output
#[derive(Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default `env_logger` filter; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                top_dir: PathBuf::from("/usr/local/trmm/GVBOX/data"),
            },
            build: BuildConfig {
                instrument: Instrument::RainGauge,
                concurrent_reads: false,
            },
            granule: GranuleConfig {
                max_obs_per_gauge: MAX_OBS_PER_GRANULE, // 24 h of minute samples
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from gauge-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_path(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.as_ref().display());
                config
            }
            Err(ConfigError::Missing(_)) => {
                info!("No config file found, using default configuration");
                Self::default()
            }
            Err(e) => {
                warn!("{e}; using default configuration");
                Self::default()
            }
        }
    }

    /// Load configuration from specified path, reporting why it could not be
    /// used instead of falling back.
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::Missing(path.to_path_buf()),
            _ => ConfigError::Io(e),
        })?;
        Ok(toml::from_str::<Config>(&contents)?)
    }

    /// Save current configuration to `path`
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
