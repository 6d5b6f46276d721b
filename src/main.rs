//! # Gauge Complex Application Entry Point
//!
//! Builds one gauge complex from the gauge files named on the command line,
//! using the radar database under the configured data directory, and prints
//! it as a text report, a per-network merge summary, or JSON.

use anyhow::{bail, Context};
use env_logger::Env;
use gauge_complex_lib::config::{Config, ConfigError, CONFIG_FILE};
use gauge_complex_lib::granule::validate_granule;
use gauge_complex_lib::merge::merge_complex;
use gauge_complex_lib::reader::GaugeFile;
use gauge_complex_lib::registry::RadarDatabase;
use gauge_complex_lib::report::{format_merge_summary, print_complex};
use gauge_complex_lib::{GaugeComplex, Instrument};
use log::{info, warn};
use std::env;
use std::path::PathBuf;

const USAGE: &str = "usage: gauge-complex [--disdro] [--merge] [--json] [--config PATH] FILE...";

/// Parsed command line.
struct Args {
    disdro: bool,
    merge: bool,
    json: bool,
    config: Option<PathBuf>,
    files: Vec<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        disdro: false,
        merge: false,
        json: false,
        config: None,
        files: Vec::new(),
    };
    let mut argv = env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--disdro" => args.disdro = true,
            "--merge" => args.merge = true,
            "--json" => args.json = true,
            "--config" => {
                let path = argv.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            _ => args.files.push(PathBuf::from(arg)),
        }
    }
    Ok(args)
}

/// Load the configuration before logging is up, so the log level it names
/// can take effect. Problems are returned for logging once it is.
fn load_config(path: Option<&PathBuf>) -> (Config, Option<ConfigError>) {
    let path = path.cloned().unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    match Config::try_load_from_path(&path) {
        Ok(config) => (config, None),
        Err(ConfigError::Missing(_)) => (Config::default(), None),
        Err(e) => (Config::default(), Some(e)),
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    let (config, config_error) = load_config(args.config.as_ref());

    env_logger::Builder::from_env(Env::default().default_filter_or(config.logging.level.as_str()))
        .init();
    if let Some(e) = config_error {
        warn!("{e}; using default configuration");
    }

    if args.files.is_empty() {
        bail!("no gauge files given\n{USAGE}");
    }

    let instrument = if args.disdro {
        Instrument::Disdrometer
    } else {
        config.build.instrument
    };
    let registry = RadarDatabase::from_top_dir(&config.data.top_dir).with_context(|| {
        format!(
            "loading radar database under {}",
            config.data.top_dir.display()
        )
    })?;

    let sources: Vec<GaugeFile> = args
        .files
        .iter()
        .map(|path| GaugeFile::new(path, instrument))
        .collect();
    let complex = if config.build.concurrent_reads {
        GaugeComplex::build_concurrent(&sources, &registry)
    } else {
        GaugeComplex::build(&sources, &registry)
    }
    .context("building gauge complex")?;

    info!(
        "Built gauge complex for {}: {} networks, {} gauges",
        complex.radar_site().unwrap_or("-"),
        complex.len(),
        complex.gauge_count()
    );
    if let Err(e) = validate_granule(&complex, config.granule.max_obs_per_gauge) {
        warn!("Complex does not fit one granule: {e}");
    }

    if args.json {
        let json = serde_json::to_string_pretty(&complex).context("serializing complex")?;
        println!("{json}");
    } else if args.merge {
        for (network, instants) in complex.networks().iter().zip(merge_complex(&complex)) {
            println!("{}", format_merge_summary(network, &instants));
        }
    } else {
        print_complex(&complex);
    }

    Ok(())
}
