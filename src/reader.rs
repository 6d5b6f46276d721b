//! # Gauge File Readers
//!
//! Turns one raw gauge file into one populated [`Gauge`]. The complex builder
//! consumes anything implementing [`GaugeSource`]; [`GaugeFile`] is the
//! file-backed implementation and picks its parser from the build's
//! [`Instrument`].
//!
//! ## Rain Gauge Minute Files
//!
//! One header of 13 fields followed by one record per observation:
//!
//! ```text
//! GMIN MELB KSC 7 KSC07 TIP 1.0 28.52 -80.65 MELB 45.2 12.5 3.0
//! 1998 32 14 5 0 2.4
//! 1998 32 14 6 0 3.1
//! ```
//!
//! Header: product, GV site, network, gauge number, name, type, resolution
//! (min), lat, lon, radar, range (km), azimuth (deg), elevation (m).
//! Record: year, day of year, hour, minute, second, rain rate.
//!
//! ## Disdrometer Files
//!
//! One header of 10 fields, then per observation `year jday HHMM` followed by
//! twenty integer drop counts, which may wrap onto following lines:
//!
//! ```text
//! 1 DSD01 KSC DSD 1.0 28.52 -80.65 3.0 45.2 12.5
//! 1998 32 1405 0 0 3 9 14 11 7 4 2 1 0 0 0 0 0 0 0 0 0 0
//! ```
//!
//! Header: gauge number, name, network, type, resolution, lat, lon, elevation,
//! range, azimuth. Seconds are always zero.
//!
//! Both formats are whitespace-delimited token streams; line breaks only
//! matter for error messages.

use crate::gauge::{Gauge, GaugeError, GaugeHeader};
use crate::{GaugeTime, Instrument};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Provisional capacity of a freshly read gauge: one day of minute samples
/// plus headroom.
pub const INITIAL_CAPACITY: usize = 2500;

const GMIN_HEADER_FIELDS: usize = 13;

/// Errors that can occur while producing a gauge from a source.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The file could not be opened or read
    #[error("cannot read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    /// A token is missing or malformed
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A record did not fit the gauge's bin width
    #[error(transparent)]
    Gauge(#[from] GaugeError),
}

/// Anything that can produce one populated gauge.
///
/// `describe` names the source in log lines and errors.
pub trait GaugeSource {
    fn read(&self) -> Result<Gauge, ReadError>;

    fn describe(&self) -> String;
}

impl<S: GaugeSource + ?Sized> GaugeSource for &S {
    fn read(&self) -> Result<Gauge, ReadError> {
        (**self).read()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: GaugeSource + ?Sized> GaugeSource for Box<S> {
    fn read(&self) -> Result<Gauge, ReadError> {
        (**self).read()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// A raw gauge file on disk.
#[derive(Clone, Debug)]
pub struct GaugeFile {
    pub path: PathBuf,
    pub instrument: Instrument,
}

impl GaugeFile {
    pub fn new<P: AsRef<Path>>(path: P, instrument: Instrument) -> Self {
        GaugeFile {
            path: path.as_ref().to_path_buf(),
            instrument,
        }
    }
}

impl GaugeSource for GaugeFile {
    fn read(&self) -> Result<Gauge, ReadError> {
        let text = fs::read_to_string(&self.path).map_err(|error| ReadError::Io {
            path: self.path.clone(),
            error,
        })?;
        let gauge = match self.instrument {
            Instrument::RainGauge => parse_gmin(&text)?,
            Instrument::Disdrometer => parse_disdro(&text)?,
        };
        debug!(
            "{}: gauge {} of network {}, {} observations",
            self.path.display(),
            gauge.header.name,
            gauge.header.network,
            gauge.len()
        );
        Ok(gauge)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Whitespace token stream that remembers which line each token came from.
struct Tokens<'a> {
    tokens: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let tokens = text
            .lines()
            .enumerate()
            .flat_map(|(index, line)| line.split_whitespace().map(move |t| (index + 1, t)))
            .collect();
        Tokens { tokens, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Line of the next token, or of the last token at end of input.
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map_or(1, |&(line, _)| line)
    }

    fn next_str(&mut self, what: &str) -> Result<&'a str, ReadError> {
        let line = self.line();
        let &(_, token) = self.tokens.get(self.pos).ok_or_else(|| ReadError::Parse {
            line,
            message: format!("unexpected end of input, expected {what}"),
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn next<T: FromStr>(&mut self, what: &str) -> Result<T, ReadError> {
        let line = self.line();
        let token = self.next_str(what)?;
        token.parse().map_err(|_| ReadError::Parse {
            line,
            message: format!("invalid {what} '{token}'"),
        })
    }
}

/// Timestamp of the record starting on `line`. The clock must be a valid
/// time of day and the second within `[0, 60)`.
fn record_time(
    line: usize,
    year: i32,
    jday: u32,
    hour: u32,
    minute: u32,
    sec: f32,
) -> Result<GaugeTime, ReadError> {
    let parse_error = |message: String| ReadError::Parse { line, message };
    if hour >= 24 || minute >= 60 {
        return Err(parse_error(format!("invalid time of day {hour}:{minute}")));
    }
    if !(0.0..60.0).contains(&sec) {
        return Err(parse_error(format!("invalid second {sec}")));
    }
    GaugeTime::from_jday(year, jday, hour, minute, sec)
        .ok_or_else(|| parse_error(format!("day of year {jday} out of range for {year}")))
}

/// Parse a rain gauge minute file.
pub fn parse_gmin(text: &str) -> Result<Gauge, ReadError> {
    let mut tokens = Tokens::new(text);
    if tokens.tokens.len() < GMIN_HEADER_FIELDS {
        return Err(ReadError::Parse {
            line: 1,
            message: format!("header needs {GMIN_HEADER_FIELDS} fields"),
        });
    }

    let product_id = tokens.next_str("product id")?.to_string();
    let gv_site = tokens.next_str("GV site")?.to_string();
    let network = tokens.next_str("network")?.to_string();
    let number = tokens.next("gauge number")?;
    let name = tokens.next_str("gauge name")?.to_string();
    let kind = tokens.next_str("gauge type")?.to_string();
    let resolution = tokens.next("resolution")?;
    let latitude = tokens.next("latitude")?;
    let longitude = tokens.next("longitude")?;
    let radar = tokens.next_str("radar")?.to_string();
    let range = tokens.next("range")?;
    let azimuth = tokens.next("azimuth")?;
    let elevation = tokens.next("elevation")?;

    let header = GaugeHeader {
        network,
        number,
        name,
        kind,
        product_id: Some(product_id),
        gv_site: Some(gv_site),
        radar: Some(radar),
        resolution,
        latitude,
        longitude,
        range,
        azimuth,
        elevation,
    };
    let mut gauge = Gauge::new(header, Instrument::RainGauge, INITIAL_CAPACITY);

    let mut records = 0;
    while !tokens.is_empty() {
        let line = tokens.line();
        let year = tokens.next("year")?;
        let jday = tokens.next("day of year")?;
        let hour = tokens.next("hour")?;
        let minute = tokens.next("minute")?;
        let sec = tokens.next("second")?;
        let rate: f32 = tokens.next("rain rate")?;
        let time = record_time(line, year, jday, hour, minute, sec)?;
        gauge.append(time, &[rate])?;
        records += 1;
    }
    gauge.finalize(records);
    Ok(gauge)
}

/// Parse a disdrometer file.
pub fn parse_disdro(text: &str) -> Result<Gauge, ReadError> {
    let mut tokens = Tokens::new(text);

    let number = tokens.next("gauge number")?;
    let name = tokens.next_str("gauge name")?.to_string();
    let network = tokens.next_str("network")?.to_string();
    let kind = tokens.next_str("gauge type")?.to_string();
    let resolution = tokens.next("resolution")?;
    let latitude = tokens.next("latitude")?;
    let longitude = tokens.next("longitude")?;
    let elevation = tokens.next("elevation")?;
    let range = tokens.next("range")?;
    let azimuth = tokens.next("azimuth")?;

    let header = GaugeHeader {
        network,
        number,
        name,
        kind,
        resolution,
        latitude,
        longitude,
        range,
        azimuth,
        elevation,
        ..GaugeHeader::default()
    };
    let mut gauge = Gauge::new(header, Instrument::Disdrometer, INITIAL_CAPACITY);
    let mut counts = [0f32; crate::DISDROMETER_BINS];

    let mut records = 0;
    while !tokens.is_empty() {
        let line = tokens.line();
        let year = tokens.next("year")?;
        let jday = tokens.next("day of year")?;
        let clock_line = tokens.line();
        let clock = tokens.next_str("HHMM clock")?;
        let (hour, minute) = parse_clock(clock).ok_or_else(|| ReadError::Parse {
            line: clock_line,
            message: format!("invalid HHMM clock '{clock}'"),
        })?;
        for count in counts.iter_mut() {
            *count = tokens.next::<i32>("drop count")? as f32;
        }
        let time = record_time(line, year, jday, hour, minute, 0.0)?;
        gauge.append(time, &counts)?;
        records += 1;
    }
    gauge.finalize(records);
    Ok(gauge)
}

/// Split a 1-4 digit `HHMM` clock, left-padded with zeros, into hour and
/// minute.
fn parse_clock(clock: &str) -> Option<(u32, u32)> {
    if clock.is_empty() || clock.len() > 4 || !clock.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = clock.parse().ok()?;
    let (hour, minute) = (value / 100, value % 100);
    (hour < 24 && minute < 60).then_some((hour, minute))
}
