//! # Gauge Site Lists
//!
//! Each network has a site list at `<top_dir>/sitelist/<network>_loc.dat`
//! giving every gauge's position in degrees, minutes and seconds:
//!
//! ```text
//! 0007 KSC07  -80 39 12.0  28 31 12.0
//! ```
//!
//! Fields: site id, name, longitude (deg min sec), latitude (deg min sec).
//! Trailing fields are ignored. Lines whose first eight fields do not parse
//! are skipped, which covers headers and comments.
//!
//! Loading a site list also places each gauge relative to the network's
//! radar with [`range_azimuth`].

use crate::complex::MAX_NETWORK_GAUGES;
use crate::registry::RegistryError;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Earth radius used for ranges, in km.
const EARTH_RADIUS_KM: f64 = 6378.0;

/// Position of one gauge from a site list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GaugeSite {
    pub site_id: String,
    pub name: String,
    pub latitude: f32,
    pub longitude: f32,
    /// Great-circle distance from the radar in km
    pub range: f32,
    /// Bearing from the radar in degrees clockwise from north
    pub azimuth: f32,
}

/// Range (km) and azimuth (deg) of a point as seen from the radar.
///
/// Azimuth is 90 or 270 for a point on the radar's latitude, otherwise it is
/// derived from the mid-latitude-scaled longitude offset and folded into
/// `[0, 360)`.
pub fn range_azimuth(radar_lat: f32, radar_lon: f32, lat: f32, lon: f32) -> (f32, f32) {
    let la1 = (radar_lat as f64).to_radians();
    let la2 = (lat as f64).to_radians();
    let lon1 = (radar_lon as f64).to_radians();
    let lon2 = (lon as f64).to_radians();

    let cos_arc = (la1.sin() * la2.sin() + la1.cos() * la2.cos() * (lon2 - lon1).cos())
        .clamp(-1.0, 1.0);
    let range = EARTH_RADIUS_KM * cos_arc.acos();

    let azimuth = if la2 == la1 {
        if lon2 - lon1 >= 0.0 {
            90.0
        } else {
            270.0
        }
    } else {
        let az = ((((la1 + la2) / 2.0).cos() * (lon2 - lon1)) / (la2 - la1))
            .atan()
            .to_degrees();
        if la2 - la1 < 0.0 {
            az + 180.0
        } else if lon2 - lon1 < 0.0 {
            az + 360.0
        } else {
            az
        }
    };

    (range as f32, azimuth as f32)
}

/// Degrees, minutes and seconds to decimal degrees, signed by the degrees.
fn dms(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    if degrees.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    }
}

fn parse_line(line: &str) -> Option<(String, String, f64, f64)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[site_id, name, ref coords @ ..] = &fields[..] else {
        return None;
    };
    if coords.len() < 6 {
        return None;
    }
    let numbers = coords[..6]
        .iter()
        .map(|t| t.parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>()?;
    let longitude = dms(numbers[0], numbers[1], numbers[2]);
    let latitude = dms(numbers[3], numbers[4], numbers[5]);
    Some((site_id.to_string(), name.to_string(), latitude, longitude))
}

/// Parse a site list for `network` and place each gauge relative to the
/// radar at (`radar_lat`, `radar_lon`).
pub fn parse_site_list(
    text: &str,
    network: &str,
    radar_lat: f32,
    radar_lon: f32,
) -> Result<Vec<GaugeSite>, RegistryError> {
    let mut sites = Vec::new();
    for (site_id, name, latitude, longitude) in text.lines().filter_map(parse_line) {
        if sites.len() >= MAX_NETWORK_GAUGES {
            return Err(RegistryError::TooManyGauges {
                network: network.to_string(),
                max: MAX_NETWORK_GAUGES,
            });
        }
        let (latitude, longitude) = (latitude as f32, longitude as f32);
        let (range, azimuth) = range_azimuth(radar_lat, radar_lon, latitude, longitude);
        sites.push(GaugeSite {
            site_id,
            name,
            latitude,
            longitude,
            range,
            azimuth,
        });
    }
    Ok(sites)
}

/// Load `<top_dir>/sitelist/<network>_loc.dat`.
pub fn load_site_list<P: AsRef<Path>>(
    top_dir: P,
    network: &str,
    radar_lat: f32,
    radar_lon: f32,
) -> Result<Vec<GaugeSite>, RegistryError> {
    let path = top_dir
        .as_ref()
        .join("sitelist")
        .join(format!("{network}_loc.dat"));
    let text = fs::read_to_string(&path).map_err(|error| RegistryError::Io { path, error })?;
    parse_site_list(&text, network, radar_lat, radar_lon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MELB: (f32, f32) = (28.1133, -80.6542);

    fn close(a: f32, b: f32, tolerance: f32) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn test_range_azimuth_cardinal_directions() {
        let (lat, lon) = MELB;

        let (range, azimuth) = range_azimuth(lat, lon, lat + 1.0, lon);
        assert!(close(range, 111.3, 0.2), "range {range}");
        assert!(close(azimuth, 0.0, 1e-3), "azimuth {azimuth}");

        let (_, azimuth) = range_azimuth(lat, lon, lat, lon + 0.5);
        assert_eq!(azimuth, 90.0);

        let (_, azimuth) = range_azimuth(lat, lon, lat, lon - 0.5);
        assert_eq!(azimuth, 270.0);

        let (_, azimuth) = range_azimuth(lat, lon, lat - 1.0, lon);
        assert!(close(azimuth, 180.0, 1e-3), "azimuth {azimuth}");
    }

    #[test]
    fn test_range_azimuth_quadrants() {
        let (lat, lon) = MELB;
        let (_, ne) = range_azimuth(lat, lon, lat + 0.5, lon + 0.5);
        let (_, se) = range_azimuth(lat, lon, lat - 0.5, lon + 0.5);
        let (_, sw) = range_azimuth(lat, lon, lat - 0.5, lon - 0.5);
        let (_, nw) = range_azimuth(lat, lon, lat + 0.5, lon - 0.5);
        assert!((0.0..90.0).contains(&ne), "ne {ne}");
        assert!((90.0..180.0).contains(&se), "se {se}");
        assert!((180.0..270.0).contains(&sw), "sw {sw}");
        assert!((270.0..360.0).contains(&nw), "nw {nw}");
    }

    #[test]
    fn test_range_to_self_is_zero() {
        let (lat, lon) = MELB;
        let (range, _) = range_azimuth(lat, lon, lat, lon);
        assert!(range.abs() < 1e-3);
    }

    #[test]
    fn test_dms_keeps_sign_of_degrees() {
        assert!((dms(28.0, 30.0, 36.0) - 28.51).abs() < 1e-9);
        assert!((dms(-80.0, 30.0, 0.0) + 80.5).abs() < 1e-9);
        assert!((dms(-0.0, 30.0, 0.0) + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_site_list_skips_unparsable_lines() {
        let text = "\
Site Name   LonD LonM LonS LatD LatM LatS
0007 KSC07  -80 39 12.0  28 31 12.0
0008 KSC08  -80 40 0.0  28 30 0.0 extra
0009 KSC09  -80 41 0.0  28 29 0.0
";
        let sites = parse_site_list(text, "KSC", MELB.0, MELB.1).unwrap();
        assert_eq!(sites.len(), 3);
        assert_eq!(sites[0].site_id, "0007");
        assert_eq!(sites[1].site_id, "0008", "trailing fields are ignored");
        assert!(close(sites[1].latitude, 28.5, 1e-4));
        assert_eq!(sites[2].name, "KSC09");
        assert!(close(sites[0].latitude, 28.52, 1e-4));
        assert!(close(sites[0].longitude, -80.6533, 1e-4));
        assert!(sites[0].range > 40.0 && sites[0].range < 50.0);
    }

    #[test]
    fn test_parse_site_list_caps_gauges() {
        let text: String = (0..=MAX_NETWORK_GAUGES)
            .map(|n| format!("{n:04} G{n} -80 39 0 28 31 0\n"))
            .collect();
        assert!(matches!(
            parse_site_list(&text, "KSC", MELB.0, MELB.1),
            Err(RegistryError::TooManyGauges { .. })
        ));
    }

    #[test]
    fn test_load_site_list_from_top_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sitelist")).unwrap();
        fs::write(
            dir.path().join("sitelist/KSC_loc.dat"),
            "0007 KSC07 -80 39 12.0 28 31 12.0\n",
        )
        .unwrap();

        let sites = load_site_list(dir.path(), "KSC", MELB.0, MELB.1).unwrap();
        assert_eq!(sites.len(), 1);
        assert!(matches!(
            load_site_list(dir.path(), "STJ", MELB.0, MELB.1),
            Err(RegistryError::Io { .. })
        ));
    }
}
