//! # Text Reports
//!
//! Plain text renderings of a complex for terminal output: one block per
//! gauge listing its header, and a one-line-per-network summary of a merge.

use crate::complex::{GaugeComplex, GaugeNetwork};
use crate::merge::Instant;
use std::fmt;

/// Every gauge of a network as a block of header fields.
pub struct NetworkReport<'a>(pub &'a GaugeNetwork);

impl fmt::Display for NetworkReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let network = self.0;
        let total = network.len();
        writeln!(
            f,
            "Network {} ({}, {} gauges, {})",
            network.name,
            network.location.as_deref().unwrap_or("-"),
            total,
            network.instrument()
        )?;
        for (i, gauge) in network.gauges().iter().enumerate() {
            let h = &gauge.header;
            writeln!(f, "------------< Gauge # {} of {} >------------", i + 1, total)?;
            writeln!(f, "Name:         {}", h.name)?;
            writeln!(f, "Number:       {}", h.number)?;
            writeln!(f, "Type:         {}", h.kind)?;
            writeln!(f, "Lat, Lon:     {:.4}, {:.4}", h.latitude, h.longitude)?;
            writeln!(f, "Range, Az:    {:.1} km, {:.1} deg", h.range, h.azimuth)?;
            writeln!(f, "Elevation:    {:.1} m", h.elevation)?;
            writeln!(f, "Observations: {}", gauge.len())?;
            if let (Some(first), Some(last)) = (gauge.times().first(), gauge.times().last()) {
                writeln!(f, "First, Last:  {first} .. {last}")?;
            }
        }
        Ok(())
    }
}

/// The whole complex, networks in arrival order.
pub struct ComplexReport<'a>(pub &'a GaugeComplex);

impl fmt::Display for ComplexReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let complex = self.0;
        writeln!(
            f,
            "Gauge complex for radar {}: {} networks, {} gauges",
            complex.radar_site().unwrap_or("-"),
            complex.len(),
            complex.gauge_count()
        )?;
        for network in complex.networks() {
            writeln!(f)?;
            write!(f, "{}", NetworkReport(network))?;
        }
        Ok(())
    }
}

/// Render every gauge of `network` as a block of header fields.
pub fn format_network(network: &GaugeNetwork) -> String {
    NetworkReport(network).to_string()
}

/// Render the whole complex.
pub fn format_complex(complex: &GaugeComplex) -> String {
    ComplexReport(complex).to_string()
}

/// One summary line for a merged network: instant count, time span and how
/// many instants had every gauge reporting.
pub fn format_merge_summary(network: &GaugeNetwork, instants: &[Instant]) -> String {
    let complete = instants
        .iter()
        .filter(|i| i.present().count() == i.readings.len())
        .count();
    match (instants.first(), instants.last()) {
        (Some(first), Some(last)) => format!(
            "{}: {} instants from {} to {}, {} with all {} gauges",
            network.name,
            instants.len(),
            first.time,
            last.time,
            complete,
            network.len()
        ),
        _ => format!("{}: no observations", network.name),
    }
}

/// Print the complex to stdout.
pub fn print_complex(complex: &GaugeComplex) {
    print!("{}", ComplexReport(complex));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauge::{Gauge, GaugeHeader};
    use crate::merge::merge_by_time;
    use crate::reader::{GaugeSource, ReadError};
    use crate::registry::StaticRegistry;
    use crate::{GaugeTime, Instrument};

    struct Minutes(i32, Vec<u32>);

    impl GaugeSource for Minutes {
        fn read(&self) -> Result<Gauge, ReadError> {
            let header = GaugeHeader {
                network: "KSC".to_string(),
                number: self.0,
                name: format!("KSC{:02}", self.0),
                kind: "TIP".to_string(),
                gv_site: Some("MELB".to_string()),
                ..GaugeHeader::default()
            };
            let mut gauge = Gauge::new(header, Instrument::RainGauge, 4);
            for &m in &self.1 {
                gauge.append(GaugeTime::from_jday(1998, 32, 14, m, 0.0).unwrap(), &[1.0])?;
            }
            Ok(gauge)
        }

        fn describe(&self) -> String {
            format!("KSC{:02}", self.0)
        }
    }

    fn complex() -> GaugeComplex {
        let registry = StaticRegistry::new().with("KSC", "MELB");
        GaugeComplex::build(
            [Minutes(7, vec![5, 6]), Minutes(8, vec![6])],
            &registry,
        )
        .unwrap()
    }

    #[test]
    fn test_format_complex_lists_every_gauge() {
        let text = format_complex(&complex());
        assert!(text.starts_with("Gauge complex for radar MELB: 1 networks, 2 gauges"));
        assert!(text.contains("Network KSC (MELB, 2 gauges, raingauge)"));
        assert!(text.contains("------------< Gauge # 1 of 2 >------------"));
        assert!(text.contains("------------< Gauge # 2 of 2 >------------"));
        assert!(text.contains("Name:         KSC08"));
        assert!(text.contains("Observations: 2"));
    }

    #[test]
    fn test_complex_report_embeds_network_reports() {
        let complex = complex();
        let network = format_network(&complex.networks()[0]);
        assert!(network.starts_with("Network KSC"));
        assert!(format_complex(&complex).ends_with(&network));
        assert_eq!(ComplexReport(&complex).to_string(), format_complex(&complex));
    }

    #[test]
    fn test_merge_summary_counts_complete_instants() {
        let complex = complex();
        let network = &complex.networks()[0];
        let instants = merge_by_time(network);
        let line = format_merge_summary(network, &instants);
        assert!(line.starts_with("KSC: 2 instants from 1998 032"), "{line}");
        assert!(line.ends_with("1 with all 2 gauges"), "{line}");
        assert_eq!(format_merge_summary(network, &[]), "KSC: no observations");
    }
}
