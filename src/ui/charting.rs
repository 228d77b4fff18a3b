use ratatui::style::Color;

use crate::zone::Zone;

pub const NO_DATA_MESSAGE: &str = "No time recorded to chart.";

/// Arena colors shared by the zone rows and the chart
pub fn zone_color(zone: Zone) -> Color {
    match zone {
        Zone::Corner => Color::Red,
        Zone::Lateral => Color::Rgb(135, 206, 235),
        Zone::Center => Color::Rgb(34, 139, 34),
    }
}

/// Share of the pie held by each zone, in percent of recorded zone time
pub fn pie_slices(series: &[(Zone, f64)]) -> Vec<(Zone, f64)> {
    let total: f64 = series.iter().map(|(_, v)| v).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    series
        .iter()
        .map(|&(zone, v)| (zone, v / total * 100.0))
        .collect()
}

/// Bar height for a slice; bars take integer values, so keep one decimal
pub fn bar_value(percent: f64) -> u64 {
    (percent * 10.0).round().max(0.0) as u64
}

pub fn format_slice(percent: f64) -> String {
    format!("{percent:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pie_slices_normalize() {
        let slices = pie_slices(&[(Zone::Corner, 4.0), (Zone::Lateral, 6.0)]);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].0, Zone::Corner);
        assert!((slices[0].1 - 40.0).abs() < 1e-9);
        assert_eq!(slices[1].0, Zone::Lateral);
        assert!((slices[1].1 - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_pie_slices_empty() {
        assert!(pie_slices(&[]).is_empty());
    }

    #[test]
    fn test_bar_value_and_label() {
        assert_eq!(bar_value(33.333), 333);
        assert_eq!(format_slice(33.333), "33.3%");
    }
}
