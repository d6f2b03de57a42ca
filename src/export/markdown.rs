//! Markdown export for insights.
//!
//! Generates a human-readable report suitable for sharing or pasting into
//! notes.

use std::io::Write;

use crate::error::Result;
use crate::model::Insight;
use crate::util::format_signed;

use super::{format_timestamp, ExportOptions, Exporter};

/// Markdown exporter for insights.
#[derive(Debug, Clone)]
pub struct MarkdownExporter {
    /// Include the report header.
    include_header: bool,
    /// Heading text.
    title: String,
}

impl Default for MarkdownExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownExporter {
    /// Create a new Markdown exporter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            include_header: true,
            title: "Weekly Footprint Insight".to_string(),
        }
    }

    /// Include the report header.
    #[must_use]
    pub fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Set the heading text.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn write_header<W: Write>(&self, writer: &mut W, insight: &Insight) -> Result<()> {
        if !self.include_header {
            return Ok(());
        }
        writeln!(writer, "# {}", self.title)?;
        writeln!(writer)?;
        writeln!(writer, "_Generated {}_", format_timestamp(&insight.generated_at))?;
        writeln!(writer)?;
        writeln!(writer, "> {}", insight.summary)?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_forecast<W: Write>(&self, writer: &mut W, insight: &Insight, options: &ExportOptions) -> Result<()> {
        writeln!(writer, "## Forecast")?;
        writeln!(writer)?;
        writeln!(writer, "| Metric | Value |")?;
        writeln!(writer, "|--------|-------|")?;
        writeln!(writer, "| Weekly forecast | {} kg |", options.kg(insight.weekly_forecast))?;
        writeln!(writer, "| Optimized target | {} kg |", options.kg(insight.optimized_forecast))?;
        writeln!(writer, "| Travel | {} kg |", options.kg(insight.breakdown.travel))?;
        writeln!(writer, "| Energy | {} kg |", options.kg(insight.breakdown.energy))?;
        writeln!(writer, "| Risk tier | {} |", insight.risk_tier)?;
        writeln!(writer, "| Method | {} |", insight.method)?;
        writeln!(writer, "| Confidence | {:.0}% |", insight.confidence)?;
        writeln!(writer, "| Cluster | {} |", insight.cluster)?;
        writeln!(
            writer,
            "| Trend | {} ({} kg/day) |",
            insight.trend.direction,
            format_signed(insight.trend.slope)
        )?;
        writeln!(writer)?;

        if options.include_projection {
            writeln!(writer, "### Daily projection")?;
            writeln!(writer)?;
            writeln!(writer, "| Day | kg CO2e |")?;
            writeln!(writer, "|-----|---------|")?;
            for day in &insight.daily_projection {
                writeln!(writer, "| {} | {} |", day.day, options.kg(day.value))?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    fn write_patterns<W: Write>(&self, writer: &mut W, insight: &Insight, options: &ExportOptions) -> Result<()> {
        let patterns = &insight.patterns;
        writeln!(writer, "## Patterns")?;
        writeln!(writer)?;

        if patterns.total_trips == 0 {
            writeln!(writer, "No trips recorded.")?;
            writeln!(writer)?;
            return Ok(());
        }

        writeln!(
            writer,
            "- **Trips:** {} ({} km total, {} km average)",
            patterns.total_trips,
            options.kg(patterns.total_distance_km),
            options.kg(patterns.average_distance_km)
        )?;
        if !patterns.peak_days.is_empty() {
            writeln!(writer, "- **Peak days:** {}", patterns.peak_days.join(", "))?;
        }
        if let Some(vehicle) = &patterns.most_used_vehicle {
            writeln!(writer, "- **Most used vehicle:** {vehicle}")?;
        }
        let tiers = &patterns.distance_tiers;
        writeln!(
            writer,
            "- **Distance tiers:** {} short, {} medium, {} long",
            tiers.short, tiers.medium, tiers.long
        )?;
        writeln!(writer)?;

        if !patterns.vehicle_usage.is_empty() {
            writeln!(writer, "| Vehicle | Trips | Share |")?;
            writeln!(writer, "|---------|-------|-------|")?;
            for usage in &patterns.vehicle_usage {
                writeln!(writer, "| {} | {} | {:.0}% |", usage.vehicle, usage.count, usage.share * 100.0)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

impl Exporter for MarkdownExporter {
    fn export_insight<W: Write>(&self, insight: &Insight, writer: &mut W, options: &ExportOptions) -> Result<()> {
        self.write_header(writer, insight)?;
        self.write_forecast(writer, insight, options)?;

        if options.include_patterns {
            self.write_patterns(writer, insight, options)?;
        }

        if !insight.anomalies.is_empty() {
            writeln!(writer, "## Anomalies")?;
            writeln!(writer)?;
            for flag in &insight.anomalies {
                writeln!(writer, "- `{flag}`")?;
            }
            writeln!(writer)?;
        }

        if options.include_recommendations && !insight.recommendations.is_empty() {
            writeln!(writer, "## Recommendations")?;
            writeln!(writer)?;
            for (i, rec) in insight.recommendations.iter().enumerate() {
                writeln!(writer, "{}. {rec}", i + 1)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;

    fn render(options: &ExportOptions) -> String {
        let mut out = Vec::new();
        MarkdownExporter::new()
            .export_insight(&fixtures::insight(), &mut out, options)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_markdown_sections() {
        let md = render(&ExportOptions::default());
        assert!(md.starts_with("# Weekly Footprint Insight\n"));
        assert!(md.contains("| Weekly forecast | 45.5 kg |"));
        assert!(md.contains("| Risk tier | High |"));
        assert!(md.contains("| Trend | stable (+0.00 kg/day) |"));
        assert!(md.contains("| Sun | 6.5 |"));
        assert!(md.contains("- **Peak days:** Mon, Sat"));
        assert!(md.contains("| Car | 6 | 75% |"));
        assert!(md.contains("- `weekend_heavy_travel`"));
        assert!(md.contains("3. Third tip."));
    }

    #[test]
    fn test_markdown_minimal() {
        let md = render(&ExportOptions::minimal());
        assert!(!md.contains("## Patterns"));
        assert!(!md.contains("## Recommendations"));
        assert!(!md.contains("### Daily projection"));
        assert!(md.contains("## Anomalies"));
    }

    #[test]
    fn test_markdown_custom_title_without_header() {
        let mut out = Vec::new();
        MarkdownExporter::new()
            .with_title("Ignored")
            .with_header(false)
            .export_insight(&fixtures::insight(), &mut out, &ExportOptions::default())
            .unwrap();
        let md = String::from_utf8(out).unwrap();
        assert!(md.starts_with("## Forecast"));
    }
}
