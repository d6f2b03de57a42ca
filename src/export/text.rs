//! Plain text export for insights.
//!
//! This is the terminal report printed by `footprint analyze`.

use std::io::Write;

use crate::error::Result;
use crate::model::Insight;
use crate::util::{format_kg, format_percent, format_signed, sparkline};

use super::{format_timestamp, ExportOptions, Exporter};

/// Plain text exporter for insights.
#[derive(Debug, Clone)]
pub struct TextExporter {
    /// Width of separator lines.
    line_width: usize,
    /// Use separators between sections.
    use_separators: bool,
    /// Separator character.
    separator_char: char,
}

impl Default for TextExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExporter {
    /// Create a new text exporter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            line_width: 60,
            use_separators: true,
            separator_char: '-',
        }
    }

    /// Set the separator width.
    #[must_use]
    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    /// Enable or disable separators.
    #[must_use]
    pub fn with_separators(mut self, use_sep: bool) -> Self {
        self.use_separators = use_sep;
        self
    }

    /// Set the separator character.
    #[must_use]
    pub fn with_separator_char(mut self, c: char) -> Self {
        self.separator_char = c;
        self
    }

    fn write_separator<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.use_separators {
            let line: String = std::iter::repeat(self.separator_char).take(self.line_width).collect();
            writeln!(writer, "{line}")?;
        } else {
            writeln!(writer)?;
        }
        Ok(())
    }
}

impl Exporter for TextExporter {
    fn export_insight<W: Write>(&self, insight: &Insight, writer: &mut W, options: &ExportOptions) -> Result<()> {
        writeln!(writer, "Footprint insight ({})", format_timestamp(&insight.generated_at))?;
        writeln!(writer, "{}", insight.summary)?;
        self.write_separator(writer)?;

        writeln!(
            writer,
            "Weekly forecast:  {} ({} risk)",
            format_kg(insight.weekly_forecast),
            insight.risk_tier
        )?;
        writeln!(writer, "Optimized target: {}", format_kg(insight.optimized_forecast))?;
        writeln!(
            writer,
            "Breakdown:        travel {}, energy {}",
            format_kg(insight.breakdown.travel),
            format_kg(insight.breakdown.energy)
        )?;
        writeln!(writer, "Method:           {}", insight.method)?;
        writeln!(writer, "Confidence:       {}", format_percent(insight.confidence))?;
        writeln!(writer, "Cluster:          {}", insight.cluster)?;
        writeln!(
            writer,
            "Trend:            {} ({} kg/day)",
            insight.trend.direction,
            format_signed(insight.trend.slope)
        )?;

        if options.include_projection && !insight.daily_projection.is_empty() {
            let values: Vec<f64> = insight.daily_projection.iter().map(|d| d.value).collect();
            let days: Vec<&str> = insight.daily_projection.iter().map(|d| d.day.as_str()).collect();
            writeln!(writer, "Next 7 days:      {} ({})", sparkline(&values), days.join(" "))?;
        }

        if options.include_patterns && insight.patterns.total_trips > 0 {
            self.write_separator(writer)?;
            let patterns = &insight.patterns;
            writeln!(
                writer,
                "Trips: {} over {:.1} km",
                patterns.total_trips, patterns.total_distance_km
            )?;
            if !patterns.peak_days.is_empty() {
                writeln!(writer, "Peak days: {}", patterns.peak_days.join(", "))?;
            }
            if let Some(vehicle) = &patterns.most_used_vehicle {
                writeln!(writer, "Most used vehicle: {vehicle}")?;
            }
        }

        if !insight.anomalies.is_empty() {
            self.write_separator(writer)?;
            let tags: Vec<&str> = insight.anomalies.iter().map(|a| a.tag()).collect();
            writeln!(writer, "Anomalies: {}", tags.join(", "))?;
        }

        if options.include_recommendations && !insight.recommendations.is_empty() {
            self.write_separator(writer)?;
            writeln!(writer, "Recommendations:")?;
            for rec in &insight.recommendations {
                writeln!(writer, "  * {rec}")?;
            }
        }
        Ok(())
    }
}
