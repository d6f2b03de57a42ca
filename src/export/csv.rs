//! CSV export for spreadsheet analysis.
//!
//! Exports either the 7-day projection or the vehicle usage table.

use std::io::Write;

use crate::error::Result;
use crate::model::Insight;

use super::{ExportOptions, Exporter};

/// CSV export mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvMode {
    /// One row per projected day.
    #[default]
    Projection,
    /// One row per vehicle.
    Vehicles,
}

/// CSV exporter.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    mode: CsvMode,
    include_header: bool,
    delimiter: char,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvExporter {
    /// Create a new CSV exporter for the projection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: CsvMode::Projection,
            include_header: true,
            delimiter: ',',
        }
    }

    /// Set export mode.
    #[must_use]
    pub fn with_mode(mut self, mode: CsvMode) -> Self {
        self.mode = mode;
        self
    }

    /// Include header row.
    #[must_use]
    pub fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Set field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Escape a field value for CSV.
    fn escape(&self, value: &str) -> String {
        let needs_quote = value.contains(self.delimiter)
            || value.contains('"')
            || value.contains('\n')
            || value.contains('\r');
        if needs_quote {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.to_string()
        }
    }

    fn write_row<W: Write>(&self, writer: &mut W, fields: &[String]) -> Result<()> {
        let escaped: Vec<String> = fields.iter().map(|f| self.escape(f)).collect();
        writeln!(writer, "{}", escaped.join(&self.delimiter.to_string()))?;
        Ok(())
    }
}

impl Exporter for CsvExporter {
    fn export_insight<W: Write>(&self, insight: &Insight, writer: &mut W, _options: &ExportOptions) -> Result<()> {
        match self.mode {
            CsvMode::Projection => {
                if self.include_header {
                    self.write_row(writer, &["day".to_string(), "projected_kg".to_string()])?;
                }
                for day in &insight.daily_projection {
                    self.write_row(writer, &[day.day.clone(), format!("{:.2}", day.value)])?;
                }
            }
            CsvMode::Vehicles => {
                if self.include_header {
                    self.write_row(
                        writer,
                        &["vehicle".to_string(), "trips".to_string(), "share".to_string()],
                    )?;
                }
                for usage in &insight.patterns.vehicle_usage {
                    self.write_row(
                        writer,
                        &[
                            usage.vehicle.clone(),
                            usage.count.to_string(),
                            format!("{:.3}", usage.share),
                        ],
                    )?;
                }
            }
        }
        Ok(())
    }
}
