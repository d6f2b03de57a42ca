//! Export functionality for insights.
//!
//! This module provides various export formats:
//! - Plain text: terminal report
//! - Markdown: human-readable report with tables
//! - JSON: lossless structured data
//! - CSV: the 7-day projection as a table
//!
//! plus the JSON Schema of the exported insight.

mod csv;
mod json;
mod markdown;
pub mod schema;
mod text;

pub use csv::*;
pub use json::*;
pub use markdown::*;
pub use schema::{
    insight_schema, insight_schema_string, recommendation_context_schema, recommendation_context_schema_string,
};
pub use text::*;

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{FootprintError, Result};
use crate::model::Insight;
use crate::util::AtomicFile;

/// Common export options shared across formats.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Include the recommendation strings.
    pub include_recommendations: bool,
    /// Include the mined trip patterns.
    pub include_patterns: bool,
    /// Include the 7-day projection.
    pub include_projection: bool,
    /// Decimal places for kg values.
    pub precision: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_recommendations: true,
            include_patterns: true,
            include_projection: true,
            precision: 1,
        }
    }
}

impl ExportOptions {
    /// Forecast numbers only.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            include_recommendations: false,
            include_patterns: false,
            include_projection: false,
            precision: 1,
        }
    }

    /// Builder: include recommendations.
    #[must_use]
    pub fn with_recommendations(mut self, include: bool) -> Self {
        self.include_recommendations = include;
        self
    }

    /// Builder: include patterns.
    #[must_use]
    pub fn with_patterns(mut self, include: bool) -> Self {
        self.include_patterns = include;
        self
    }

    /// Builder: decimal places for kg values.
    #[must_use]
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Format a kg value with the configured precision.
    #[must_use]
    pub fn kg(&self, value: f64) -> String {
        format!("{value:.prec$}", prec = self.precision)
    }
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Plain text report.
    Text,
    /// Markdown report.
    Markdown,
    /// Compact JSON.
    Json,
    /// Pretty-printed JSON.
    JsonPretty,
    /// CSV projection.
    Csv,
}

impl ExportFormat {
    /// Get the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Json | Self::JsonPretty => "json",
            Self::Csv => "csv",
        }
    }

    /// Parse a format name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "markdown" | "md" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            "json-pretty" | "jsonpretty" => Some(Self::JsonPretty),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Trait for insight exporters.
pub trait Exporter {
    /// Write an insight to the writer.
    fn export_insight<W: Write>(&self, insight: &Insight, writer: &mut W, options: &ExportOptions) -> Result<()>;
}

fn export_with<W: Write>(
    insight: &Insight,
    format: ExportFormat,
    writer: &mut W,
    options: &ExportOptions,
) -> Result<()> {
    match format {
        ExportFormat::Text => TextExporter::new().export_insight(insight, writer, options),
        ExportFormat::Markdown => MarkdownExporter::new().export_insight(insight, writer, options),
        ExportFormat::Json => JsonExporter::new().export_insight(insight, writer, options),
        ExportFormat::JsonPretty => JsonExporter::new()
            .pretty(true)
            .export_insight(insight, writer, options),
        ExportFormat::Csv => CsvExporter::new().export_insight(insight, writer, options),
    }
}

/// Export an insight to a file, replacing it atomically.
pub fn export_to_file(
    insight: &Insight,
    path: impl AsRef<Path>,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<()> {
    let path = path.as_ref();
    let mut atomic = AtomicFile::create(path)?;
    let mut writer = std::io::BufWriter::new(atomic.writer());

    export_with(insight, format, &mut writer, options)?;

    writer.flush().map_err(|e| {
        FootprintError::io(format!("Failed to flush output file: {}", path.display()), e)
    })?;
    // Release the borrow on the temp file before renaming it
    drop(writer);

    atomic.finish()
}

/// Export an insight to a string.
pub fn export_to_string(insight: &Insight, format: ExportFormat, options: &ExportOptions) -> Result<String> {
    let mut buffer = Vec::new();
    export_with(insight, format, &mut buffer, options)?;
    String::from_utf8(buffer).map_err(|e| FootprintError::export(format!("Output is not UTF-8: {e}")))
}

/// Format a timestamp for reports.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub(crate) fn write_err(e: std::io::Error) -> FootprintError {
    FootprintError::io("Failed to write export output", e)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Markdown.extension(), "md");
        assert_eq!(ExportFormat::JsonPretty.extension(), "json");
        assert_eq!(ExportFormat::Csv.extension(), "csv");
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!(ExportFormat::parse("MD"), Some(ExportFormat::Markdown));
        assert_eq!(ExportFormat::parse("txt"), Some(ExportFormat::Text));
        assert_eq!(ExportFormat::parse("xml"), None);
    }

    #[test]
    fn test_export_options_builders() {
        let opts = ExportOptions::default()
            .with_recommendations(false)
            .with_precision(3);
        assert!(!opts.include_recommendations);
        assert_eq!(opts.kg(1.23456), "1.235");
    }

    #[test]
    fn test_export_to_file_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("insight.json");
        let insight = fixtures::insight();

        export_to_file(&insight, &path, ExportFormat::Json, &ExportOptions::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Insight = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, insight);
    }

    #[test]
    fn test_format_timestamp() {
        let insight = fixtures::insight();
        assert_eq!(format_timestamp(&insight.generated_at), "2025-03-31 12:00:00 UTC");
    }
}
