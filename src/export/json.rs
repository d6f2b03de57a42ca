//! JSON export.
//!
//! The insight serializes losslessly; options only drop whole sections so
//! the output always still parses as an [`Insight`] when nothing is omitted.

use std::io::Write;

use serde_json::Value;

use crate::error::{FootprintError, Result};
use crate::model::Insight;

use super::{write_err, ExportOptions, Exporter};

/// JSON exporter.
#[derive(Debug, Clone, Default)]
pub struct JsonExporter {
    pretty: bool,
}

impl JsonExporter {
    /// Create a new JSON exporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty-printing.
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn to_value(insight: &Insight, options: &ExportOptions) -> Result<Value> {
        let mut value = serde_json::to_value(insight).map_err(|e| FootprintError::SerializationError {
            context: "Failed to serialize insight".to_string(),
            source: e,
        })?;

        if let Some(map) = value.as_object_mut() {
            if !options.include_recommendations {
                map.remove("recommendations");
                map.remove("recommendation_source");
            }
            if !options.include_patterns {
                map.remove("patterns");
            }
            if !options.include_projection {
                map.remove("daily_projection");
            }
        }
        Ok(value)
    }
}

impl Exporter for JsonExporter {
    fn export_insight<W: Write>(&self, insight: &Insight, writer: &mut W, options: &ExportOptions) -> Result<()> {
        let value = Self::to_value(insight, options)?;
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &value)
        } else {
            serde_json::to_writer(&mut *writer, &value)
        };
        result.map_err(|e| FootprintError::SerializationError {
            context: "Failed to write JSON".to_string(),
            source: e,
        })?;
        writeln!(writer).map_err(write_err)
    }
}
