//! JSON Schema definitions for exported data.
//!
//! Schemas are derived from the Rust types, so they cannot drift from what
//! the JSON exporter writes.

use schemars::{schema_for, Schema};

use crate::error::{FootprintError, Result};
use crate::recommend::RecommendationContext;

/// Schema of an exported [`Insight`](crate::model::Insight).
#[must_use]
pub fn insight_schema() -> Schema {
    schema_for!(crate::model::Insight)
}

/// Schema of the context sent to an external recommendation generator.
#[must_use]
pub fn recommendation_context_schema() -> Schema {
    schema_for!(RecommendationContext)
}

fn to_pretty(schema: &Schema) -> Result<String> {
    serde_json::to_string_pretty(schema).map_err(|e| FootprintError::SerializationError {
        context: "Failed to serialize schema".to_string(),
        source: e,
    })
}

/// Pretty-printed insight schema.
pub fn insight_schema_string() -> Result<String> {
    to_pretty(&insight_schema())
}

/// Pretty-printed recommendation context schema.
pub fn recommendation_context_schema_string() -> Result<String> {
    to_pretty(&recommendation_context_schema())
}
