//! Schema command implementation.

use crate::cli::{Cli, SchemaArgs};
use crate::error::Result;
use crate::export::{insight_schema_string, recommendation_context_schema_string};

/// Run the schema command.
pub fn run(_cli: &Cli, args: &SchemaArgs) -> Result<()> {
    let schema = if args.context {
        recommendation_context_schema_string()?
    } else {
        insight_schema_string()?
    };
    println!("{schema}");
    Ok(())
}
