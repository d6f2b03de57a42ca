//! Analyze command implementation.
//!
//! Reads the user's snapshot, builds the insight and renders it.

use tracing::{debug, warn};

use crate::cli::{AnalyzeArgs, Cli, OutputFormat};
use crate::error::Result;
use crate::export::{export_to_file, export_to_string, ExportFormat, ExportOptions};
use crate::insight::InsightEngine;

use super::{instant_or_now, load_config, open_store, user_id};

/// Run the analyze command.
pub async fn run(cli: &Cli, args: &AnalyzeArgs) -> Result<()> {
    let config = load_config(cli)?;
    let store = open_store(cli, &config)?;
    let user = user_id(cli, &config);
    let now = instant_or_now(args.now.as_deref())?;

    let snapshot = store.snapshot(&user)?;
    if snapshot.is_empty() {
        warn!(user = %user, "No records for user; the insight will use defaults");
    }

    let engine = if args.offline {
        InsightEngine::local(config)
    } else {
        InsightEngine::from_config(config)?
    };
    let insight = engine.generate(&snapshot, now).await;

    let format = if cli.effective_output() == OutputFormat::Json {
        ExportFormat::JsonPretty
    } else {
        args.format.into()
    };
    let options = if args.minimal {
        ExportOptions::minimal()
    } else {
        ExportOptions::default()
    };

    match &args.output_file {
        Some(path) => {
            export_to_file(&insight, path, format, &options)?;
            debug!(path = %path.display(), "Insight written");
            if !cli.quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
        None => print!("{}", export_to_string(&insight, format, &options)?),
    }
    Ok(())
}
