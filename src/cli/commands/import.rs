//! Import command implementation.

use crate::cli::{Cli, ImportArgs, OutputFormat};
use crate::error::{FootprintError, Result};

use super::{load_config, open_store, user_id};

/// Run the import command.
pub fn run(cli: &Cli, args: &ImportArgs) -> Result<()> {
    if !args.file.exists() {
        return Err(FootprintError::FileNotFound {
            path: args.file.clone(),
        });
    }

    let config = load_config(cli)?;
    let mut store = open_store(cli, &config)?;
    let user = user_id(cli, &config);

    let summary = store.import_json(&args.file, &user, &config.analysis)?;

    match cli.effective_output() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => println!(
            "Imported {} trip(s) and {} bill(s) for '{user}' ({} skipped as duplicates)",
            summary.trips, summary.bills, summary.skipped
        ),
    }
    Ok(())
}
