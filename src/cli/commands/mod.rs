//! CLI command implementations.
//!
//! Each command is implemented in its own module with a `run` function
//! that handles the command logic.

pub mod analyze;
pub mod bill;
pub mod config;
pub mod evaluate;
pub mod import;
pub mod schema;
pub mod trip;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::cli::Cli;
use crate::config::{default_config_path, Config};
use crate::error::{FootprintError, Result};
use crate::store::RecordStore;

/// Load the configuration the CLI should use.
///
/// `--config` wins; otherwise the global file merged with `.footprint.toml`
/// from the working directory.
pub fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from(path),
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| FootprintError::io("Failed to read current directory", e))?;
            Config::load_for_project(&cwd)
        }
    }
}

/// Path of the config file `config` subcommands read and write.
pub fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path(),
    }
}

/// Open the record store from `--db` or the configured path.
pub fn open_store(cli: &Cli, config: &Config) -> Result<RecordStore> {
    let path = match &cli.db {
        Some(path) => path.clone(),
        None => config.store.database_path()?,
    };
    debug!(path = %path.display(), "Opening record store");
    RecordStore::open(path)
}

/// Resolve the active user id.
pub fn user_id(cli: &Cli, config: &Config) -> String {
    cli.user
        .clone()
        .unwrap_or_else(|| config.store.default_user.clone())
}

/// Parse a point in time given on the command line.
///
/// Accepts RFC 3339, a bare `YYYY-MM-DD` (midnight UTC), or a duration
/// ago relative to `now` (`"90min"`, `"2days"`).
pub fn parse_instant(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    if let Ok(ago) = humantime::parse_duration(raw) {
        let ago = chrono::Duration::from_std(ago).map_err(|e| FootprintError::InvalidArgument {
            name: "time".to_string(),
            reason: e.to_string(),
        })?;
        return Ok(now - ago);
    }
    Err(FootprintError::InvalidArgument {
        name: "time".to_string(),
        reason: format!("'{raw}' is not RFC 3339, YYYY-MM-DD, or a duration like '2days'"),
    })
}

/// Parse an optional `--now`/`--at` value, defaulting to the current time.
pub fn instant_or_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    let now = Utc::now();
    match raw {
        Some(raw) => parse_instant(raw, now),
        None => Ok(now),
    }
}

/// Shorten an id for display.
#[must_use]
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
