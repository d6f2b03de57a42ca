//! Config command implementation.
//!
//! View and modify footprint configuration settings.

use std::path::Path;

use crate::cli::{Cli, ConfigAction, ConfigArgs, OutputFormat};
use crate::config::Config;
use crate::error::{FootprintError, Result};

use super::{config_path, load_config};

/// Run the config command.
pub fn run(cli: &Cli, args: &ConfigArgs) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Get { key } => get_config_value(cli, key),
        ConfigAction::Set { key, value } => set_config_value(cli, key, value),
        ConfigAction::Path => {
            println!("{}", config_path(cli)?.display());
            Ok(())
        }
        ConfigAction::Init { force } => init_config(cli, *force),
        ConfigAction::Reset => reset_config(cli),
    }
}

/// Show the effective configuration.
fn show_config(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    match cli.effective_output() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        _ => {
            let toml = toml::to_string_pretty(&config).map_err(|e| FootprintError::ConfigError {
                message: format!("Failed to render config: {e}"),
            })?;
            print!("{toml}");
        }
    }
    Ok(())
}

/// Get a specific configuration value.
fn get_config_value(cli: &Cli, key: &str) -> Result<()> {
    let config = load_config(cli)?;
    let value = config.get(key)?;

    match cli.effective_output() {
        OutputFormat::Json => {
            let json = serde_json::to_value(&value)?;
            println!("{}", serde_json::json!({ key: json }));
        }
        _ => match value {
            toml::Value::String(s) => println!("{s}"),
            other => println!("{other}"),
        },
    }
    Ok(())
}

/// Set a configuration value in the config file.
fn set_config_value(cli: &Cli, key: &str, value: &str) -> Result<()> {
    let path = config_path(cli)?;
    let mut config = load_file_or_default(&path)?;

    config.set(key, value)?;
    config.save_to(&path)?;

    if !cli.quiet {
        println!("Set {key} = {value}");
    }
    Ok(())
}

/// Write a default configuration file.
fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let path = config_path(cli)?;

    if path.exists() && !force {
        println!("Configuration file already exists at: {}", path.display());
        println!("Use 'footprint config reset' to reset to defaults.");
        return Ok(());
    }

    Config::default().save_to(&path)?;
    println!("Created configuration file at: {}", path.display());
    Ok(())
}

/// Reset the configuration file to defaults.
fn reset_config(cli: &Cli) -> Result<()> {
    let path = config_path(cli)?;

    if !path.exists() {
        println!("No configuration file exists. Use 'footprint config init' to create one.");
        return Ok(());
    }

    Config::default().save_to(&path)?;
    println!("Reset configuration to defaults at: {}", path.display());
    Ok(())
}

fn load_file_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load_from(path)
    } else {
        Ok(Config::default())
    }
}
