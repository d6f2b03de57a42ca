//! Command-line interface for footprint-insight.
//!
//! Provides scriptable access to the record store and the insight engine:
//! - `trip` / `bill`: log, list and delete records
//! - `import`: bulk-load records from JSON
//! - `analyze`: produce the weekly insight
//! - `evaluate`: backtest the forecaster on the user's own history
//! - `schema`, `config`, `completions`: housekeeping

mod commands;

pub use commands::*;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

use crate::error::Result;
use crate::export::ExportFormat;

/// Personal carbon footprint tracker with weekly forecasts.
#[derive(Debug, Parser)]
#[command(name = "footprint")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the SQLite record database.
    #[arg(long, global = true, env = "FOOTPRINT_DB")]
    pub db: Option<PathBuf>,

    /// User whose records are read and written.
    #[arg(short = 'u', long, global = true, env = "FOOTPRINT_USER")]
    pub user: Option<String>,

    /// Output format for structured data.
    #[arg(short = 'o', long, global = true, default_value = "text", env = "FOOTPRINT_OUTPUT")]
    pub output: OutputFormat,

    /// Output as JSON (shorthand for -o json).
    #[arg(long, global = true, env = "FOOTPRINT_JSON")]
    pub json: bool,

    /// Suppress non-essential output.
    #[arg(short = 'q', long, global = true, env = "FOOTPRINT_QUIET")]
    pub quiet: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn", env = "FOOTPRINT_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format (text, json, compact, pretty).
    #[arg(long, global = true, default_value = "text", env = "FOOTPRINT_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Path to custom configuration file.
    #[arg(long, global = true, env = "FOOTPRINT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Log level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter level.
    #[must_use]
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Structured JSON format for machine consumption.
    Json,
    /// Compact single-line format.
    Compact,
    /// Pretty format with full details.
    Pretty,
}

/// Output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// Tab-separated values.
    Tsv,
}

impl Cli {
    /// Get effective output format.
    #[must_use]
    pub fn effective_output(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.output
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log, list and delete trips.
    #[command(alias = "t")]
    Trip(TripArgs),

    /// Log, list and delete utility bills.
    #[command(alias = "b")]
    Bill(BillArgs),

    /// Import trips and bills from a JSON file.
    Import(ImportArgs),

    /// Produce the weekly insight.
    #[command(alias = "a")]
    Analyze(AnalyzeArgs),

    /// Backtest the forecaster on recorded history.
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),

    /// Print the JSON Schema of exported insights.
    Schema(SchemaArgs),

    /// View and modify configuration.
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the trip command.
#[derive(Debug, Parser)]
pub struct TripArgs {
    /// Trip action.
    #[command(subcommand)]
    pub action: TripAction,
}

/// Trip actions.
#[derive(Debug, Subcommand)]
pub enum TripAction {
    /// Log a trip.
    Add {
        /// Distance in km.
        #[arg(short = 'd', long)]
        distance: f64,

        /// Emission in kg CO2e (estimated from the vehicle when omitted).
        #[arg(short = 'e', long)]
        emission: Option<f64>,

        /// Vehicle (car, bus, train, bike, walking, or any custom name).
        #[arg(short = 'v', long, default_value = "car")]
        vehicle: String,

        /// Custom vehicle name, kept as its own label even if it matches a base category.
        #[arg(long, conflicts_with = "vehicle")]
        custom_vehicle: Option<String>,

        /// When the trip happened (RFC 3339, YYYY-MM-DD, or a duration ago like "2days").
        #[arg(long)]
        at: Option<String>,
    },

    /// List trips, oldest first.
    #[command(alias = "ls")]
    List {
        /// Show at most this many of the newest trips.
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Delete a trip by id or unique id prefix.
    Rm {
        /// Trip id or prefix.
        id: String,
    },
}

/// Arguments for the bill command.
#[derive(Debug, Parser)]
pub struct BillArgs {
    /// Bill action.
    #[command(subcommand)]
    pub action: BillAction,
}

/// Bill actions.
#[derive(Debug, Subcommand)]
pub enum BillAction {
    /// Log a utility bill.
    Add {
        /// Consumption in kWh.
        #[arg(short = 'k', long)]
        units: f64,

        /// Billing period label (defaults to the month of --at).
        #[arg(short = 'p', long)]
        period: Option<String>,

        /// When the bill was recorded (RFC 3339, YYYY-MM-DD, or a duration ago).
        #[arg(long)]
        at: Option<String>,
    },

    /// List bills, oldest first.
    #[command(alias = "ls")]
    List,

    /// Delete a bill by id or unique id prefix.
    Rm {
        /// Bill id or prefix.
        id: String,
    },
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON file of the form `{"trips": [...], "bills": [...]}`.
    pub file: PathBuf,
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Report format.
    #[arg(short = 'f', long, default_value = "text", env = "FOOTPRINT_FORMAT")]
    pub format: ExportFormatArg,

    /// Output file path (stdout if not specified).
    #[arg(short = 'O', long = "out")]
    pub output_file: Option<PathBuf>,

    /// Skip the external recommendation generator.
    #[arg(long)]
    pub offline: bool,

    /// Reference instant (RFC 3339 or YYYY-MM-DD); defaults to now.
    #[arg(long)]
    pub now: Option<String>,

    /// Omit recommendations and patterns from the report.
    #[arg(long)]
    pub minimal: bool,
}

/// Export format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormatArg {
    /// Plain text report.
    #[default]
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

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Text => Self::Text,
            ExportFormatArg::Markdown => Self::Markdown,
            ExportFormatArg::Json => Self::Json,
            ExportFormatArg::JsonPretty => Self::JsonPretty,
            ExportFormatArg::Csv => Self::Csv,
        }
    }
}

/// Arguments for the evaluate command.
#[derive(Debug, Parser)]
pub struct EvaluateArgs {
    /// Reference instant (RFC 3339 or YYYY-MM-DD); defaults to now.
    #[arg(long)]
    pub now: Option<String>,

    /// Also print the held-out actual and predicted values.
    #[arg(long)]
    pub detail: bool,

    /// Backtest every user in the database and print a summary.
    #[arg(long, conflicts_with = "detail")]
    pub all: bool,
}

/// Arguments for the schema command.
#[derive(Debug, Parser)]
pub struct SchemaArgs {
    /// Print the schema of the recommendation generator request instead.
    #[arg(long)]
    pub context: bool,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Config action.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,
    /// Get a value by dotted key (e.g. analysis.smoothing_alpha).
    Get {
        /// Dotted key.
        key: String,
    },
    /// Set a value by dotted key.
    Set {
        /// Dotted key.
        key: String,
        /// New value (TOML literal; bare words are strings).
        value: String,
    },
    /// Print the config file path.
    Path,
    /// Write a default config file if none exists.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Reset the config file to defaults.
    Reset,
}

/// Arguments for the completions command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// PowerShell.
    Powershell,
    /// Elvish shell.
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::Powershell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completions and print to stdout.
pub fn generate_completions(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let shell: Shell = shell.into();
    generate(shell, &mut cmd, "footprint", &mut io::stdout());
}

/// Initialize tracing/logging based on CLI options.
fn init_logging(cli: &Cli) {
    use tracing_subscriber::{
        fmt::{self, format::FmtSpan},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()));

    let result = match cli.log_format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match &cli.command {
        Commands::Trip(args) => commands::trip::run(&cli, args),
        Commands::Bill(args) => commands::bill::run(&cli, args),
        Commands::Import(args) => commands::import::run(&cli, args),
        Commands::Analyze(args) => commands::analyze::run(&cli, args).await,
        Commands::Evaluate(args) => commands::evaluate::run(&cli, args),
        Commands::Schema(args) => commands::schema::run(&cli, args),
        Commands::Config(args) => commands::config::run(&cli, args),
        Commands::Completions(args) => {
            generate_completions(args.shell);
            Ok(())
        }
    }
}
