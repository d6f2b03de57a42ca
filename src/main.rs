//! footprint: log trips and bills, then forecast next week's emissions.

use std::process::ExitCode;

use footprint_insight::cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Logging is initialized by cli::run from --log-level and --log-format
    match cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");

            if std::env::var("RUST_BACKTRACE").is_ok() {
                if let Some(source) = std::error::Error::source(&e) {
                    eprintln!("Caused by: {source}");
                }
            }

            ExitCode::from(e.exit_code() as u8)
        }
    }
}
