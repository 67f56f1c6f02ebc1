//! Buildfleet CLI - run a build tool across many projects
//!
//! Entry point for the buildfleet command-line application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use buildfleet::cli::output::{display_error, exit_code_for, OutputConfig};
use buildfleet::cli::Cli;
use buildfleet::core::global_config::GlobalConfig;
use buildfleet::infra::dirs::BuildfleetDirs;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v; without either only warnings are shown
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Flags win; an unreadable config is reported by the command that needs it
    let prefs = GlobalConfig::load(&BuildfleetDirs::new())
        .map(|config| config.output)
        .unwrap_or_default();
    let output_config = OutputConfig::new(
        cli.quiet || prefs.quiet.unwrap_or(false),
        cli.json || prefs.json.unwrap_or(false),
    );
    output_config.apply_global();

    // Run the command and handle errors
    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(exit_code_for(&e));
        }
    }
}
