//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::Parser;

use commands::Commands;

/// Buildfleet - run a build tool across many projects
///
/// Builds every project with one shared argument template, records each
/// exit code, and can recover the effective command line of a build.
#[derive(Parser, Debug)]
#[command(name = "buildfleet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        if let Some(cmd) = self.command {
            cmd.run().await
        } else {
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["buildfleet", "run", "a.csproj", "-vv", "--json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_run_accepts_set_version_next_to_version_flag() {
        let cli = Cli::try_parse_from(["buildfleet", "run", "a.csproj", "--set-version", "1.2.3"])
            .unwrap();
        match cli.command {
            Some(Commands::Run(args)) => assert_eq!(args.set_version.as_deref(), Some("1.2.3")),
            other => panic!("unexpected command: {other:?}"),
        }

        let err = Cli::try_parse_from(["buildfleet", "run", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
