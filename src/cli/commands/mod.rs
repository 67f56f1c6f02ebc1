//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod properties;
pub mod reconcile;
pub mod run;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use run::RunArgs;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build projects with the build tool
    Run(RunArgs),

    /// Recover the effective command line of a build
    Reconcile {
        /// Project file being built
        #[arg(long)]
        project_file: PathBuf,

        /// JSON file with evaluated properties and items
        #[arg(long)]
        properties_file: Option<PathBuf>,

        /// Treat environment variables as properties
        #[arg(long)]
        env: bool,

        /// Raw arguments (defaults to this process's own arguments)
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Show the properties and items a source provides
    Properties {
        /// JSON file with evaluated properties and items
        #[arg(long)]
        properties_file: Option<PathBuf>,

        /// Treat environment variables as properties
        #[arg(long)]
        env: bool,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self) -> Result<()> {
        match self {
            Commands::Run(args) => run::execute(args).await,
            Commands::Reconcile {
                project_file,
                properties_file,
                env,
                args,
            } => reconcile::execute(&project_file, properties_file.as_deref(), env, args),
            Commands::Properties {
                properties_file,
                env,
            } => properties::execute(properties_file.as_deref(), env),
        }
    }
}
