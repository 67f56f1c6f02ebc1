//! Error types for buildfleet
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::global_config::GlobalConfigError;

/// Orchestration errors
#[derive(Error, Debug)]
pub enum OrchestrateError {
    /// Required input missing or invalid; nothing was started
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Project path does not exist
    #[error("Project not found: {path}")]
    ProjectNotFound { path: PathBuf },

    /// Child process exited with a nonzero code
    #[error("{command} of project '{project}' failed with exit code {exit_code}")]
    ChildProcessFailure {
        command: String,
        project: String,
        exit_code: i32,
    },

    /// Child process could not be started
    #[error("Failed to start '{program}' for project '{project}': {error}")]
    SpawnFailure {
        program: String,
        project: String,
        error: String,
    },

    /// Run was cancelled before all projects finished
    #[error("Run cancelled")]
    Cancelled,
}

/// Property source errors
#[derive(Error, Debug)]
pub enum PropertySourceError {
    /// Failed to read the properties file
    #[error("Failed to read properties file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to parse the properties file
    #[error("Failed to parse properties file '{path}': {error}")]
    ParseError { path: PathBuf, error: String },
}

/// Project manifest errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Failed to read the manifest
    #[error("Failed to read manifest '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to parse the manifest
    #[error("Failed to parse manifest '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// Manifest value is not acceptable
    #[error("Invalid manifest value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Top-level buildfleet error type
#[derive(Error, Debug)]
pub enum BuildfleetError {
    /// Orchestration error
    #[error("{0}")]
    Orchestrate(#[from] OrchestrateError),

    /// Property source error
    #[error("Property source error: {0}")]
    PropertySource(#[from] PropertySourceError),

    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Global config error
    #[error(transparent)]
    GlobalConfig(#[from] GlobalConfigError),
}

impl BuildfleetError {
    /// Process exit code the CLI should use for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Orchestrate(OrchestrateError::Configuration { .. })
            | Self::Orchestrate(OrchestrateError::ProjectNotFound { .. })
            | Self::Manifest(_)
            | Self::PropertySource(_)
            | Self::GlobalConfig(_) => 2,
            Self::Orchestrate(OrchestrateError::Cancelled) => 130,
            _ => 1,
        }
    }
}
