//! User-wide settings
//!
//! `config.toml` in the config directory supplies fallbacks for every run:
//! the build tool, configuration name, parallelism, failure handling and
//! output mode. Anything set here loses to the manifest and to flags.
//!
//! ```toml
//! [defaults]
//! tool = "dotnet"
//! jobs = 0
//! keep_going = true
//!
//! [output]
//! quiet = true
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infra::dirs::BuildfleetDirs;

/// Errors reading the global config
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    #[error("Cannot read global config {}: {error}", .path.display())]
    ReadError { path: PathBuf, error: String },

    #[error("Invalid global config {}: {error}", .path.display())]
    ParseError { path: PathBuf, error: String },
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub output: OutputPreferences,
}

/// `[defaults]`: run settings used when neither flags nor manifest set them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub tool: Option<String>,
    pub configuration: Option<String>,
    /// 0 means one per CPU
    pub jobs: Option<usize>,
    pub keep_going: Option<bool>,
    pub ignore_exit_codes: Option<bool>,
}

/// `[output]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPreferences {
    pub quiet: Option<bool>,
    pub json: Option<bool>,
}

impl GlobalConfig {
    /// Read `config.toml` from `dirs`; a missing file yields defaults
    pub fn load(dirs: &BuildfleetDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No global config at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(GlobalConfigError::ReadError {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                })
            }
        };

        toml::from_str(&text).map_err(|e| GlobalConfigError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}
