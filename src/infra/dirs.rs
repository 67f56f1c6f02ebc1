//! Location of user-wide settings
//!
//! The global `config.toml` lives in `BUILDFLEET_CONFIG_DIR` when set, else
//! in the platform config directory (`$XDG_CONFIG_HOME/buildfleet` or
//! `~/.config/buildfleet` on Linux, `~/Library/Application Support/buildfleet`
//! on macOS).

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "BUILDFLEET_CONFIG_DIR";

const APP_DIR: &str = "buildfleet";
const CONFIG_FILE: &str = "config.toml";

/// Where buildfleet keeps its own files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildfleetDirs {
    config_dir: PathBuf,
}

impl BuildfleetDirs {
    /// Resolve from the environment, falling back to the platform default
    #[must_use]
    pub fn new() -> Self {
        let config_dir = env::var_os(ENV_CONFIG_DIR)
            .filter(|value| !value.is_empty())
            .map_or_else(platform_config_dir, PathBuf::from);
        Self { config_dir }
    }

    /// Use an explicit config directory
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the global `config.toml`
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

impl Default for BuildfleetDirs {
    fn default() -> Self {
        Self::new()
    }
}

fn platform_config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_dir_ends_with_app_name() {
        assert!(platform_config_dir().ends_with(APP_DIR));
    }

    #[test]
    fn test_config_file_sits_in_config_dir() {
        let dirs = BuildfleetDirs::with_config_dir(PathBuf::from("/tmp/fleet"));
        assert_eq!(dirs.config_dir(), Path::new("/tmp/fleet"));
        assert_eq!(
            dirs.global_config_path(),
            PathBuf::from("/tmp/fleet/config.toml")
        );
    }
}
