//! Project manifest (`buildfleet.toml`) parsing
//!
//! The manifest lists the projects of a fleet and the build options shared by
//! all of them. String values may reference environment variables with
//! `${VAR}`; unset variables expand to an empty string.
//!
//! ```toml
//! projects = ["src/App/App.csproj", "src/Lib/Lib.csproj"]
//!
//! [build]
//! command = "pack"
//! version = "${BUILD_VERSION}"
//! targets = ["Restore", "Pack"]
//!
//! [build.properties]
//! ContinuousIntegrationBuild = "true"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::core::entry::ProjectEntry;
use crate::core::template::PropertyOverride;
use crate::error::ManifestError;

/// The fleet manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetManifest {
    /// Project files, relative to the manifest's directory
    #[serde(default)]
    pub projects: Vec<String>,

    /// Shared build options
    #[serde(default)]
    pub build: BuildSection,
}

/// `[build]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSection {
    pub command: Option<String>,
    pub configuration: Option<String>,
    pub framework: Option<String>,
    pub output_directory: Option<String>,
    pub output_name: Option<String>,
    pub output_type: Option<String>,
    pub version: Option<String>,
    pub assembly_name: Option<String>,

    /// Extra properties, emitted sorted by name
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    #[serde(default)]
    pub targets: Vec<String>,

    #[serde(default)]
    pub remove_properties: Vec<String>,

    pub ignore_exit_codes: Option<bool>,
    pub keep_going: Option<bool>,
    pub jobs: Option<usize>,
    pub tool: Option<String>,
}

impl BuildSection {
    /// Extra properties as overrides, in name order
    pub fn property_overrides(&self) -> Vec<PropertyOverride> {
        self.properties
            .iter()
            .map(|(name, value)| PropertyOverride::new(name, value))
            .collect()
    }
}

impl FleetManifest {
    /// Load a manifest file, expanding `${VAR}` references
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let parse_error = |e: toml::de::Error| ManifestError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        };

        let mut value: toml::Value = toml::from_str(&content).map_err(parse_error)?;
        expand_strings(&mut value);
        let manifest: Self = value.try_into().map_err(parse_error)?;
        manifest.validate()?;

        tracing::debug!(
            "Loaded manifest {} with {} projects",
            path.display(),
            manifest.projects.len()
        );
        Ok(manifest)
    }

    /// Parse manifest TOML
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reject values that cannot produce a sensible run
    pub fn validate(&self) -> Result<(), ManifestError> {
        if let Some(index) = self.projects.iter().position(|p| p.trim().is_empty()) {
            return Err(ManifestError::InvalidValue {
                field: format!("projects[{index}]"),
                message: "project path is empty".to_string(),
            });
        }

        if let Some(name) = self.build.properties.keys().find(|k| k.trim().is_empty()) {
            return Err(ManifestError::InvalidValue {
                field: format!("build.properties.\"{name}\""),
                message: "property name is empty".to_string(),
            });
        }

        Ok(())
    }

    /// Project entries with paths resolved against `base_dir`
    pub fn project_entries(&self, base_dir: &Path) -> Vec<ProjectEntry> {
        self.projects
            .iter()
            .map(|project| ProjectEntry::new(base_dir.join(project)))
            .collect()
    }
}

/// Expand variables in every string of a parsed document
fn expand_strings(value: &mut toml::Value) {
    match value {
        toml::Value::String(s) => *s = substitute_env_vars(s),
        toml::Value::Array(items) => items.iter_mut().for_each(expand_strings),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| expand_strings(v)),
        _ => {}
    }
}

/// Expand `${VAR}` references from the process environment
pub fn substitute_env_vars(input: &str) -> String {
    static VAR_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = VAR_PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid variable pattern")
    });

    pattern
        .replace_all(input, |caps: &Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}
