//! Build options and the shared argument template
//!
//! Every project in a run is built with the same argument prefix: the
//! command verb followed by property, target and property-removal switches.
//! The prefix is computed once from [`BuildOptions`] and reused per project.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::defaults::{DEFAULT_CONFIGURATION, DEFAULT_OUTPUT_TYPE};
use crate::core::entry::ProjectEntry;
use crate::core::properties::names;
use crate::error::OrchestrateError;

/// An extra `name=value` property override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOverride {
    pub name: String,
    pub value: String,
}

impl PropertyOverride {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl FromStr for PropertyOverride {
    type Err = OrchestrateError;

    /// Parse `NAME=VALUE`; the value may be empty and may contain `=`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok(Self::new(name.trim(), value))
            }
            _ => Err(OrchestrateError::Configuration {
                message: format!("Invalid property '{s}': expected NAME=VALUE"),
            }),
        }
    }
}

impl fmt::Display for PropertyOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Options shared by every project in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// `Configuration` property
    pub configuration: Option<String>,
    /// `Framework` property
    pub framework: Option<String>,
    /// `OutputDirectory` property
    pub output_directory: Option<String>,
    /// `OutputName` property
    pub output_name: Option<String>,
    /// `OutputType` property
    pub output_type: Option<String>,
    /// `Version` property
    pub version: Option<String>,
    /// `AssemblyName` property
    pub assembly_name: Option<String>,
    /// Extra properties, emitted in order
    pub properties: Vec<PropertyOverride>,
    /// Targets to run
    pub targets: Vec<String>,
    /// Properties to remove
    pub remove_properties: Vec<String>,
    /// Keep going when a project exits nonzero
    pub ignore_exit_codes: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            configuration: Some(DEFAULT_CONFIGURATION.to_string()),
            framework: None,
            output_directory: None,
            output_name: None,
            output_type: Some(DEFAULT_OUTPUT_TYPE.to_string()),
            version: None,
            assembly_name: None,
            properties: Vec::new(),
            targets: Vec::new(),
            remove_properties: Vec::new(),
            ignore_exit_codes: false,
        }
    }
}

impl BuildOptions {
    /// Targets joined the way the build engine reports them
    pub fn targets_label(&self) -> String {
        self.targets.join(";")
    }
}

/// Argument prefix shared by every project in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentTemplate {
    tokens: Vec<String>,
}

impl ArgumentTemplate {
    /// Build the template for `command` and `options`
    ///
    /// Token order is fixed: command, the named properties, extra
    /// properties, targets, then removals. Unset values produce no token.
    pub fn build(command: &str, options: &BuildOptions) -> Self {
        let mut tokens = Vec::new();

        if !command.is_empty() {
            tokens.push(command.to_string());
        }

        let named = [
            (names::CONFIGURATION, &options.configuration),
            (names::FRAMEWORK, &options.framework),
            (names::OUTPUT_DIRECTORY, &options.output_directory),
            (names::OUTPUT_NAME, &options.output_name),
            (names::OUTPUT_TYPE, &options.output_type),
            (names::VERSION, &options.version),
            (names::ASSEMBLY_NAME, &options.assembly_name),
        ];
        for (name, value) in named {
            if let Some(value) = value {
                tokens.push(property_token(name, value));
            }
        }

        tokens.extend(
            options
                .properties
                .iter()
                .map(|p| property_token(&p.name, &p.value)),
        );
        tokens.extend(options.targets.iter().map(|t| format!("/target:{t}")));
        tokens.extend(
            options
                .remove_properties
                .iter()
                .map(|p| format!("/property:{p}")),
        );

        Self { tokens }
    }

    /// Template tokens in order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Full argument list for one project
    pub fn args_for(&self, entry: &ProjectEntry) -> Vec<String> {
        let mut args = self.tokens.clone();
        args.push(entry.identity());
        args
    }
}

fn property_token(name: &str, value: &str) -> String {
    format!("/property:{name}={value}")
}
