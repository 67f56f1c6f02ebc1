//! Evaluated project properties and items
//!
//! A [`PropertySource`] is the read-only view of a host build engine's
//! already-evaluated project: properties looked up by name ignoring case,
//! and an ordered item list. It is handed explicitly to whatever needs it.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PropertySourceError;

/// Property names whose values the build engine injects into its own
/// command line
pub const RESERVED_PROPERTY_NAMES: &[&str] = &[
    "MSBuildToolsPath",
    "MSBuildToolsPath32",
    "MSBuildThisFileDirectory",
    "MSBuildThisFile",
    "MSBuildStartupDirectory",
    "MSBuildFrameworkToolsPath",
    "MSBuildFrameworkToolsPath32",
    "MSBuildFrameworkToolsPath64",
    "MSBuildExtensionsPath",
    "MSBuildExtensionsPath32",
    "MSBuildExtensionsPath64",
    "MSBuildBinPath",
    "FrameworkSDKRoot",
    "MSBuildProjectFile",
    "MSBuildThisFileFullPath",
    "MSBuildProjectFullPath",
];

/// Property names set from build options
pub mod names {
    pub const CONFIGURATION: &str = "Configuration";
    pub const FRAMEWORK: &str = "Framework";
    pub const OUTPUT_DIRECTORY: &str = "OutputDirectory";
    pub const OUTPUT_NAME: &str = "OutputName";
    pub const OUTPUT_TYPE: &str = "OutputType";
    pub const VERSION: &str = "Version";
    pub const ASSEMBLY_NAME: &str = "AssemblyName";
}

/// Names compare equal after Unicode lowercasing, the same rule used for
/// property keys
fn same_name(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// One evaluated item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyItem {
    /// Item type, e.g. `Project` or `Compile`
    #[serde(rename = "type")]
    pub item_type: String,

    /// Item specification, usually a path
    pub spec: String,

    /// Item metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl PropertyItem {
    /// Create an item without metadata
    pub fn new(item_type: impl Into<String>, spec: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            spec: spec.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata value
    #[must_use]
    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    /// Look up metadata ignoring the case of `name`
    pub fn metadata(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(key, _)| same_name(key, name))
            .map(|(_, value)| value.as_str())
    }
}

/// Read-only view of an evaluated project
pub trait PropertySource {
    /// Value of a property, looked up ignoring case
    fn property(&self, name: &str) -> Option<&str>;

    /// All properties as `(name, value)` pairs
    fn properties(&self) -> Vec<(&str, &str)>;

    /// Evaluated items in order
    fn items(&self) -> &[PropertyItem];

    /// Items of one type, compared ignoring case
    fn items_of_type(&self, item_type: &str) -> Vec<&PropertyItem> {
        self.items()
            .iter()
            .filter(|item| same_name(&item.item_type, item_type))
            .collect()
    }
}

/// On-disk layout of a properties file
#[derive(Debug, Default, Deserialize, Serialize)]
struct PropertiesDocument {
    #[serde(default)]
    properties: BTreeMap<String, String>,

    #[serde(default)]
    items: Vec<PropertyItem>,
}

/// In-memory property source
///
/// Keys are stored lowercased next to their original spelling.
#[derive(Debug, Clone, Default)]
pub struct MapPropertySource {
    properties: BTreeMap<String, (String, String)>,
    items: Vec<PropertyItem>,
}

impl MapPropertySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs; later pairs win
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut source = Self::new();
        for (name, value) in pairs {
            source.set(name, value);
        }
        source
    }

    /// Load a JSON properties file
    ///
    /// ```json
    /// { "properties": { "MSBuildProjectFullPath": "/src/App.csproj" },
    ///   "items": [ { "type": "Project", "spec": "src/App.csproj" } ] }
    /// ```
    pub fn from_json_file(path: &Path) -> Result<Self, PropertySourceError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PropertySourceError::ReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        let document: PropertiesDocument =
            serde_json::from_str(&content).map_err(|e| PropertySourceError::ParseError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        let mut source = Self::from_pairs(document.properties);
        source.items = document.items;
        tracing::debug!(
            "Loaded {} properties and {} items from {}",
            source.properties.len(),
            source.items.len(),
            path.display()
        );
        Ok(source)
    }

    /// Set a property, replacing any value with the same name in any case
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.properties
            .insert(name.to_lowercase(), (name, value.into()));
    }

    /// Append an item
    pub fn push_item(&mut self, item: PropertyItem) {
        self.items.push(item);
    }

    /// Merge another source on top of this one
    pub fn extend_from(&mut self, other: &dyn PropertySource) {
        for (name, value) in other.properties() {
            self.set(name, value);
        }
        self.items.extend(other.items().iter().cloned());
    }
}

impl PropertySource for MapPropertySource {
    fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(&name.to_lowercase())
            .map(|(_, value)| value.as_str())
    }

    fn properties(&self) -> Vec<(&str, &str)> {
        self.properties
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect()
    }

    fn items(&self) -> &[PropertyItem] {
        &self.items
    }
}

/// The process environment viewed as properties
///
/// The build engine exposes every environment variable as a property, so
/// this is the natural source when running outside the engine.
#[derive(Debug, Clone)]
pub struct EnvPropertySource {
    inner: MapPropertySource,
}

impl EnvPropertySource {
    /// Snapshot the current environment
    pub fn capture() -> Self {
        Self::from_vars(std::env::vars_os())
    }

    /// Build from raw variable pairs, skipping any that are not UTF-8
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let pairs = vars
            .into_iter()
            .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (name, _) => {
                    tracing::debug!("Skipping non-UTF-8 environment variable {name:?}");
                    None
                }
            });
        Self {
            inner: MapPropertySource::from_pairs(pairs),
        }
    }
}

impl PropertySource for EnvPropertySource {
    fn property(&self, name: &str) -> Option<&str> {
        self.inner.property(name)
    }

    fn properties(&self) -> Vec<(&str, &str)> {
        self.inner.properties()
    }

    fn items(&self) -> &[PropertyItem] {
        &[]
    }
}
