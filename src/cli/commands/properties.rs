//! Properties command implementation
//!
//! Implements `buildfleet properties`, which lists what a property source
//! provides. Also hosts the source loading shared with `reconcile`.

use std::path::Path;

use anyhow::Result;
use serde_json::json;

use crate::cli::output;
use crate::core::properties::{EnvPropertySource, MapPropertySource, PropertySource};
use crate::error::BuildfleetError;

/// Build a property source from the environment and/or a properties file
///
/// File properties override environment variables of the same name.
pub fn load_source(
    properties_file: Option<&Path>,
    env: bool,
) -> Result<MapPropertySource, BuildfleetError> {
    let mut source = MapPropertySource::new();

    if env {
        source.extend_from(&EnvPropertySource::capture());
    }

    if let Some(path) = properties_file {
        let file = MapPropertySource::from_json_file(path)?;
        source.extend_from(&file);
    }

    Ok(source)
}

/// Execute the properties command
pub fn execute(properties_file: Option<&Path>, env: bool) -> Result<()> {
    let source = load_source(properties_file, env)?;
    let properties = source.properties();

    if output::is_json() {
        let map: serde_json::Map<String, serde_json::Value> = properties
            .iter()
            .map(|(name, value)| ((*name).to_string(), json!(value)))
            .collect();
        return output::print_json(&json!({
            "properties": map,
            "items": source.items(),
        }));
    }

    if properties.is_empty() && source.items().is_empty() {
        output::say("No properties or items");
        return Ok(());
    }

    output::say(format!("Properties ({}):", properties.len()));
    for (name, value) in &properties {
        output::say(format!("  {name} = {value}"));
    }

    if !source.items().is_empty() {
        output::say(format!("\nItems ({}):", source.items().len()));
        for item in source.items() {
            output::say(format!("  {}: {}", item.item_type, item.spec));
        }
    }

    Ok(())
}
