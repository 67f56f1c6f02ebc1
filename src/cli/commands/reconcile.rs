//! Reconcile command implementation
//!
//! Implements `buildfleet reconcile`: strips the tool, its verbs, reserved
//! property values and the project file from a raw argument list and prints
//! what is left.

use std::path::Path;

use anyhow::Result;
use serde_json::json;

use crate::cli::commands::properties::load_source;
use crate::cli::output;
use crate::core::reconcile::{reconcile, ExclusionSet};

/// Execute the reconcile command
pub fn execute(
    project_file: &Path,
    properties_file: Option<&Path>,
    env: bool,
    args: Vec<String>,
) -> Result<()> {
    let source = load_source(properties_file, env)?;
    let exclusions = ExclusionSet::from_source(&source, project_file);

    let raw_args = if args.is_empty() {
        std::env::args().collect()
    } else {
        args
    };

    let result = reconcile(&raw_args, &exclusions);

    if output::is_json() {
        return output::print_json(&json!({
            "project_file": project_file.display().to_string(),
            "rendered": result.rendered,
            "residual": result.residual,
            "excluded": exclusions.entries(),
        }));
    }

    output::say(format!("Full command line: {}", result.rendered));
    output::say(format!("Arguments: {}", result.residual_line()));
    Ok(())
}
