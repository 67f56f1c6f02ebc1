//! Output formatting and progress indicators
//!
//! This module provides the global output mode (human, quiet, JSON), the
//! progress bar shown while projects build, and error display.

use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::core::orchestrator::{BuildEvent, EventSink};
use crate::error::BuildfleetError;

static QUIET: AtomicBool = AtomicBool::new(false);
static JSON: AtomicBool = AtomicBool::new(false);

/// Output mode selected on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub quiet: bool,
    pub json: bool,
}

impl OutputConfig {
    pub fn new(quiet: bool, json: bool) -> Self {
        Self { quiet, json }
    }

    /// Make this configuration visible to every command
    pub fn apply_global(self) {
        QUIET.store(self.quiet, Ordering::Relaxed);
        JSON.store(self.json, Ordering::Relaxed);
    }
}

/// Whether human-readable output is suppressed
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Whether results are printed as JSON
pub fn is_json() -> bool {
    JSON.load(Ordering::Relaxed)
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a human-readable line unless quiet or JSON output is active
pub fn say(message: impl AsRef<str>) {
    if !is_quiet() && !is_json() {
        println!("{}", message.as_ref());
    }
}

/// Display an error on stderr
pub fn display_error(error: &anyhow::Error) {
    if is_json() {
        let body = serde_json::json!({ "error": format!("{error:#}") });
        eprintln!("{body}");
        return;
    }

    eprintln!("{} {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Process exit code for an error
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<BuildfleetError>()
        .map_or(1, BuildfleetError::exit_code)
}

/// Create a progress bar for build steps
pub fn create_build_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} projects ({msg})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb
}

/// Event sink that drives a progress bar and prints one line per project
#[derive(Debug)]
pub struct ProgressSink {
    bar: ProgressBar,
}

impl ProgressSink {
    /// Progress for `total` projects; hidden in quiet and JSON modes
    pub fn new(total: usize) -> Self {
        let bar = if is_quiet() || is_json() {
            ProgressBar::hidden()
        } else {
            create_build_bar(total as u64)
        };
        Self { bar }
    }

    /// Remove the bar from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl EventSink for ProgressSink {
    fn on_event(&self, event: &BuildEvent) {
        match event {
            BuildEvent::Started {
                command, project, ..
            } => {
                self.bar.set_message(format!("{command} {project}"));
            }
            BuildEvent::Finished {
                project,
                exit_code,
                success,
                ..
            } => {
                let prefix = if *success { status::SUCCESS } else { status::ERROR };
                self.bar
                    .println(format!("{prefix} {project} (exit code {exit_code})"));
                self.bar.inc(1);
            }
            BuildEvent::SpawnFailed { project, error, .. } => {
                self.bar
                    .println(format!("{} {project}: {error}", status::ERROR));
                self.bar.inc(1);
            }
        }
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestrateError;

    #[test]
    fn test_exit_code_for_typed_and_untyped_errors() {
        let typed: anyhow::Error = BuildfleetError::from(OrchestrateError::Configuration {
            message: "no projects".to_string(),
        })
        .into();
        assert_eq!(exit_code_for(&typed), 2);

        let untyped = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&untyped), 1);
    }

    #[test]
    fn test_hidden_sink_accepts_events() {
        let sink = ProgressSink {
            bar: ProgressBar::hidden(),
        };
        sink.on_event(&BuildEvent::Started {
            index: 0,
            command: "build".to_string(),
            project: "a.csproj".to_string(),
            targets: String::new(),
        });
        sink.on_event(&BuildEvent::Finished {
            index: 0,
            command: "build".to_string(),
            project: "a.csproj".to_string(),
            exit_code: 0,
            success: true,
        });
        assert_eq!(sink.bar.position(), 1);
        sink.finish();
    }
}
