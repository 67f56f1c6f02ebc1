//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory for a fleet of projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test fleet
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test fleet in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test fleet directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test fleet
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a project file; `exit_code` is what the fake tool exits with for it
    pub fn create_project(&self, name: &str, exit_code: i32) {
        self.create_file(name, &format!("exit={exit_code}\n"));
    }

    /// Check if a file exists in the test fleet
    #[allow(dead_code)]
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test fleet
    #[allow(dead_code)]
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Install a fake build tool and return its path
    ///
    /// The tool appends `<cwd>|<args>` to `calls.log` in the fleet root and
    /// exits with the `exit=` value found in the project file (its last
    /// argument).
    #[cfg(unix)]
    #[allow(dead_code)]
    pub fn install_fake_tool(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let log = self.dir.path().join("calls.log");
        let script = format!(
            r#"#!/bin/sh
last=""
for arg in "$@"; do last="$arg"; done
echo "$(pwd)|$*" >> "{}"
code=$(sed -n 's/^exit=//p' "$last" 2>/dev/null)
exit ${{code:-0}}
"#,
            log.display()
        );

        let path = self.dir.path().join("tools").join("fake-tool");
        std::fs::create_dir_all(path.parent().expect("tool path has a parent"))
            .expect("Failed to create tools directory");
        std::fs::write(&path, script).expect("Failed to write fake tool");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake tool executable");
        path
    }

    /// Lines the fake tool logged, one per invocation
    #[allow(dead_code)]
    pub fn tool_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("calls.log"))
            .map(|content| content.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Run buildfleet in the fleet directory with an isolated global config
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_buildfleet"));
        cmd.current_dir(self.dir.path())
            .env("BUILDFLEET_CONFIG_DIR", self.dir.path().join(".config"))
            .env_remove("BUILDFLEET_TOOL")
            .env_remove("RUST_LOG");
        for arg in args {
            cmd.arg(arg);
        }
        cmd.output().expect("Failed to execute buildfleet")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Stdout of a finished command as text
#[allow(dead_code)]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished command as text
#[allow(dead_code)]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
