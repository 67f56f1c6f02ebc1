//! Project entries
//!
//! One buildable unit handed to the orchestrator.

use std::path::{Path, PathBuf};

use crate::core::properties::PropertyItem;
use crate::error::OrchestrateError;

/// Item metadata naming the directory a project is built from
const WORKING_DIRECTORY_METADATA: &[&str] = &["WorkingDirectory", "RootDir"];

/// One project to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    path: PathBuf,
    working_directory: PathBuf,
}

impl ProjectEntry {
    /// Entry for a project file, built from the directory containing it
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let working_directory = default_working_directory(&path);
        Self {
            path,
            working_directory,
        }
    }

    /// Override the working directory
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = dir.into();
        self
    }

    /// Entry from an evaluated item
    ///
    /// `WorkingDirectory` or `RootDir` metadata, when present and non-empty,
    /// sets the working directory.
    pub fn from_item(item: &PropertyItem) -> Self {
        let entry = Self::new(&item.spec);
        let dir = WORKING_DIRECTORY_METADATA
            .iter()
            .find_map(|name| item.metadata(name).filter(|value| !value.is_empty()));
        match dir {
            Some(dir) => entry.with_working_directory(dir),
            None => entry,
        }
    }

    /// Path of the project file as given
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the build tool runs in
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Resolve relative paths against `base`
    ///
    /// The build tool runs in the working directory, so a relative project
    /// path must be anchored before it is handed over.
    #[must_use]
    pub fn anchored_at(self, base: &Path) -> Self {
        let anchor = |p: PathBuf| {
            if p.is_absolute() {
                p
            } else if p == Path::new(".") {
                base.to_path_buf()
            } else {
                base.join(p)
            }
        };
        Self {
            path: anchor(self.path),
            working_directory: anchor(self.working_directory),
        }
    }

    /// Identity used in exit code records and logs
    pub fn identity(&self) -> String {
        self.path.display().to_string()
    }

    /// Fail unless the project path exists
    pub fn ensure_exists(&self) -> Result<(), OrchestrateError> {
        if self.path.exists() {
            Ok(())
        } else {
            Err(OrchestrateError::ProjectNotFound {
                path: self.path.clone(),
            })
        }
    }
}

impl From<&str> for ProjectEntry {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for ProjectEntry {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

fn default_working_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
