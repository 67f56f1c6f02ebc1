//! Project file discovery
//!
//! Recursively finds build tool project files (`*.csproj`, `*.fsproj`,
//! `*.proj`, ...) under a directory.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &["bin", "obj", "node_modules", "target"];

/// Find project files under `root`, sorted by path
pub fn discover_projects(root: &Path) -> Vec<PathBuf> {
    let mut projects: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_project_file(entry.path()))
        .map(DirEntry::into_path)
        .collect();

    projects.sort();
    tracing::debug!("Discovered {} projects under {}", projects.len(), root.display());
    projects
}

/// Whether a path names a project file
pub fn is_project_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.len() >= 4 && ext.to_ascii_lowercase().ends_with("proj"))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}
