//! Buildfleet - run a build tool across many projects
//!
//! This library drives an external build tool (the .NET CLI by default) over
//! a list of project files with one shared argument template, records each
//! project's exit code, and recovers the effective command line of a build.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic: templates, orchestration, reconciliation
//! - [`infra`] - Infrastructure layer (processes, filesystem, directories)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
