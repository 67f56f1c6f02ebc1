//! Core business logic module
//!
//! # Submodules
//!
//! - [`entry`] - Project entries handed to the orchestrator
//! - [`template`] - Build options and the shared argument template
//! - [`orchestrator`] - Running the build tool across projects
//! - [`matcher`] - Fuzzy argument name matching
//! - [`reconcile`] - Recovering user arguments from a full command line
//! - [`properties`] - Evaluated project properties and items
//! - [`manifest`] - Project manifest (`buildfleet.toml`) parsing
//! - [`global_config`] - Global configuration management

pub mod entry;
pub mod global_config;
pub mod manifest;
pub mod matcher;
pub mod orchestrator;
pub mod properties;
pub mod reconcile;
pub mod template;
