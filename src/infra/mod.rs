//! Infrastructure layer
//!
//! Handles all I/O operations: filesystem discovery, platform directories,
//! and external processes. This module is the only place where side effects occur.

pub mod dirs;
pub mod discover;
pub mod process;
