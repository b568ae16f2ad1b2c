//! mathfont-host library root.
//!
//! Re-exports internal modules so integration tests can drive the commands
//! without going through the CLI.

pub mod commands;
pub mod config;
pub mod state;
pub mod tabs;
