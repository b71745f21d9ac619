//! Subcommand implementations

pub mod config;
pub mod groups;
pub mod process;
pub mod watch;
