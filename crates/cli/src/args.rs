//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// asset-watch: watches grouped web resources and invalidates stale bundle cache entries
#[derive(Parser, Debug)]
#[command(name = "asset-watch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll resources and tombstone cache entries of changed groups
    Watch(WatchArgs),

    /// Inspect the resource model
    Groups(GroupsArgs),

    /// Run a single processor over a file and print the result
    Process(ProcessArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Run one poll cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Only watch these groups (repeatable; overrides watch.groups)
    #[arg(long = "group")]
    pub groups: Vec<String>,

    /// Override the model file
    #[arg(long)]
    pub model: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommands,
}

#[derive(Subcommand, Debug)]
pub enum GroupsCommands {
    /// List groups and their resources
    List {
        /// Override the model file
        #[arg(long)]
        model: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the model file
    Validate {
        /// Override the model file
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Processor alias (multilineStripper, cssImport)
    #[arg(long)]
    pub processor: String,

    /// File to process (use - for stdin)
    #[arg(long)]
    pub file: PathBuf,

    /// Uri the content is processed as (defaults to the file path)
    #[arg(long)]
    pub uri: Option<String>,

    /// Pass the input through untouched when the processor fails
    #[arg(long)]
    pub ignore_failures: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./asset-watch.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,

        /// Also write a starter group model next to the config, unless one exists
        #[arg(long)]
        with_model: bool,
    },

    /// Print the effective configuration (file and environment merged) as JSON
    Show,
}
