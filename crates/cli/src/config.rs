//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub locator: LocatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Directory relative resource uris are resolved against
    #[serde(default = "default_context_root")]
    pub context_root: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Groups to watch; empty means every group of the model
    #[serde(default)]
    pub groups: Vec<String>,

    /// Append a JSON line per invalidation to this file
    #[serde(default)]
    pub journal_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("./wro.toml")
}

fn default_context_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval() -> u64 {
    10
}

fn default_max_concurrent() -> usize {
    4
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            context_root: default_context_root(),
            log_level: default_log_level(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_concurrent: default_max_concurrent(),
            groups: vec![],
            journal_path: None,
        }
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        let default_path = PathBuf::from("./asset-watch.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ASSET_WATCH")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("watch.groups")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# asset-watch configuration

[general]
# Resource model: [[group]] entries with name, resources and group_refs
model_path = "./wro.toml"
# Relative resource uris are read from here
context_root = "."
log_level = "info"

[watch]
poll_interval_secs = 10
max_concurrent = 4
# Empty watches every group of the model
groups = []
# journal_path = "./invalidations.jsonl"

[locator]
http_timeout_secs = 30
"#
        .to_string()
    }

    /// Starter group model matching the defaults of [`AppConfig::example_toml`]
    pub fn example_model() -> &'static str {
        r#"# Resource groups watched by asset-watch

[[group]]
name = "base"
resources = ["css/reset.css"]

[[group]]
name = "main"
group_refs = ["base"]
resources = ["css/main.css", "js/app.js"]
"#
    }
}
