//! Config command - scaffolding and inspection of settings

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

/// Name of the starter model written next to the config file
const STARTER_MODEL: &str = "wro.toml";

pub async fn execute(args: ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    match args.command {
        ConfigCommands::Init {
            path,
            force,
            with_model,
        } => init(&path, force, with_model),
        ConfigCommands::Show => show(config_path.as_deref()),
    }
}

fn init(config_path: &Path, force: bool, with_model: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    write_file(config_path, &AppConfig::example_toml())?;
    println!("Created config file: {}", config_path.display());

    if with_model {
        let model_path = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(STARTER_MODEL);

        if model_path.exists() {
            println!("Kept existing model: {}", model_path.display());
        } else {
            write_file(&model_path, AppConfig::example_model())?;
            println!("Created starter model: {}", model_path.display());
        }
    }

    println!();
    println!("Next steps:");
    if !with_model {
        println!("  - Point general.model_path at your group model");
    }
    println!("  - Run 'asset-watch groups validate' to check the model");
    println!("  - Run 'asset-watch watch --once' to record baselines");

    Ok(())
}

fn show(config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let rendered =
        serde_json::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
