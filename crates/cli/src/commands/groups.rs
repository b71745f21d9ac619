//! Groups command - list and validate the resource model

use anyhow::{Context, Result};
use asset_watch_adapters::model::TomlModelResolver;
use asset_watch_domain::{ModelResolver, UriLocator};
use std::path::PathBuf;

use crate::args::{GroupsArgs, GroupsCommands};
use crate::commands::watch::build_locator;
use crate::config::AppConfig;

pub async fn execute(args: GroupsArgs, config_path: Option<PathBuf>) -> Result<()> {
    match args.command {
        GroupsCommands::List { model, json } => list_groups(model, json, config_path).await,
        GroupsCommands::Validate { model } => validate_groups(model, config_path).await,
    }
}

async fn list_groups(model: Option<PathBuf>, json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();
    let path = model.unwrap_or_else(|| config.general.model_path.clone());

    let resolver =
        TomlModelResolver::new(&path).context("Failed to initialize model resolver")?;
    let model = resolver.load_model().await.context("Failed to load model")?;

    if json {
        let output = serde_json::json!({
            "count": model.groups.len(),
            "groups": model.groups.iter().map(|g| serde_json::json!({
                "name": g.name,
                "resources": g.resources,
                "cache_keys": g.cache_keys(),
            })).collect::<Vec<_>>()
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Groups ({} found)", model.groups.len());
        println!("================");
        println!();

        for group in &model.groups {
            println!("{}", group.name);
            for resource in &group.resources {
                println!("  {}", resource);
            }
            println!();
        }
    }

    Ok(())
}

async fn validate_groups(model: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();
    let path = model.unwrap_or_else(|| config.general.model_path.clone());

    println!("Validating model: {}", path.display());

    let resolver =
        TomlModelResolver::new(&path).context("Failed to initialize model resolver")?;

    let model = match resolver.load_model().await {
        Ok(model) => model,
        Err(e) => {
            eprintln!("✗ Validation failed: {}", e);
            std::process::exit(1);
        }
    };

    // Unreachable resources are tolerated by the watcher, so only report them
    let locator = build_locator(&config)?;
    let mut unreachable = 0;
    for group in &model.groups {
        for resource in &group.resources {
            if let Err(e) = locator.locate(resource.uri()).await {
                unreachable += 1;
                println!("! {} in group '{}': {}", resource.uri(), group.name, e);
            }
        }
    }

    println!(
        "✓ Validation passed ({} groups, {} unreachable resources)",
        model.groups.len(),
        unreachable
    );
    Ok(())
}
