//! Watch command - poll groups and tombstone stale cache entries

use anyhow::{Context, Result};
use asset_watch_adapters::{
    cache::{InMemoryCacheStore, JournalWriter, JournalingCacheStore},
    locator::{CompositeUriLocator, FsUriLocator, HttpUriLocator},
    model::TomlModelResolver,
};
use asset_watch_domain::{
    CacheStore, CheckOutcome,
    usecases::{GroupCheck, ResourceWatcher, WatchLoop, WatchLoopConfig},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::args::WatchArgs;
use crate::config::AppConfig;

pub async fn execute(args: WatchArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let model_path = args.model.unwrap_or_else(|| config.general.model_path.clone());
    let groups = if args.groups.is_empty() {
        config.watch.groups.clone()
    } else {
        args.groups
    };

    tracing::info!(
        model = %model_path.display(),
        context_root = %config.general.context_root.display(),
        once = args.once,
        groups = ?groups,
        journal = ?config.watch.journal_path,
        "Starting asset-watch"
    );

    let model_resolver = Arc::new(
        TomlModelResolver::new(&model_path).context("Failed to initialize model resolver")?,
    );
    let locator = Arc::new(build_locator(&config)?);
    let cache_store = build_cache_store(&config).await?;

    let watcher = Arc::new(ResourceWatcher::new(
        Arc::clone(&model_resolver),
        locator,
        cache_store,
    ));

    let watch_loop = WatchLoop::new(
        model_resolver,
        watcher,
        WatchLoopConfig {
            groups,
            max_concurrent: config.watch.max_concurrent,
        },
    );

    if args.once {
        tracing::info!("Running single poll cycle");
        let results = watch_loop.poll_once().await?;
        for result in &results {
            print_result(result);
        }
        tracing::info!(groups = results.len(), "Poll cycle complete");
        return Ok(());
    }

    let mut ticker = interval(Duration::from_secs(config.watch.poll_interval_secs.max(1)));

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match watch_loop.poll_once().await {
                    Ok(results) => {
                        let invalidated = results
                            .iter()
                            .filter(|r| r.outcome.is_invalidated())
                            .count();
                        if invalidated > 0 {
                            tracing::info!(invalidated, groups = results.len(), "Poll cycle complete");
                        } else {
                            tracing::debug!(groups = results.len(), "Poll cycle complete");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Poll cycle failed");
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutting down gracefully");
                break;
            }
        }
    }

    Ok(())
}

/// Local files first, then http(s)
pub fn build_locator(config: &AppConfig) -> Result<CompositeUriLocator> {
    let http = HttpUriLocator::new(Duration::from_secs(config.locator.http_timeout_secs))
        .context("Failed to build HTTP client")?;

    Ok(CompositeUriLocator::new(vec![
        Arc::new(FsUriLocator::new(config.general.context_root.clone())),
        Arc::new(http),
    ]))
}

async fn build_cache_store(config: &AppConfig) -> Result<Arc<dyn CacheStore>> {
    let memory: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());

    let Some(path) = config.watch.journal_path.clone() else {
        return Ok(memory);
    };

    let writer = JournalWriter::open(path.clone())
        .await
        .with_context(|| format!("Failed to open journal: {}", path.display()))?;

    tracing::info!(journal = %path.display(), "Journaling invalidations");
    Ok(Arc::new(JournalingCacheStore::new(memory, writer)))
}

fn print_result(result: &GroupCheck) {
    match &result.outcome {
        CheckOutcome::Unchanged => println!("{}: unchanged", result.group),
        CheckOutcome::Invalidated { resource } => println!(
            "{}: invalidated {} key(s), changed {}",
            result.group,
            result.keys.len(),
            resource
        ),
        CheckOutcome::Failed { reason } => println!("{}: failed ({})", result.group, reason),
    }
}
