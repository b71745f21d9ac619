//! Watch loop use case - periodically checks every cached group for changes

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};

use crate::{
    model::{CacheKey, CheckOutcome, Group},
    ports::{CacheStore, ModelResolver, UriLocator},
    usecases::watcher::ResourceWatcher,
};

/// Configuration for the watch loop
#[derive(Debug, Clone)]
pub struct WatchLoopConfig {
    /// Groups to watch (empty = every group of the model)
    pub groups: Vec<String>,
    /// Maximum number of groups checked concurrently
    pub max_concurrent: usize,
}

impl Default for WatchLoopConfig {
    fn default() -> Self {
        Self {
            groups: vec![],
            max_concurrent: 4,
        }
    }
}

/// Result of checking one group during a poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCheck {
    pub group: String,
    pub keys: Vec<CacheKey>,
    pub outcome: CheckOutcome,
}

/// Watch loop orchestrator
pub struct WatchLoop<M, L, C>
where
    M: ModelResolver + ?Sized,
    L: UriLocator + ?Sized,
    C: CacheStore + ?Sized,
{
    model_resolver: Arc<M>,
    watcher: Arc<ResourceWatcher<M, L, C>>,
    config: WatchLoopConfig,
}

impl<M, L, C> WatchLoop<M, L, C>
where
    M: ModelResolver + ?Sized,
    L: UriLocator + ?Sized,
    C: CacheStore + ?Sized,
{
    pub fn new(
        model_resolver: Arc<M>,
        watcher: Arc<ResourceWatcher<M, L, C>>,
        config: WatchLoopConfig,
    ) -> Self {
        Self {
            model_resolver,
            watcher,
            config,
        }
    }

    /// Run a single poll cycle over all watched groups
    pub async fn poll_once(&self) -> Result<Vec<GroupCheck>, WatchLoopError> {
        let model = self
            .model_resolver
            .load_model()
            .await
            .map_err(|e| WatchLoopError::Model(e.to_string()))?;

        let order: HashMap<String, usize> = model
            .groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.name.clone(), i))
            .collect();
        self.forget_removed_groups(&order);
        let groups = self.select_groups(model.groups);

        tracing::debug!(group_count = groups.len(), "Polling groups for changes");

        let max_concurrent = self.config.max_concurrent.max(1);
        let mut results = Vec::with_capacity(groups.len());
        let mut tasks: FuturesUnordered<BoxFuture<'_, GroupCheck>> = FuturesUnordered::new();
        let mut groups_iter = groups.into_iter();

        loop {
            while tasks.len() < max_concurrent {
                let Some(group) = groups_iter.next() else {
                    break;
                };
                tasks.push(Box::pin(self.check(group)));
            }

            match tasks.next().await {
                Some(result) => results.push(result),
                None => break,
            }
        }

        // Completion order is arbitrary; report in model order instead.
        results.sort_by_key(|r| order.get(&r.group).copied().unwrap_or(usize::MAX));

        Ok(results)
    }

    async fn check(&self, group: Group) -> GroupCheck {
        let keys = group.cache_keys();
        let outcome = match self.watcher.check_group(&group.name, &keys).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(group = %group.name, error = %e, "Skipping group");
                CheckOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        GroupCheck {
            group: group.name,
            keys,
            outcome,
        }
    }

    /// Drop fingerprints of groups that are no longer in the model
    fn forget_removed_groups(&self, model_groups: &HashMap<String, usize>) {
        let detector = self.watcher.detector();
        for group in detector.tracked_groups() {
            if !model_groups.contains_key(&group) {
                tracing::debug!(group = %group, "Forgetting fingerprints of removed group");
                detector.forget_group(&group);
            }
        }
    }

    fn select_groups(&self, groups: Vec<Group>) -> Vec<Group> {
        if self.config.groups.is_empty() {
            return groups;
        }

        for name in &self.config.groups {
            if !groups.iter().any(|g| &g.name == name) {
                tracing::warn!(group = %name, "Configured group not found in model");
            }
        }

        groups
            .into_iter()
            .filter(|g| self.config.groups.contains(&g.name))
            .collect()
    }
}

/// Errors from the watch loop
#[derive(Debug, thiserror::Error)]
pub enum WatchLoopError {
    #[error("Model error: {0}")]
    Model(String),
}
