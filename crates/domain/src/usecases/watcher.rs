//! Resource watcher use case - detects stale groups and invalidates their cache entries

use std::sync::Arc;
use std::time::Instant;

use crate::{
    model::{CacheKey, CacheValue, CheckOutcome, Group, Resource, is_blank_group_name},
    ports::{CacheError, CacheStore, ModelError, ModelResolver, UriLocator},
    usecases::{
        change_detector::{PendingFingerprint, ResourceChangeDetector},
        import_scanner::{ScanState, is_changed},
    },
};

/// Errors surfaced by the watcher.
///
/// Only [`WatchError::InvalidKey`] escapes [`ResourceWatcher::check`]; the
/// other variants are logged and reported as [`CheckOutcome::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// A resource of a group that changed since its last recorded fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedChange {
    pub resource: Resource,
    /// New fingerprint of the changed uri, recorded once the group's cache
    /// entries are invalidated
    pub fingerprint: Option<PendingFingerprint>,
}

/// Checks whether the resources of a group changed and, if so, tombstones
/// the cache entries built from that group.
///
/// The watcher is meant to be shared (`Arc`) between concurrent callers.
/// Each check owns its visited set; fingerprints are shared through the
/// detector. A new fingerprint is only recorded after every tombstone of the
/// check was written, so a failed write is retried on the next check.
pub struct ResourceWatcher<M, L, C>
where
    M: ModelResolver + ?Sized,
    L: UriLocator + ?Sized,
    C: CacheStore + ?Sized,
{
    model_resolver: Arc<M>,
    cache_store: Arc<C>,
    detector: ResourceChangeDetector<L>,
}

impl<M, L, C> ResourceWatcher<M, L, C>
where
    M: ModelResolver + ?Sized,
    L: UriLocator + ?Sized,
    C: CacheStore + ?Sized,
{
    pub fn new(model_resolver: Arc<M>, locator: Arc<L>, cache_store: Arc<C>) -> Self {
        Self {
            model_resolver,
            cache_store,
            detector: ResourceChangeDetector::new(locator),
        }
    }

    /// Check the group named by `key` and invalidate `key` if any of its
    /// resources changed.
    ///
    /// Performs at most one cache write. Failures while resolving the group
    /// or writing the tombstone are reported as [`CheckOutcome::Failed`].
    pub async fn check(&self, key: &CacheKey) -> Result<CheckOutcome, WatchError> {
        if key.is_blank() {
            return Err(WatchError::InvalidKey(format!("blank group name in {}", key)));
        }
        self.check_group(&key.group_name, std::slice::from_ref(key))
            .await
    }

    /// Check a group once and invalidate every key in `keys` on change.
    ///
    /// Fingerprints are tracked per group, so all cache entries built from
    /// the same group must be invalidated from a single detection pass.
    pub async fn check_group(
        &self,
        group_name: &str,
        keys: &[CacheKey],
    ) -> Result<CheckOutcome, WatchError> {
        if is_blank_group_name(group_name) {
            return Err(WatchError::InvalidKey("blank group name".to_string()));
        }
        if let Some(key) = keys.iter().find(|k| k.group_name != group_name) {
            return Err(WatchError::InvalidKey(format!(
                "key {} does not belong to group {}",
                key, group_name
            )));
        }

        tracing::debug!(group = %group_name, "Resource watcher started");
        let started = Instant::now();

        let outcome = match self.detect_change(group_name).await {
            Ok(Some(change)) => self.on_group_changed(keys, change).await,
            Ok(None) => CheckOutcome::Unchanged,
            Err(e) => self.on_error(e),
        };

        self.detector.reset_cycle();

        tracing::debug!(
            group = %group_name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Resource watcher finished"
        );

        Ok(outcome)
    }

    /// First resource of `group` that changed, in declaration order.
    ///
    /// The change is not recorded: until its fingerprint is committed to
    /// the detector, later calls report it again.
    pub async fn changed_resource(&self, group: &Group) -> Option<DetectedChange> {
        tracing::debug!(group = %group.name, "Checking if group is changed");

        let mut state = ScanState::new();
        for resource in &group.resources {
            if is_changed(&self.detector, resource, &group.name, &mut state)
                .await
                .is_changed()
            {
                tracing::debug!(group = %group.name, resource = %resource, "Resource changed");
                return Some(DetectedChange {
                    resource: resource.clone(),
                    fingerprint: state.take_pending(),
                });
            }
        }

        None
    }

    pub fn detector(&self) -> &ResourceChangeDetector<L> {
        &self.detector
    }

    async fn detect_change(&self, group_name: &str) -> Result<Option<DetectedChange>, WatchError> {
        let group = self.model_resolver.resolve_group(group_name).await?;
        Ok(self.changed_resource(&group).await)
    }

    async fn on_group_changed(&self, keys: &[CacheKey], change: DetectedChange) -> CheckOutcome {
        let resource = change.resource;
        for key in keys {
            tracing::debug!(key = %key, "Detected change for cache key");
            if let Err(e) = self.cache_store.put(key, CacheValue::Tombstone).await {
                return self.on_error(e.into());
            }
            tracing::info!(key = %key, resource = %resource.uri(), "Invalidated cache entry");
        }

        if let Some(fingerprint) = change.fingerprint {
            self.detector.commit(fingerprint);
        }

        CheckOutcome::Invalidated {
            resource: resource.uri().to_string(),
        }
    }

    fn on_error(&self, error: WatchError) -> CheckOutcome {
        tracing::info!(error = %error, "Could not check for resource changes");
        CheckOutcome::Failed {
            reason: error.to_string(),
        }
    }
}
