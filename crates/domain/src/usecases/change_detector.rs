//! Content fingerprinting and per-group change tracking

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::compute_digest;
use crate::ports::{LocatorError, UriLocator};

/// Fingerprints are tracked per group: the same resource shared by two
/// groups must be reported as changed to each of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FingerprintKey {
    uri: String,
    group: String,
}

/// Result of comparing current content against the stored fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Unchanged,
    Changed(PendingFingerprint),
}

/// A new digest for a (uri, group) pair that is not recorded yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFingerprint {
    key: FingerprintKey,
    digest: String,
}

impl PendingFingerprint {
    pub fn uri(&self) -> &str {
        &self.key.uri
    }

    pub fn group(&self) -> &str {
        &self.key.group
    }
}

/// Detects resource changes by comparing content digests.
///
/// Two pieces of state are kept:
/// - the fingerprint table, which persists across checks and holds the last
///   digest seen per (uri, group) pair;
/// - the cycle memo, holding content fetched during the current check cycle
///   so that the import scanner does not fetch a stylesheet twice. Only this
///   memo is cleared by [`reset_cycle`](Self::reset_cycle).
///
/// Locks are held only to read or update a map, never across a fetch.
pub struct ResourceChangeDetector<L: UriLocator + ?Sized> {
    locator: Arc<L>,
    fingerprints: Mutex<HashMap<FingerprintKey, String>>,
    cycle_content: Mutex<HashMap<String, Arc<[u8]>>>,
}

impl<L: UriLocator + ?Sized> ResourceChangeDetector<L> {
    pub fn new(locator: Arc<L>) -> Self {
        Self {
            locator,
            fingerprints: Mutex::new(HashMap::new()),
            cycle_content: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether the content behind `uri` changed since it was last seen
    /// for `group`, recording the new digest right away.
    ///
    /// The first observation of a pair records the baseline and reports no
    /// change. A differing digest replaces the stored one and reports a
    /// change; an identical digest leaves the record untouched.
    pub async fn check_changed(&self, uri: &str, group: &str) -> Result<bool, LocatorError> {
        match self.observe(uri, group).await? {
            Observation::Changed(pending) => {
                self.commit(pending);
                Ok(true)
            }
            Observation::Unchanged => Ok(false),
        }
    }

    /// Like [`check_changed`](Self::check_changed), but a changed digest is
    /// returned instead of stored. Until it is [committed](Self::commit),
    /// every later observation reports the same change again.
    ///
    /// Baselines are still recorded immediately.
    pub async fn observe(&self, uri: &str, group: &str) -> Result<Observation, LocatorError> {
        let content = self.content(uri).await?;
        let digest = compute_digest(&content);

        let key = FingerprintKey {
            uri: uri.to_string(),
            group: group.to_string(),
        };

        let mut fingerprints = lock(&self.fingerprints);
        let observation = match fingerprints.get(&key) {
            None => {
                tracing::debug!(uri = %uri, group = %group, "Recorded baseline fingerprint");
                fingerprints.insert(key, digest);
                Observation::Unchanged
            }
            Some(previous) if *previous != digest => {
                tracing::debug!(uri = %uri, group = %group, "Fingerprint changed");
                Observation::Changed(PendingFingerprint { key, digest })
            }
            Some(_) => Observation::Unchanged,
        };

        Ok(observation)
    }

    /// Record the digest of an observed change
    pub fn commit(&self, pending: PendingFingerprint) {
        tracing::debug!(uri = %pending.key.uri, group = %pending.key.group, "Committed fingerprint");
        lock(&self.fingerprints).insert(pending.key, pending.digest);
    }

    /// Content of `uri` for the current cycle, fetched at most once per cycle
    pub async fn content(&self, uri: &str) -> Result<Arc<[u8]>, LocatorError> {
        let cached = lock(&self.cycle_content).get(uri).cloned();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let fetched: Arc<[u8]> = self.locator.locate(uri).await?.into();
        lock(&self.cycle_content).insert(uri.to_string(), Arc::clone(&fetched));
        Ok(fetched)
    }

    /// Clear cycle-local state. Fingerprints are kept.
    pub fn reset_cycle(&self) {
        lock(&self.cycle_content).clear();
    }

    /// Last digest recorded for the pair, if any
    pub fn fingerprint(&self, uri: &str, group: &str) -> Option<String> {
        let key = FingerprintKey {
            uri: uri.to_string(),
            group: group.to_string(),
        };
        lock(&self.fingerprints).get(&key).cloned()
    }

    /// Forget every fingerprint recorded for `group`
    pub fn forget_group(&self, group: &str) {
        lock(&self.fingerprints).retain(|key, _| key.group != group);
    }

    /// Groups with at least one recorded fingerprint
    pub fn tracked_groups(&self) -> HashSet<String> {
        lock(&self.fingerprints)
            .keys()
            .map(|key| key.group.clone())
            .collect()
    }

    /// Number of tracked (uri, group) pairs
    pub fn tracked(&self) -> usize {
        lock(&self.fingerprints).len()
    }
}

// The maps stay consistent even if a holder panicked: every critical
// section is a single map operation.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
