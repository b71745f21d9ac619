//! In-memory cache store

use async_trait::async_trait;
use asset_watch_domain::{CacheError, CacheKey, CacheStore, CacheValue};
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local bundle cache
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<CacheKey, CacheValue>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &CacheKey, value: CacheValue) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        entries.insert(key.clone(), value);
        Ok(())
    }
}
