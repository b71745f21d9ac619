//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the change-detection core and
//! the systems it collaborates with. Adapters implement them.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{CacheKey, CacheValue, Group, Model};

/// Error type for model resolution
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
    #[error("Group not found: {0}")]
    GroupNotFound(String),
    #[error("Duplicate group name '{0}'")]
    DuplicateGroup(String),
    #[error("Group '{group}' references unknown group '{reference}'")]
    UnknownReference { group: String, reference: String },
    #[error("Circular group reference: {}", chain.join(" -> "))]
    CircularReference { chain: Vec<String> },
}

/// Port for resolving groups from the resource model
#[async_trait]
pub trait ModelResolver: Send + Sync {
    /// Load the complete model
    async fn load_model(&self) -> Result<Model, ModelError>;

    /// Resolve a single group by name
    async fn resolve_group(&self, name: &str) -> Result<Group, ModelError> {
        let model = self.load_model().await?;
        model
            .groups
            .into_iter()
            .find(|g| g.name == name)
            .ok_or_else(|| ModelError::GroupNotFound(name.to_string()))
    }
}

/// Error type for resource content retrieval
#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("IO error reading {uri}: {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Network error: {0}")]
    Network(String),
    #[error("No locator accepts uri: {0}")]
    Unsupported(String),
    #[error("Uri escapes the context root: {0}")]
    OutsideRoot(String),
}

/// Port for fetching raw resource content
#[async_trait]
pub trait UriLocator: Send + Sync {
    /// Whether this locator can handle the given URI
    fn accepts(&self, uri: &str) -> bool;

    /// Fetch the content behind a URI
    async fn locate(&self, uri: &str) -> Result<Vec<u8>, LocatorError>;
}

/// Error type for cache store operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for the bundle cache
///
/// Invalidation is expressed by writing [`CacheValue::Tombstone`]; this
/// port has no delete operation.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>, CacheError>;

    async fn put(&self, key: &CacheKey, value: CacheValue) -> Result<(), CacheError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
