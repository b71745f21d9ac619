//! asset-watch adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `model`: TOML model file resolver
//! - `locator`: Filesystem, HTTP and composite uri locators
//! - `cache`: In-memory cache store and the invalidation journal

mod cache_memory;
pub mod journal;
mod model_toml;

pub mod locator;

/// Re-exports for model adapters
pub mod model {
    pub use crate::model_toml::TomlModelResolver;
}

/// Re-exports for cache adapters
pub mod cache {
    pub use crate::cache_memory::InMemoryCacheStore;
    pub use crate::journal::{JournalWriter, JournalingCacheStore};
}
