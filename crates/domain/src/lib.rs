//! asset-watch domain crate
//!
//! This crate contains the change-detection core following hexagonal architecture:
//! - `model`: Resources, groups, cache keys and cache values
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `processors`: Resource processors (comment stripping, css imports)
//! - `usecases`: Change detection, import scanning and cache invalidation

pub mod model;
pub mod ports;
pub mod processors;
pub mod usecases;

pub use model::*;
pub use ports::*;

use sha2::{Digest, Sha256};

/// Compute the hex-encoded SHA-256 digest of some content.
/// Used as the resource fingerprint.
pub fn compute_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
