//! Fail-open handling for change-detection steps

use std::fmt::Display;
use thiserror::Error;

use crate::model::{Change, Resource};
use crate::ports::LocatorError;
use crate::processors::ProcessorError;

/// Failures that can occur while scanning a resource for changes
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] LocatorError),
    #[error("Scan failed: {0}")]
    Malformed(#[from] ProcessorError),
}

/// Collapse the result of a scan step into a [`Change`], treating any
/// failure as "no change contributed by this step".
pub fn fail_open<E: Display>(resource: &Resource, result: Result<Change, E>) -> Change {
    match result {
        Ok(change) => change,
        Err(e) => {
            tracing::debug!(
                resource = %resource,
                error = %e,
                "Cannot scan resource, assuming it is unchanged"
            );
            Change::Unchanged
        }
    }
}
