//! Resource processors
//!
//! Pre-processors run per resource and see its identity; post-processors run
//! over already merged content. The change-detection core only relies on the
//! css import inspection, the rest is shared with the bundling pipeline.

pub mod comment_stripper;
pub mod css_import;

pub use comment_stripper::MultiLineCommentStripper;
pub use css_import::CssImportProcessor;

use thiserror::Error;

use crate::model::Resource;

/// Error type for processor failures
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Malformed content in {uri}: {message}")]
    Malformed { uri: String, message: String },
    #[error("Processing failed: {0}")]
    Failed(String),
}

/// Processor applied to a single resource before merging
pub trait ResourcePreProcessor: Send + Sync {
    fn pre_process(&self, resource: &Resource, content: &str) -> Result<String, ProcessorError>;
}

/// Processor applied to merged content
pub trait ResourcePostProcessor: Send + Sync {
    fn post_process(&self, content: &str) -> Result<String, ProcessorError>;
}

impl<P: ResourcePreProcessor + ?Sized> ResourcePreProcessor for Box<P> {
    fn pre_process(&self, resource: &Resource, content: &str) -> Result<String, ProcessorError> {
        (**self).pre_process(resource, content)
    }
}

impl<P: ResourcePostProcessor + ?Sized> ResourcePostProcessor for Box<P> {
    fn post_process(&self, content: &str) -> Result<String, ProcessorError> {
        (**self).post_process(content)
    }
}

/// Decorator that treats a failing processor as a no-op: the input is
/// passed through untouched.
#[derive(Debug, Clone)]
pub struct IgnoreFailures<P> {
    inner: P,
}

impl<P> IgnoreFailures<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: ResourcePreProcessor> ResourcePreProcessor for IgnoreFailures<P> {
    fn pre_process(&self, resource: &Resource, content: &str) -> Result<String, ProcessorError> {
        match self.inner.pre_process(resource, content) {
            Ok(output) => Ok(output),
            Err(e) => {
                tracing::debug!(resource = %resource, error = %e, "Ignoring failed pre-processor");
                Ok(content.to_string())
            }
        }
    }
}

impl<P: ResourcePostProcessor> ResourcePostProcessor for IgnoreFailures<P> {
    fn post_process(&self, content: &str) -> Result<String, ProcessorError> {
        match self.inner.post_process(content) {
            Ok(output) => Ok(output),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring failed post-processor");
                Ok(content.to_string())
            }
        }
    }
}

/// Look up a pre-processor by its configuration alias
pub fn pre_processor(alias: &str) -> Option<Box<dyn ResourcePreProcessor>> {
    match alias {
        MultiLineCommentStripper::ALIAS => Some(Box::new(MultiLineCommentStripper::new())),
        CssImportProcessor::ALIAS => Some(Box::new(CssImportProcessor::new())),
        _ => None,
    }
}

/// Look up a post-processor by its configuration alias
pub fn post_processor(alias: &str) -> Option<Box<dyn ResourcePostProcessor>> {
    match alias {
        MultiLineCommentStripper::ALIAS => Some(Box::new(MultiLineCommentStripper::new())),
        _ => None,
    }
}

/// All known processor aliases
pub fn aliases() -> &'static [&'static str] {
    &[MultiLineCommentStripper::ALIAS, CssImportProcessor::ALIAS]
}
