//! Uri locator adapters

mod fs;
mod http;

pub use fs::FsUriLocator;
pub use http::HttpUriLocator;

use async_trait::async_trait;
use asset_watch_domain::{LocatorError, UriLocator};
use std::sync::Arc;

/// Dispatches each URI to the first locator that accepts it
#[derive(Default)]
pub struct CompositeUriLocator {
    locators: Vec<Arc<dyn UriLocator>>,
}

impl CompositeUriLocator {
    pub fn new(locators: Vec<Arc<dyn UriLocator>>) -> Self {
        Self { locators }
    }

    fn find(&self, uri: &str) -> Option<&Arc<dyn UriLocator>> {
        self.locators.iter().find(|l| l.accepts(uri))
    }
}

#[async_trait]
impl UriLocator for CompositeUriLocator {
    fn accepts(&self, uri: &str) -> bool {
        self.find(uri).is_some()
    }

    async fn locate(&self, uri: &str) -> Result<Vec<u8>, LocatorError> {
        match self.find(uri) {
            Some(locator) => locator.locate(uri).await,
            None => Err(LocatorError::Unsupported(uri.to_string())),
        }
    }
}
