//! HTTP locator

use async_trait::async_trait;
use asset_watch_domain::{LocatorError, UriLocator};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Fetches `http://` and `https://` resources
pub struct HttpUriLocator {
    client: Client,
}

impl HttpUriLocator {
    pub fn new(timeout: Duration) -> Result<Self, LocatorError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LocatorError::Network(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UriLocator for HttpUriLocator {
    fn accepts(&self, uri: &str) -> bool {
        let lower = uri.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    async fn locate(&self, uri: &str) -> Result<Vec<u8>, LocatorError> {
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| LocatorError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(LocatorError::NotFound(uri.to_string()));
        }
        if !status.is_success() {
            return Err(LocatorError::Network(format!(
                "GET {} returned {}",
                uri, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LocatorError::Network(e.to_string()))?;

        tracing::trace!(uri = %uri, bytes = body.len(), "Fetched remote resource");
        Ok(body.to_vec())
    }
}
