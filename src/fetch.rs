//! Network access for a single URL
//!
//! [`UrlFetcher`] is the seam the pipeline fetches through. [`HttpFetcher`] is
//! the production implementation: exactly one GET per call, no retries and no
//! custom headers.

use std::{error::Error as _, time::Duration};

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::{ConfigError, FetchError, RawDocument};

/// Trait for fetching the raw document behind a URL
///
/// Implement this to plug a different transport into the pipeline, or to
/// serve canned pages in tests.
///
/// # Example
///
/// ```ignore
/// use extractly::{FetchError, RawDocument, UrlFetcher};
///
/// struct StaticFetcher;
///
/// #[async_trait::async_trait]
/// impl UrlFetcher for StaticFetcher {
///     async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
///         Ok(RawDocument::html(url, "<title>Static</title>"))
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait UrlFetcher: Send + Sync {
    /// Fetch one URL
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError>;
}

/// HTTP fetcher backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the transport's default settings
    pub fn new() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::default()
    }

    /// Wrap an already configured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl UrlFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
        debug!(url, "fetching");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                message: error_chain(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                url: response.url().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await.map_err(|e| FetchError::Body {
            message: error_chain(&e),
        })?;

        debug!(url, bytes = body.len(), "fetched");
        Ok(RawDocument::new(url, body.to_vec(), content_type))
    }
}

/// Render an error and all of its sources as one line
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// Builder for configuring an [`HttpFetcher`]
#[derive(Debug, Default)]
pub struct HttpFetcherBuilder {
    timeout: Option<Duration>,
}

impl HttpFetcherBuilder {
    /// Abort requests that take longer than `timeout` (default: no timeout)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the fetcher
    pub fn build(self) -> Result<HttpFetcher, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(HttpFetcher::with_client(client))
    }
}
