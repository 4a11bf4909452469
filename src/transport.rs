//! Transport: the opaque fetch capability used to download pack documents.
//!
//! The engine treats transport as a black box returning the raw document
//! text; decoding into the host's document type happens in the engine.

use futures::future::BoxFuture;
use tracing::debug;

use crate::error::TransportError;

/// Asynchronous fetch of a document body by URL.
pub trait Transport: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, TransportError>>;
}

/// HTTP transport backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a pre-configured client (custom timeouts, proxies, headers).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, TransportError>> {
        Box::pin(async move {
            debug!("Fetching language pack from {url}");

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))?;

            if !response.status().is_success() {
                return Err(TransportError::Status {
                    status: response.status().as_u16(),
                    url: url.to_string(),
                });
            }

            response
                .text()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))
        })
    }
}
