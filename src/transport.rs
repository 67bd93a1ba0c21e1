//! HTTP transport for signed payloads.
//!
//! The [`Transport`] trait is the seam between request building and the
//! network. [`HttpTransport`] is the default implementation on top of
//! `reqwest`.

use crate::errors::{KassaError, Result};
use crate::types::Payload;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Default timeout for a single API request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends a finished payload to an endpoint and returns the parsed JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs `payload` as JSON to `url`.
    ///
    /// Non-success HTTP statuses are errors; the body of a successful
    /// response must be JSON.
    async fn post(&self, url: &Url, payload: &Payload) -> Result<Value>;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::with_client(Client::new())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &Url, payload: &Payload) -> Result<Value> {
        tracing::debug!(
            endpoint = %url,
            fields = ?payload.keys().collect::<Vec<_>>(),
            "sending request"
        );

        let response = self
            .client
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(endpoint = %url, error = %e, "network error");
                KassaError::HttpError(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::debug!(endpoint = %url, error = %e, "failed to read error body");
                String::new()
            });
            tracing::error!(endpoint = %url, status = status.as_u16(), "request failed");
            return Err(KassaError::HttpStatusError {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        tracing::info!(endpoint = %url, "request successful");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        assert!(HttpTransport::new(Duration::from_secs(5)).is_ok());
        let _ = HttpTransport::default();
    }
}
