//! Signed request execution.
//!
//! [`ApiClient`] ties a base URL, an [`Authenticator`] and a [`Transport`]
//! together: every call signs the payload, POSTs it to the endpoint and parses
//! the JSON answer. The typed clients in [`payouts`](crate::payouts) and
//! [`safe_deal`](crate::safe_deal) are thin wrappers around it.

use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::errors::Result;
use crate::transport::{HttpTransport, Transport};
use crate::types::Payload;
use crate::utils::{endpoint_url, parse_base_url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Executes authenticated requests against one API base URL.
pub struct ApiClient {
    base_url: Url,
    authenticator: Box<dyn Authenticator>,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    /// Creates a client.
    ///
    /// # Examples
    ///
    /// ```
    /// use tinkoff_kassa::auth::{TerminalPassword, TokenSigner};
    /// use tinkoff_kassa::client::ApiClient;
    /// use tinkoff_kassa::transport::HttpTransport;
    /// use std::sync::Arc;
    ///
    /// let client = ApiClient::new(
    ///     "https://securepay.tinkoff.ru/v2/",
    ///     Box::new(TokenSigner::new(TerminalPassword::new("password"))),
    ///     Arc::new(HttpTransport::default()),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(client.base_url().as_str(), "https://securepay.tinkoff.ru/v2/");
    /// ```
    pub fn new(
        base_url: &str,
        authenticator: Box<dyn Authenticator>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            authenticator,
            transport,
        })
    }

    /// Creates a client from the transport settings of a [`ClientConfig`].
    pub(crate) fn from_config(
        config: &ClientConfig,
        default_url: &str,
        authenticator: Box<dyn Authenticator>,
    ) -> Result<Self> {
        let transport: Arc<dyn Transport> = match &config.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(HttpTransport::new(config.timeout)?),
        };
        let base_url = config.base_url.as_deref().unwrap_or(default_url);
        Self::new(base_url, authenticator, transport)
    }

    /// Base URL endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends `payload` as-is; used for requests that already carry their own
    /// artifacts.
    pub async fn execute_unsigned(&self, endpoint: &str, payload: Payload) -> Result<Value> {
        let url = endpoint_url(&self.base_url, endpoint)?;
        self.transport.post(&url, &payload).await
    }

    /// Signs `payload`, sends it to `endpoint` and returns the JSON answer.
    pub async fn execute(&self, endpoint: &str, mut payload: Payload) -> Result<Value> {
        if let Err(e) = self.authenticator.authenticate(&mut payload) {
            tracing::error!(
                endpoint,
                mode = self.authenticator.name(),
                error = %e,
                "failed to authenticate request"
            );
            return Err(e);
        }
        self.execute_unsigned(endpoint, payload).await
    }

    /// Like [`ApiClient::execute`], deserializing the answer into `T`.
    pub async fn execute_as<T: DeserializeOwned>(&self, endpoint: &str, payload: Payload) -> Result<T> {
        let body = self.execute(endpoint, payload).await?;
        Ok(serde_json::from_value(body)?)
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticator", &self.authenticator.name())
            .finish()
    }
}
