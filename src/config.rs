//! Client configuration.
//!
//! [`ClientConfig`] collects the terminal credentials and transport settings
//! shared by [`PayoutsClient`](crate::payouts::PayoutsClient) and
//! [`SafeDealClient`](crate::safe_deal::SafeDealClient).

use crate::auth::{PrivateKey, TerminalPassword};
use crate::errors::{KassaError, Result};
use crate::transport::{Transport, DEFAULT_TIMEOUT};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Base URL of the payouts (E2C) API.
pub const DEFAULT_PAYOUTS_URL: &str = "https://securepay.tinkoff.ru/e2c/v2/";

/// Base URL of the safe deal API.
pub const DEFAULT_SAFE_DEAL_URL: &str = "https://securepay.tinkoff.ru/v2/";

/// Key file used when no path is configured.
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "private.key";

/// Environment variable names read by [`ClientConfig::from_env`].
pub mod env {
    /// Terminal identifier (required)
    pub const TERMINAL_KEY: &str = "TINKOFF_TERMINAL_KEY";
    /// Serial number of the terminal certificate
    pub const X509_SERIAL_NUMBER: &str = "TINKOFF_X509_SERIAL_NUMBER";
    /// Path to the PEM private key
    pub const PRIVATE_KEY_PATH: &str = "TINKOFF_PRIVATE_KEY_PATH";
    /// Terminal password for token authentication
    pub const TERMINAL_PASSWORD: &str = "TINKOFF_TERMINAL_PASSWORD";
    /// API base URL override
    pub const API_URL: &str = "TINKOFF_API_URL";
    /// Request timeout in seconds
    pub const TIMEOUT_SECS: &str = "TINKOFF_TIMEOUT_SECS";
}

/// Configuration for API clients.
///
/// # Examples
///
/// ```
/// use tinkoff_kassa::config::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("TinkoffBankTest")
///     .with_x509_serial_number("4a0b1f")
///     .with_private_key_path("keys/terminal.pem")
///     .with_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.terminal_key, "TinkoffBankTest");
/// ```
pub struct ClientConfig {
    /// Terminal identifier sent as `TerminalKey`
    pub terminal_key: String,

    /// Base URL override; each client has its own default
    pub base_url: Option<String>,

    /// Certificate serial number sent as `X509SerialNumber` (payouts only)
    pub x509_serial_number: Option<String>,

    /// PEM private key read on every signed request (payouts only)
    pub private_key_path: PathBuf,

    /// Pre-loaded private key; takes precedence over `private_key_path`
    pub private_key: Option<PrivateKey>,

    /// Terminal password (safe deal only)
    pub password: Option<TerminalPassword>,

    /// Request timeout for the default transport
    pub timeout: Duration,

    /// Custom transport; an [`HttpTransport`](crate::transport::HttpTransport) is built when absent
    pub transport: Option<Arc<dyn Transport>>,
}

impl ClientConfig {
    /// Creates a configuration for a terminal.
    pub fn new(terminal_key: impl Into<String>) -> Self {
        Self {
            terminal_key: terminal_key.into(),
            base_url: None,
            x509_serial_number: None,
            private_key_path: PathBuf::from(DEFAULT_PRIVATE_KEY_PATH),
            private_key: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
            transport: None,
        }
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the certificate serial number.
    pub fn with_x509_serial_number(mut self, serial: impl Into<String>) -> Self {
        self.x509_serial_number = Some(serial.into());
        self
    }

    /// Sets the private key path.
    pub fn with_private_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key_path = path.into();
        self
    }

    /// Uses an already loaded private key instead of reading the file per request.
    pub fn with_private_key(mut self, key: PrivateKey) -> Self {
        self.private_key = Some(key);
        self
    }

    /// Sets the terminal password.
    pub fn with_password(mut self, password: TerminalPassword) -> Self {
        self.password = Some(password);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a custom transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Loads the configuration from `TINKOFF_*` environment variables.
    ///
    /// See [`env`] for the variable names.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let terminal_key = var(env::TERMINAL_KEY)
            .ok_or_else(|| KassaError::ConfigError(format!("{} is not set", env::TERMINAL_KEY)))?;
        let mut config = Self::new(terminal_key);

        config.x509_serial_number = var(env::X509_SERIAL_NUMBER);
        config.base_url = var(env::API_URL);
        config.password = var(env::TERMINAL_PASSWORD).map(TerminalPassword::new);
        if let Some(path) = var(env::PRIVATE_KEY_PATH) {
            config.private_key_path = PathBuf::from(path);
        }
        if let Some(secs) = var(env::TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                KassaError::ConfigError(format!("{} must be a number of seconds, got '{}'", env::TIMEOUT_SECS, secs))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("terminal_key", &self.terminal_key)
            .field("base_url", &self.base_url)
            .field("x509_serial_number", &self.x509_serial_number)
            .field("private_key_path", &self.private_key_path)
            .field("private_key", &self.private_key)
            .field("password", &self.password)
            .field("timeout", &self.timeout)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .finish()
    }
}
