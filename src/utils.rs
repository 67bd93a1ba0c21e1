//! Utility functions for payment API requests.
//!
//! This module provides helpers for endpoint URLs and presence checks on
//! required fields used throughout the library.

use crate::errors::{KassaError, Result};
use url::Url;

/// Parses an API base URL, making sure it ends with `/` so endpoints join
/// underneath it instead of replacing its last segment.
///
/// # Examples
///
/// ```
/// use tinkoff_kassa::utils::parse_base_url;
///
/// let url = parse_base_url("https://securepay.tinkoff.ru/e2c/v2").unwrap();
/// assert_eq!(url.as_str(), "https://securepay.tinkoff.ru/e2c/v2/");
/// ```
pub fn parse_base_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    if url.cannot_be_a_base() {
        return Err(KassaError::ConfigError(format!("'{}' cannot be a base URL", base)));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Resolves an operation endpoint (e.g. `AddCustomer`) against the base URL.
///
/// # Examples
///
/// ```
/// use tinkoff_kassa::utils::{endpoint_url, parse_base_url};
///
/// let base = parse_base_url("https://securepay.tinkoff.ru/e2c/v2/").unwrap();
/// let url = endpoint_url(&base, "AddCustomer").unwrap();
/// assert_eq!(url.as_str(), "https://securepay.tinkoff.ru/e2c/v2/AddCustomer");
/// ```
pub fn endpoint_url(base: &Url, endpoint: &str) -> Result<Url> {
    Ok(base.join(endpoint.trim_start_matches('/'))?)
}

/// Fails with [`KassaError::ValidationError`] when a required value is blank.
///
/// # Examples
///
/// ```
/// use tinkoff_kassa::utils::require;
///
/// assert!(require("CustomerKey", "C1").is_ok());
/// assert!(require("CustomerKey", "  ").is_err());
/// ```
pub fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(KassaError::ValidationError(field.to_string()));
    }
    Ok(())
}
