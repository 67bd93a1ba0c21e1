//! Error types for the tinkoff-kassa-rs library.
//!
//! This module defines all error types that can occur while building, signing
//! and sending requests to the payment API.

use thiserror::Error;

/// Main error type for payment API operations.
#[derive(Error, Debug)]
pub enum KassaError {
    /// The private key file is missing, unreadable or not a valid unencrypted PEM key
    #[error("Key load error: {0}")]
    KeyLoadError(String),

    /// The cryptographic signing operation failed
    #[error("Signature error: {0}")]
    SignatureError(String),

    /// A required field is absent or empty
    #[error("Missing required field: {0}")]
    ValidationError(String),

    /// Error during HTTP request/response handling
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status
    #[error("HTTP status {status}: {body}")]
    HttpStatusError {
        /// Status code of the response
        status: u16,
        /// Raw response body, if any
        body: String,
    },

    /// Error during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error parsing or joining an endpoint URL
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The API processed the request but reported `Success: false`
    #[error("API error {code}: {message}")]
    ApiError {
        /// `ErrorCode` returned by the API
        code: String,
        /// `Message` returned by the API
        message: String,
        /// Optional `Details` returned by the API
        details: Option<String>,
    },
}

/// Result type alias for payment API operations.
pub type Result<T> = std::result::Result<T, KassaError>;

impl From<rsa::Error> for KassaError {
    fn from(err: rsa::Error) -> Self {
        KassaError::SignatureError(err.to_string())
    }
}
