//! # tinkoff-kassa-rs
//!
//! A Rust client for the Tinkoff Kassa payouts (E2C) and safe deal APIs.
//!
//! The API authenticates every request with artifacts computed from the
//! request's own fields. This crate builds the payload, signs it and POSTs it
//! as JSON; responses are parsed into typed structs.
//!
//! ## Features
//!
//! - **Digest signing**: SHA-256 digest + RSA PKCS#1 v1.5 signature with the terminal key
//! - **Token signing**: SHA-256 token over the fields and the terminal password
//! - **Payouts**: customers, card binding, payouts to cards and their status
//! - **Safe deal**: escrow-style deals (init, confirm, cancel, payment)
//! - **Pluggable transport**: `reqwest` by default, any [`transport::Transport`] otherwise
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tinkoff_kassa::config::ClientConfig;
//! use tinkoff_kassa::payouts::PayoutsClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PayoutsClient::new(
//!     ClientConfig::new("TinkoffBankTest")
//!         .with_x509_serial_number("4a0b1f")
//!         .with_private_key_path("private.key"),
//! )?;
//!
//! let payout = client.init_payout("order-1", "card-1", 10_000, None).await?;
//! let state = client.get_payout_status(payout.payment_id.as_deref().unwrap_or_default()).await?;
//! println!("Status: {:?}", state.status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Signing
//!
//! The signed fields are sorted by name and their values concatenated:
//!
//! 1. `DigestValue`, `SignatureValue` and `X509SerialNumber` never take part
//! 2. Strings are used as-is, numbers as their decimal text, booleans as `true`/`false`
//! 3. Nested objects and arrays (e.g. `DATA`) are sent but not signed
//!
//! Digest mode hashes the result with SHA-256 and signs the hash bytes; token
//! mode appends the terminal password as a `Password` field before hashing.
//! Artifacts are recomputed for every request.
//!
//! ## Logging
//!
//! The library emits [`tracing`] events and never installs a subscriber;
//! install one in the application, e.g. `tracing_subscriber::fmt::init()`.
//! Secret material is never logged.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod payouts;
pub mod safe_deal;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use auth::{
    generate_signature_and_digest, generate_token, Authenticator, DigestSigner, PrivateKey,
    SignatureArtifacts, TerminalPassword, TokenSigner,
};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use errors::{KassaError, Result};
pub use payouts::PayoutsClient;
pub use safe_deal::SafeDealClient;
pub use types::{ApiResponse, Payload, ResponseStatus};
