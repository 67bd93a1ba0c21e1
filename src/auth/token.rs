//! Password token authentication.
//!
//! The terminal password is added to the signed fields as `Password`, the
//! values are concatenated in key order and the lowercase hex SHA-256 of the
//! result is sent as `Token`.

use super::{concatenate, signing_fields, Authenticator, TOKEN_EXCLUDED_FIELDS};
use crate::errors::Result;
use crate::types::{Payload, PASSWORD, TOKEN};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fmt;

/// Shared password of a terminal.
///
/// The value is only reachable inside [`TerminalPassword::with_exposed`] and
/// is zeroed on drop.
pub struct TerminalPassword(SecretString);

impl TerminalPassword {
    /// Wraps a password.
    pub fn new(password: impl Into<String>) -> Self {
        Self(SecretString::from(password.into()))
    }

    /// Runs `f` with the plain password.
    pub fn with_exposed<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(self.0.expose_secret())
    }

    /// Returns `true` for an empty password.
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }
}

impl fmt::Debug for TerminalPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TerminalPassword([REDACTED])")
    }
}

/// Computes the `Token` of a payload.
///
/// The caller's payload is left untouched; the password only lives in a
/// temporary field list that is zeroed after hashing.
///
/// # Examples
///
/// ```
/// use tinkoff_kassa::auth::{generate_token, TerminalPassword};
/// use tinkoff_kassa::types::Payload;
///
/// let payload = Payload::new().with("A", "x");
/// let token = generate_token(&payload, &TerminalPassword::new("p"));
///
/// // sha256("xp")
/// assert_eq!(token, "9a3576ca4a048b010e835e65673b0db5bcd2e08bd95881d58117d28421c5a748");
/// ```
pub fn generate_token(payload: &Payload, password: &TerminalPassword) -> String {
    password.with_exposed(|secret| {
        let mut fields = signing_fields(payload, &TOKEN_EXCLUDED_FIELDS);
        fields.retain(|(key, _)| *key != PASSWORD);
        fields.push((PASSWORD, Cow::Borrowed(secret)));

        let concatenated = concatenate(fields);
        hex::encode(Sha256::digest(concatenated.as_bytes()))
    })
}

/// [`Authenticator`] attaching `Token`.
#[derive(Debug)]
pub struct TokenSigner {
    password: TerminalPassword,
}

impl TokenSigner {
    /// Creates a signer for the given terminal password.
    pub fn new(password: TerminalPassword) -> Self {
        Self { password }
    }
}

impl Authenticator for TokenSigner {
    fn name(&self) -> &str {
        "token"
    }

    fn authenticate(&self, payload: &mut Payload) -> Result<()> {
        let token = generate_token(payload, &self.password);
        payload.insert(TOKEN, token);
        Ok(())
    }
}
