//! Request authentication.
//!
//! Every request to the payment API carries signature artifacts computed from
//! its own fields. Two modes exist:
//!
//! - [`digest`]: the payload hash is signed with the terminal's RSA private key
//!   and sent as `DigestValue` + `SignatureValue` (payouts API).
//! - [`token`]: the payload is hashed together with the terminal password and
//!   sent as `Token` (safe deal API).
//!
//! Both modes share the same canonical form: the signed fields are sorted by
//! name and their values concatenated without separators.

pub mod digest;
pub mod token;

use crate::errors::Result;
use crate::types::{Payload, DIGEST_VALUE, SIGNATURE_VALUE, TOKEN, X509_SERIAL_NUMBER};
use serde_json::Value;
use std::borrow::Cow;
use zeroize::Zeroizing;

pub use digest::{
    generate_signature_and_digest, sign_with_key, verify_signature, DigestSigner, PrivateKey,
    SignatureArtifacts,
};
pub use token::{generate_token, TerminalPassword, TokenSigner};

/// Fields that are attached metadata and never take part in the digest.
pub const METADATA_FIELDS: [&str; 3] = [DIGEST_VALUE, SIGNATURE_VALUE, X509_SERIAL_NUMBER];

/// Fields excluded from the token: the metadata plus a previously attached token.
pub const TOKEN_EXCLUDED_FIELDS: [&str; 4] = [DIGEST_VALUE, SIGNATURE_VALUE, X509_SERIAL_NUMBER, TOKEN];

/// Trait for attaching signature artifacts to an outgoing payload.
///
/// Implementations must derive the artifacts from the payload alone and
/// recompute them on every call.
pub trait Authenticator: Send + Sync {
    /// Returns the name of this mode (e.g. "digest").
    fn name(&self) -> &str;

    /// Computes the artifacts for `payload` and merges them into it.
    fn authenticate(&self, payload: &mut Payload) -> Result<()>;
}

/// Renders a field value the way the receiving API does when it recomputes
/// the hash.
///
/// Strings are taken as-is, numbers use their JSON text (`5`, never `5.0`
/// for integers) and booleans become `true`/`false`. Nulls, nested objects
/// and arrays are not part of the signature and yield `None`.
///
/// # Examples
///
/// ```
/// use tinkoff_kassa::auth::stringify_value;
/// use serde_json::json;
///
/// assert_eq!(stringify_value(&json!("C1")).as_deref(), Some("C1"));
/// assert_eq!(stringify_value(&json!(5)).as_deref(), Some("5"));
/// assert_eq!(stringify_value(&json!(true)).as_deref(), Some("true"));
/// assert_eq!(stringify_value(&json!({"a": 1})), None);
/// ```
pub fn stringify_value(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Collects the signed fields of a payload, skipping `excluded` names and
/// values that do not take part in the signature.
pub(crate) fn signing_fields<'a>(
    payload: &'a Payload,
    excluded: &[&str],
) -> Vec<(&'a str, Cow<'a, str>)> {
    payload
        .iter()
        .filter(|(key, _)| !excluded.contains(key))
        .filter_map(|(key, value)| match stringify_value(value) {
            Some(rendered) => Some((key, rendered)),
            None => {
                tracing::debug!(field = key, "field left out of signature");
                None
            }
        })
        .collect()
}

/// Sorts fields by name (byte order) and concatenates their values.
pub(crate) fn concatenate(mut fields: Vec<(&str, Cow<'_, str>)>) -> Zeroizing<String> {
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    let capacity = fields.iter().map(|(_, v)| v.len()).sum();
    let mut out = Zeroizing::new(String::with_capacity(capacity));
    for (_, value) in &fields {
        out.push_str(value);
    }
    out
}

/// Canonical string hashed in digest mode: signed fields sorted by name,
/// values concatenated.
///
/// # Examples
///
/// ```
/// use tinkoff_kassa::auth::canonical_string;
/// use tinkoff_kassa::types::Payload;
///
/// let payload = Payload::new()
///     .with("TerminalKey", "T1")
///     .with("CustomerKey", "C1")
///     .with("X509SerialNumber", "ignored");
///
/// assert_eq!(canonical_string(&payload), "C1T1");
/// ```
pub fn canonical_string(payload: &Payload) -> String {
    let canonical = concatenate(signing_fields(payload, &METADATA_FIELDS));
    canonical.as_str().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_not_insertion_order() {
        let payload = Payload::new().with("B", "2").with("A", "1");
        assert_eq!(canonical_string(&payload), "12");
    }

    #[test]
    fn test_metadata_fields_excluded() {
        let plain = Payload::new().with("TerminalKey", "T1").with("CustomerKey", "C1");
        let decorated = plain
            .clone()
            .with("DigestValue", "d")
            .with("SignatureValue", "s")
            .with("X509SerialNumber", "x");

        assert_eq!(canonical_string(&plain), canonical_string(&decorated));
    }

    #[test]
    fn test_sort_is_byte_order() {
        // Uppercase sorts before lowercase in byte order.
        let payload = Payload::new().with("b", "3").with("B", "2").with("A", "1");
        assert_eq!(canonical_string(&payload), "123");
    }

    #[test]
    fn test_non_string_values() {
        let payload = Payload::new()
            .with("Amount", 1000)
            .with("OrderId", "o-1")
            .with("Flag", false)
            .with("DATA", json!({"Phone": "79001234567"}))
            .with("Items", json!([1, 2]))
            .with("Nothing", Value::Null);

        // Amount, Flag, OrderId
        assert_eq!(canonical_string(&payload), "1000falseo-1");
    }

    #[test]
    fn test_token_exclusions_cover_metadata() {
        for field in METADATA_FIELDS {
            assert!(TOKEN_EXCLUDED_FIELDS.contains(&field));
        }
        assert!(TOKEN_EXCLUDED_FIELDS.contains(&TOKEN));
    }
}
