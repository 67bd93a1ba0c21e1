//! Core type definitions for the payment API.
//!
//! This module contains the request [`Payload`] and the typed responses
//! returned by the payouts (E2C) and safe deal endpoints.

use crate::errors::{KassaError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Field holding the Base64 SHA-256 digest of a signed payload.
pub const DIGEST_VALUE: &str = "DigestValue";

/// Field holding the Base64 RSA signature of a signed payload.
pub const SIGNATURE_VALUE: &str = "SignatureValue";

/// Field holding the serial number of the certificate matching the signing key.
pub const X509_SERIAL_NUMBER: &str = "X509SerialNumber";

/// Field holding the hex SHA-256 token of a token-authenticated payload.
pub const TOKEN: &str = "Token";

/// Field under which the terminal password takes part in token computation.
pub const PASSWORD: &str = "Password";

/// Field identifying the merchant terminal.
pub const TERMINAL_KEY: &str = "TerminalKey";

/// Request fields sent to the payment API.
///
/// Fields keep insertion order when serialized. Values are usually strings or
/// integers; nested mappings (such as `DATA`) are sent but never signed.
///
/// # Examples
///
/// ```
/// use tinkoff_kassa::types::Payload;
///
/// let payload = Payload::new()
///     .with("TerminalKey", "T1")
///     .with("Amount", 1000);
///
/// assert_eq!(payload.len(), 2);
/// assert_eq!(payload.keys().next(), Some("TerminalKey"));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Inserts a field, returning the previous value if the field existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Inserts a field only when a value is provided.
    pub fn insert_opt<V: Into<Value>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Builder form of [`Payload::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value of a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if the field is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Outcome fields shared by every API response.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseStatus {
    /// Whether the API accepted the request
    #[serde(default)]
    pub success: bool,

    /// Error code, `"0"` on success
    #[serde(default, deserialize_with = "string_or_number")]
    pub error_code: String,

    /// Short error description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Detailed error description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ResponseStatus {
    /// Converts `Success: false` into [`KassaError::ApiError`].
    pub fn ensure_success(&self) -> Result<()> {
        if self.success {
            return Ok(());
        }
        Err(KassaError::ApiError {
            code: self.error_code.clone(),
            message: self
                .message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string()),
            details: self.details.clone(),
        })
    }
}

/// Common accessors for typed API responses.
pub trait ApiResponse: Sized {
    /// The shared outcome fields.
    fn result(&self) -> &ResponseStatus;

    /// Returns the response if `Success` is true, the API error otherwise.
    fn ensure_success(self) -> Result<Self> {
        self.result().ensure_success()?;
        Ok(self)
    }
}

macro_rules! impl_api_response {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ApiResponse for $ty {
                fn result(&self) -> &ResponseStatus {
                    &self.result
                }
            }
        )*
    };
}

/// Response of `AddCustomer`, `GetCustomer` and `RemoveCustomer`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerResponse {
    /// Terminal the customer is bound to
    pub terminal_key: Option<String>,

    /// Customer identifier in the merchant's system
    pub customer_key: Option<String>,

    /// Customer e-mail, returned by `GetCustomer`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Customer phone, returned by `GetCustomer`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Outcome fields
    #[serde(flatten)]
    pub result: ResponseStatus,

    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `AddCard`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AddCardResponse {
    /// Terminal identifier
    pub terminal_key: Option<String>,

    /// Customer identifier
    pub customer_key: Option<String>,

    /// Identifier of the card binding request
    pub request_key: Option<String>,

    /// Page where the customer enters card details
    #[serde(rename = "PaymentURL")]
    pub payment_url: Option<String>,

    /// Outcome fields
    #[serde(flatten)]
    pub result: ResponseStatus,

    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `RemoveCard`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RemoveCardResponse {
    /// Terminal identifier
    pub terminal_key: Option<String>,

    /// Customer identifier
    pub customer_key: Option<String>,

    /// Removed card
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub card_id: Option<String>,

    /// Card status after removal (`D` for deleted)
    pub status: Option<String>,

    /// Card type: 0 debit, 1 credit, 2 debit and credit
    pub card_type: Option<u8>,

    /// Outcome fields
    #[serde(flatten)]
    pub result: ResponseStatus,

    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A card bound to a customer, as listed by `GetCardList`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Card {
    /// Card identifier
    #[serde(deserialize_with = "string_or_number")]
    pub card_id: String,

    /// Masked card number
    pub pan: Option<String>,

    /// `A` active, `I` inactive, `E` expired, `D` deleted
    pub status: Option<String>,

    /// Recurring payment identifier
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub rebill_id: Option<String>,

    /// Card type: 0 debit, 1 credit, 2 debit and credit
    pub card_type: Option<u8>,

    /// Expiry date as `MMYY`
    pub exp_date: Option<String>,
}

/// Response of `Check3dsVersion`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Check3dsVersionResponse {
    /// Supported 3DS protocol version
    pub version: Option<String>,

    /// 3DS server transaction identifier
    #[serde(rename = "TdsServerTransID")]
    pub tds_server_trans_id: Option<String>,

    /// URL for the 3DS method step
    #[serde(rename = "ThreeDSMethodURL")]
    pub three_ds_method_url: Option<String>,

    /// Card payment system
    pub payment_system: Option<String>,

    /// Outcome fields
    #[serde(flatten)]
    pub result: ResponseStatus,

    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of payment-lifecycle operations: `Init`, `Payment`, `GetState`,
/// `Confirm` and `Cancel`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentResponse {
    /// Terminal identifier
    pub terminal_key: Option<String>,

    /// Amount in kopecks
    pub amount: Option<u64>,

    /// Order identifier in the merchant's system
    pub order_id: Option<String>,

    /// Operation identifier in the payment system
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub payment_id: Option<String>,

    /// Operation status, e.g. `NEW`, `CHECKED`, `COMPLETED`, `REJECTED`
    pub status: Option<String>,

    /// Outcome fields
    #[serde(flatten)]
    pub result: ResponseStatus,

    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_api_response!(
    CustomerResponse,
    AddCardResponse,
    RemoveCardResponse,
    Check3dsVersionResponse,
    PaymentResponse,
);

/// Card verification mode used by `AddCard`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckType {
    /// Card is saved without verification
    #[default]
    #[serde(rename = "NO")]
    No,
    /// Card is verified by holding and releasing a small amount
    #[serde(rename = "HOLD")]
    Hold,
    /// Card is verified with 3-D Secure
    #[serde(rename = "3DS")]
    ThreeDs,
    /// Card is verified with 3-D Secure and a hold
    #[serde(rename = "3DSHOLD")]
    ThreeDsHold,
}

impl CheckType {
    /// Wire value of the check type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::No => "NO",
            CheckType::Hold => "HOLD",
            CheckType::ThreeDs => "3DS",
            CheckType::ThreeDsHold => "3DSHOLD",
        }
    }
}

impl std::fmt::Display for CheckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Identifiers come back as strings or numbers depending on the endpoint.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
