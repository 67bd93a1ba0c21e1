//! Payouts (E2C) API: customers, cards and card payouts.
//!
//! Every request carries `TerminalKey` and `X509SerialNumber` and is signed
//! with the terminal's RSA key (`DigestValue` + `SignatureValue`).

use crate::auth::DigestSigner;
use crate::client::ApiClient;
use crate::config::{ClientConfig, DEFAULT_PAYOUTS_URL};
use crate::errors::Result;
use crate::types::{
    AddCardResponse, Card, CheckType, Check3dsVersionResponse, CustomerResponse, Payload,
    PaymentResponse, RemoveCardResponse, ResponseStatus, TERMINAL_KEY, TOKEN, X509_SERIAL_NUMBER,
};
use crate::utils::require;
use serde_json::{Map, Value};

/// Client for the payouts API.
///
/// # Examples
///
/// ```no_run
/// use tinkoff_kassa::config::ClientConfig;
/// use tinkoff_kassa::payouts::PayoutsClient;
///
/// # async fn example() -> tinkoff_kassa::Result<()> {
/// let client = PayoutsClient::new(
///     ClientConfig::new("TinkoffBankTest")
///         .with_x509_serial_number("4a0b1f")
///         .with_private_key_path("private.key"),
/// )?;
///
/// let customer = client.add_customer("customer-1", Some("a@example.com"), None).await?;
/// println!("{:?}", customer.result);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PayoutsClient {
    terminal_key: String,
    x509_serial_number: String,
    api: ApiClient,
}

impl PayoutsClient {
    /// Creates a client.
    ///
    /// Fails with a validation error when the terminal key or the X509 serial
    /// number is empty.
    pub fn new(mut config: ClientConfig) -> Result<Self> {
        require(TERMINAL_KEY, &config.terminal_key)?;
        let x509_serial_number = config.x509_serial_number.clone().unwrap_or_default();
        require(X509_SERIAL_NUMBER, &x509_serial_number)?;

        let signer = match config.private_key.take() {
            Some(key) => DigestSigner::from_key(key),
            None => DigestSigner::from_path(config.private_key_path.clone()),
        };
        let api = ApiClient::from_config(&config, DEFAULT_PAYOUTS_URL, Box::new(signer))?;

        Ok(Self {
            terminal_key: config.terminal_key,
            x509_serial_number,
            api,
        })
    }

    /// Underlying signed client.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn payload(&self) -> Payload {
        Payload::new().with(TERMINAL_KEY, self.terminal_key.as_str())
    }

    fn customer_payload(&self, customer_key: &str) -> Result<Payload> {
        require("CustomerKey", customer_key)?;
        Ok(self.payload().with("CustomerKey", customer_key))
    }

    async fn call(&self, endpoint: &str, payload: Payload) -> Result<Value> {
        let payload = payload.with(X509_SERIAL_NUMBER, self.x509_serial_number.as_str());
        self.api.execute(endpoint, payload).await
    }

    async fn call_as<T: serde::de::DeserializeOwned>(&self, endpoint: &str, payload: Payload) -> Result<T> {
        Ok(serde_json::from_value(self.call(endpoint, payload).await?)?)
    }

    /// Registers a customer with the terminal (`AddCustomer`).
    pub async fn add_customer(
        &self,
        customer_key: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<CustomerResponse> {
        let mut payload = self.customer_payload(customer_key)?;
        payload.insert_opt("Email", email);
        payload.insert_opt("Phone", phone);
        self.call_as("AddCustomer", payload).await
    }

    /// Returns customer data (`GetCustomer`).
    pub async fn get_customer(&self, customer_key: &str) -> Result<CustomerResponse> {
        let payload = self.customer_payload(customer_key)?;
        self.call_as("GetCustomer", payload).await
    }

    /// Removes a customer (`RemoveCustomer`).
    pub async fn remove_customer(&self, customer_key: &str) -> Result<CustomerResponse> {
        let payload = self.customer_payload(customer_key)?;
        self.call_as("RemoveCustomer", payload).await
    }

    /// Lists the cards bound to a customer (`GetCardList`).
    ///
    /// The endpoint answers with a bare array on success and with an error
    /// object otherwise; the latter becomes [`KassaError::ApiError`](crate::KassaError::ApiError).
    pub async fn get_card_list(&self, customer_key: &str) -> Result<Vec<Card>> {
        let payload = self.customer_payload(customer_key)?;
        match self.call("GetCardList", payload).await? {
            cards @ Value::Array(_) => Ok(serde_json::from_value(cards)?),
            other => {
                let status: ResponseStatus = serde_json::from_value(other)?;
                status.ensure_success()?;
                Ok(Vec::new())
            }
        }
    }

    /// Starts binding a card to a customer (`AddCard`).
    ///
    /// Without a check type the API verifies nothing (`NO`).
    pub async fn add_card(
        &self,
        customer_key: &str,
        check_type: Option<CheckType>,
    ) -> Result<AddCardResponse> {
        let mut payload = self.customer_payload(customer_key)?;
        payload.insert_opt("CheckType", check_type.map(|c| c.as_str()));
        self.call_as("AddCard", payload).await
    }

    /// Removes a bound card (`RemoveCard`).
    pub async fn remove_card(&self, card_id: &str, customer_key: &str) -> Result<RemoveCardResponse> {
        require("CardId", card_id)?;
        let payload = self.customer_payload(customer_key)?.with("CardId", card_id);
        self.call_as("RemoveCard", payload).await
    }

    /// Checks the 3-D Secure version supported by a card (`Check3dsVersion`).
    ///
    /// The request is authenticated by the caller-supplied `token` and is sent
    /// without a digest or signature.
    pub async fn check_3ds_version(
        &self,
        payment_id: &str,
        card_data: &str,
        token: &str,
    ) -> Result<Check3dsVersionResponse> {
        require("PaymentId", payment_id)?;
        require("CardData", card_data)?;
        require(TOKEN, token)?;

        let payload = self
            .payload()
            .with("PaymentId", payment_id)
            .with("CardData", card_data)
            .with(TOKEN, token)
            .with(X509_SERIAL_NUMBER, self.x509_serial_number.as_str());
        let body = self.api.execute_unsigned("Check3dsVersion", payload).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Creates a payout to a bound card (`Init`).
    ///
    /// `amount` is in kopecks. `data` is sent as the `DATA` object and is not
    /// part of the signature.
    pub async fn init_payout(
        &self,
        order_id: &str,
        card_id: &str,
        amount: u64,
        data: Option<Map<String, Value>>,
    ) -> Result<PaymentResponse> {
        require("OrderId", order_id)?;
        require("CardId", card_id)?;

        let mut payload = self
            .payload()
            .with("OrderId", order_id)
            .with("CardId", card_id)
            .with("Amount", amount);
        if let Some(data) = data.filter(|d| !d.is_empty()) {
            payload.insert("DATA", Value::Object(data));
        }
        self.call_as("Init", payload).await
    }

    /// Executes a created payout (`Payment`).
    pub async fn confirm_payout(&self, payment_id: &str) -> Result<PaymentResponse> {
        require("PaymentId", payment_id)?;
        let payload = self.payload().with("PaymentId", payment_id);
        self.call_as("Payment", payload).await
    }

    /// Returns the current status of a payout (`GetState`).
    pub async fn get_payout_status(&self, payment_id: &str) -> Result<PaymentResponse> {
        require("PaymentId", payment_id)?;
        let payload = self.payload().with("PaymentId", payment_id);
        self.call_as("GetState", payload).await
    }
}
