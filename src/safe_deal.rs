//! Safe deal API: escrow-style payments authenticated with a password token.

use crate::auth::TokenSigner;
use crate::client::ApiClient;
use crate::config::{ClientConfig, DEFAULT_SAFE_DEAL_URL};
use crate::errors::{KassaError, Result};
use crate::types::{Payload, PaymentResponse, PASSWORD, TERMINAL_KEY};
use crate::utils::require;

/// Client for the safe deal API.
#[derive(Debug)]
pub struct SafeDealClient {
    terminal_key: String,
    api: ApiClient,
}

impl SafeDealClient {
    /// Creates a client. The configuration must carry a terminal password.
    pub fn new(mut config: ClientConfig) -> Result<Self> {
        require(TERMINAL_KEY, &config.terminal_key)?;
        let password = config
            .password
            .take()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| KassaError::ValidationError(PASSWORD.to_string()))?;

        let api = ApiClient::from_config(
            &config,
            DEFAULT_SAFE_DEAL_URL,
            Box::new(TokenSigner::new(password)),
        )?;

        Ok(Self {
            terminal_key: config.terminal_key,
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

    /// Opens a deal for an order (`Init`). `amount` is in kopecks.
    pub async fn init_deal(&self, order_id: &str, amount: u64) -> Result<PaymentResponse> {
        require("OrderId", order_id)?;
        let payload = self.payload().with("OrderId", order_id).with("Amount", amount);
        self.api.execute_as("Init", payload).await
    }

    /// Confirms a held deal (`Confirm`).
    pub async fn confirm_deal(&self, payment_id: &str) -> Result<PaymentResponse> {
        require("PaymentId", payment_id)?;
        let payload = self.payload().with("PaymentId", payment_id);
        self.api.execute_as("Confirm", payload).await
    }

    /// Cancels a deal (`Cancel`).
    pub async fn cancel_deal(&self, payment_id: &str) -> Result<PaymentResponse> {
        require("PaymentId", payment_id)?;
        let payload = self.payload().with("PaymentId", payment_id);
        self.api.execute_as("Cancel", payload).await
    }

    /// Pays the deal amount out to a card (`Payment`).
    pub async fn payment(&self, payment_id: &str, card_id: &str, amount: u64) -> Result<PaymentResponse> {
        require("PaymentId", payment_id)?;
        require("CardId", card_id)?;
        let payload = self
            .payload()
            .with("PaymentId", payment_id)
            .with("CardId", card_id)
            .with("Amount", amount);
        self.api.execute_as("Payment", payload).await
    }
}
