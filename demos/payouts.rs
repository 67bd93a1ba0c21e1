//! Example payout to a bound card.
//!
//! Registers a customer, lists their cards and pays out to the first active
//! one.
//!
//! Run with:
//! ```bash
//! cargo run --example payouts
//! ```
//!
//! Environment variables (a `.env` file is honoured):
//! - TINKOFF_TERMINAL_KEY: Terminal identifier
//! - TINKOFF_X509_SERIAL_NUMBER: Serial number of the terminal certificate
//! - TINKOFF_PRIVATE_KEY_PATH: PEM private key (default `private.key`)
//! - CUSTOMER_KEY: Customer to pay out to
//! - AMOUNT: Payout amount in kopecks

use tinkoff_kassa::{ApiResponse, ClientConfig, PayoutsClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env()?;
    let customer_key = std::env::var("CUSTOMER_KEY").unwrap_or_else(|_| "customer-1".to_string());
    let amount: u64 = std::env::var("AMOUNT")
        .ok()
        .and_then(|a| a.parse().ok())
        .unwrap_or(10_000);

    println!("💳 Payouts example");
    println!("   Terminal: {}", config.terminal_key);
    println!("   Customer: {}", customer_key);
    println!();

    let client = PayoutsClient::new(config)?;

    let customer = client.add_customer(&customer_key, None, None).await?;
    if let Err(e) = customer.ensure_success() {
        // Already registered customers are reported as an API error.
        println!("ℹ️  AddCustomer: {}", e);
    }

    let cards = client.get_card_list(&customer_key).await?;
    let Some(card) = cards.iter().find(|c| c.status.as_deref() == Some("A")) else {
        let binding = client.add_card(&customer_key, None).await?.ensure_success()?;
        println!("🔗 No active card, bind one at: {}", binding.payment_url.unwrap_or_default());
        return Ok(());
    };

    let order_id = format!("payout-{}", std::process::id());
    println!("📡 Paying out {} kopecks to card {}...", amount, card.card_id);

    let payout = client
        .init_payout(&order_id, &card.card_id, amount, None)
        .await?
        .ensure_success()?;
    let payment_id = payout.payment_id.unwrap_or_default();

    client.confirm_payout(&payment_id).await?.ensure_success()?;
    let state = client.get_payout_status(&payment_id).await?;

    println!("✅ Payout {} status: {}", payment_id, state.status.unwrap_or_default());
    Ok(())
}
