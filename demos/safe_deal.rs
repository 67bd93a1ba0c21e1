//! Example safe deal.
//!
//! Opens a deal for an order and cancels it again.
//!
//! Run with:
//! ```bash
//! cargo run --example safe_deal
//! ```
//!
//! Environment variables (a `.env` file is honoured):
//! - TINKOFF_TERMINAL_KEY: Terminal identifier
//! - TINKOFF_TERMINAL_PASSWORD: Terminal password
//! - TINKOFF_API_URL: API base URL (default `https://securepay.tinkoff.ru/v2/`)

use tinkoff_kassa::{ApiResponse, ClientConfig, SafeDealClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let client = SafeDealClient::new(ClientConfig::from_env()?)?;
    println!("🤝 Safe deal example at {}", client.api().base_url());

    let order_id = format!("deal-{}", std::process::id());
    let deal = client.init_deal(&order_id, 100_000).await?.ensure_success()?;
    let payment_id = deal.payment_id.unwrap_or_default();
    println!("✅ Deal {} opened, status: {}", payment_id, deal.status.unwrap_or_default());

    let canceled = client.cancel_deal(&payment_id).await?.ensure_success()?;
    println!("↩️  Deal canceled, status: {}", canceled.status.unwrap_or_default());
    Ok(())
}
