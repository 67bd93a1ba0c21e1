//! Integration tests for the tinkoff-kassa-rs library.
//!
//! These tests run the clients against a local mock of the payment API that
//! recomputes and checks the signature artifacts the way the real API does.

use axum::{
    extract::Path,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use serde_json::{json, Value};
use std::io::Write;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use std::time::Duration;
use tinkoff_kassa::{
    auth::{generate_token, verify_signature, SignatureArtifacts, TerminalPassword},
    config::ClientConfig,
    transport::{HttpTransport, Transport},
    types::{ApiResponse, CheckType, Payload},
    KassaError, PayoutsClient, PrivateKey, SafeDealClient,
};

const KEY_PEM: &str = include_str!("fixtures/terminal_key.pem");
const PUBLIC_PEM: &str = include_str!("fixtures/terminal_key.pub.pem");
const PASSWORD: &str = "terminal-password";

fn text(payload: &Payload, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn reject(reason: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"Success": false, "ErrorCode": "204", "Message": reason})),
    )
}

async fn e2c(Path(endpoint): Path<String>, Json(payload): Json<Payload>) -> (StatusCode, Json<Value>) {
    match endpoint.as_str() {
        "Broken" => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"})));
        }
        "Slow" => tokio::time::sleep(Duration::from_secs(2)).await,
        _ => {}
    }

    if endpoint == "Check3dsVersion" {
        return (
            StatusCode::OK,
            Json(json!({"Success": true, "ErrorCode": "0", "Version": "2.1.0", "PaymentSystem": "visa"})),
        );
    }

    let public_key = RsaPublicKey::from_public_key_pem(PUBLIC_PEM).unwrap();
    let artifacts = SignatureArtifacts {
        digest_value: text(&payload, "DigestValue"),
        signature_value: text(&payload, "SignatureValue"),
    };
    if verify_signature(&payload, &artifacts, &public_key).is_err() {
        return reject("Invalid signature");
    }
    if text(&payload, "X509SerialNumber") != "4a0b" {
        return reject("Unknown certificate");
    }

    let body = match endpoint.as_str() {
        "GetCardList" => json!([
            {"CardId": "881900", "Pan": "518223******0036", "Status": "A", "RebillId": "", "CardType": 0, "ExpDate": "1122"},
            {"CardId": 881901, "Pan": "430000******0777", "Status": "I", "CardType": 1, "ExpDate": "0130"}
        ]),
        "AddCard" => json!({
            "Success": true,
            "ErrorCode": "0",
            "TerminalKey": text(&payload, "TerminalKey"),
            "CustomerKey": text(&payload, "CustomerKey"),
            "RequestKey": "13021e10-a3ed-4f14-bcd1-823b5ac37390",
            "PaymentURL": "https://securepay.tinkoff.ru/e2c/bind/82a31a62"
        }),
        "Init" => json!({
            "Success": true,
            "ErrorCode": "0",
            "TerminalKey": text(&payload, "TerminalKey"),
            "Status": "CHECKED",
            "PaymentId": 700001,
            "OrderId": text(&payload, "OrderId"),
            "Amount": payload.get("Amount").cloned().unwrap_or(Value::Null)
        }),
        "GetState" | "Payment" => json!({
            "Success": true,
            "ErrorCode": "0",
            "Status": "COMPLETED",
            "PaymentId": text(&payload, "PaymentId")
        }),
        "GetCustomer" if text(&payload, "CustomerKey") == "ghost" => json!({
            "Success": false,
            "ErrorCode": "7",
            "Message": "Customer not found"
        }),
        _ => json!({
            "Success": true,
            "ErrorCode": "0",
            "TerminalKey": text(&payload, "TerminalKey"),
            "CustomerKey": text(&payload, "CustomerKey"),
            "Email": payload.get("Email").cloned().unwrap_or(Value::Null)
        }),
    };
    (StatusCode::OK, Json(body))
}

async fn safe_deal(Path(endpoint): Path<String>, Json(payload): Json<Payload>) -> (StatusCode, Json<Value>) {
    let expected = generate_token(&payload, &TerminalPassword::new(PASSWORD));
    if text(&payload, "Token") != expected {
        return reject("Invalid token");
    }

    let status = match endpoint.as_str() {
        "Init" => "NEW",
        "Confirm" => "CONFIRMED",
        "Cancel" => "CANCELED",
        _ => "COMPLETED",
    };
    (
        StatusCode::OK,
        Json(json!({"Success": true, "ErrorCode": "0", "Status": status, "PaymentId": "42"})),
    )
}

async fn spawn_api() -> String {
    let router = Router::new()
        .route("/e2c/v2/:endpoint", post(e2c))
        .route("/v2/:endpoint", post(safe_deal));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn key_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(KEY_PEM.as_bytes()).unwrap();
    file
}

fn payouts_config(api: &str) -> ClientConfig {
    ClientConfig::new("T1")
        .with_base_url(format!("{}/e2c/v2", api))
        .with_x509_serial_number("4a0b")
}

fn payouts_client(api: &str) -> PayoutsClient {
    let key = PrivateKey::from_pem(KEY_PEM).unwrap();
    PayoutsClient::new(payouts_config(api).with_private_key(key)).unwrap()
}

#[tokio::test]
async fn test_customer_lifecycle() {
    let api = spawn_api().await;
    let client = payouts_client(&api);

    let added = client
        .add_customer("C1", Some("c1@example.com"), Some("+79001234567"))
        .await
        .unwrap()
        .ensure_success()
        .unwrap();
    assert_eq!(added.customer_key.as_deref(), Some("C1"));
    assert_eq!(added.email.as_deref(), Some("c1@example.com"));

    let fetched = client.get_customer("C1").await.unwrap();
    assert!(fetched.result.success);

    let removed = client.remove_customer("C1").await.unwrap();
    assert!(removed.result.success);
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let api = spawn_api().await;
    let client = payouts_client(&api);

    let response = client.get_customer("ghost").await.unwrap();
    assert!(!response.result.success);
    match response.ensure_success() {
        Err(KassaError::ApiError { code, message, .. }) => {
            assert_eq!(code, "7");
            assert_eq!(message, "Customer not found");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_cards() {
    let api = spawn_api().await;
    let client = payouts_client(&api);

    let binding = client.add_card("C1", Some(CheckType::ThreeDs)).await.unwrap();
    assert!(binding.payment_url.unwrap().contains("/bind/"));

    let cards = client.get_card_list("C1").await.unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].card_id, "881900");
    assert_eq!(cards[1].card_id, "881901");
    assert_eq!(cards[1].card_type, Some(1));

    let removed = client.remove_card("881900", "C1").await.unwrap();
    assert!(removed.result.success);
}

#[tokio::test]
async fn test_payout_flow() {
    let api = spawn_api().await;
    let client = payouts_client(&api);

    let mut data = serde_json::Map::new();
    data.insert("Phone".to_string(), json!("+79001234567"));

    let init = client
        .init_payout("order-1", "881900", 150_000, Some(data))
        .await
        .unwrap()
        .ensure_success()
        .unwrap();
    assert_eq!(init.status.as_deref(), Some("CHECKED"));
    assert_eq!(init.amount, Some(150_000));
    let payment_id = init.payment_id.unwrap();
    assert_eq!(payment_id, "700001");

    let confirmed = client.confirm_payout(&payment_id).await.unwrap();
    assert_eq!(confirmed.status.as_deref(), Some("COMPLETED"));

    let state = client.get_payout_status(&payment_id).await.unwrap();
    assert_eq!(state.payment_id.as_deref(), Some("700001"));
}

#[tokio::test]
async fn test_check_3ds_version() {
    let api = spawn_api().await;
    let client = payouts_client(&api);

    let response = client
        .check_3ds_version("700001", "encrypted-card-data", "caller-token")
        .await
        .unwrap();
    assert_eq!(response.version.as_deref(), Some("2.1.0"));
    assert_eq!(response.payment_system.as_deref(), Some("visa"));
}

#[tokio::test]
async fn test_key_file_is_read_per_request() {
    let api = spawn_api().await;
    let file = key_file();
    let client = PayoutsClient::new(payouts_config(&api).with_private_key_path(file.path())).unwrap();

    client.get_customer("C1").await.unwrap().ensure_success().unwrap();

    drop(file);
    let result = client.get_customer("C1").await;
    assert!(matches!(result, Err(KassaError::KeyLoadError(_))));
}

#[tokio::test]
async fn test_pkcs1_key_is_accepted_by_api() {
    let api = spawn_api().await;
    let key = PrivateKey::from_pem(include_str!("fixtures/terminal_key_pkcs1.pem")).unwrap();
    let client = PayoutsClient::new(payouts_config(&api).with_private_key(key)).unwrap();

    client.get_customer("C1").await.unwrap().ensure_success().unwrap();
}

#[tokio::test]
async fn test_http_status_error() {
    let api = spawn_api().await;
    let client = payouts_client(&api);

    let result = client
        .api()
        .execute("Broken", Payload::new().with("TerminalKey", "T1"))
        .await;
    match result {
        Err(KassaError::HttpStatusError { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_request_timeout() {
    let api = spawn_api().await;
    let key = PrivateKey::from_pem(KEY_PEM).unwrap();
    let client = PayoutsClient::new(
        payouts_config(&api)
            .with_private_key(key)
            .with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let result = client.api().execute("Slow", Payload::new()).await;
    assert!(matches!(result, Err(KassaError::HttpError(_))));
}

#[tokio::test]
async fn test_safe_deal_flow() {
    let api = spawn_api().await;
    let client = SafeDealClient::new(
        ClientConfig::new("T1")
            .with_base_url(format!("{}/v2/", api))
            .with_password(TerminalPassword::new(PASSWORD)),
    )
    .unwrap();

    let deal = client.init_deal("order-1", 100_000).await.unwrap().ensure_success().unwrap();
    assert_eq!(deal.status.as_deref(), Some("NEW"));
    let payment_id = deal.payment_id.unwrap();

    let paid = client.payment(&payment_id, "881900", 100_000).await.unwrap();
    assert_eq!(paid.status.as_deref(), Some("COMPLETED"));

    let confirmed = client.confirm_deal(&payment_id).await.unwrap();
    assert_eq!(confirmed.status.as_deref(), Some("CONFIRMED"));

    let canceled = client.cancel_deal(&payment_id).await.unwrap();
    assert_eq!(canceled.status.as_deref(), Some("CANCELED"));
}

#[tokio::test]
async fn test_safe_deal_wrong_password() {
    let api = spawn_api().await;
    let client = SafeDealClient::new(
        ClientConfig::new("T1")
            .with_base_url(format!("{}/v2/", api))
            .with_password(TerminalPassword::new("wrong")),
    )
    .unwrap();

    let result = client.init_deal("order-1", 100).await;
    assert!(matches!(result, Err(KassaError::HttpStatusError { status: 403, .. })));
}

/// Answers the first request with a 500 whose body is cut short.
async fn spawn_truncating_api() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= head_end + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\nshort")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_unreadable_error_body() {
    let api = spawn_truncating_api().await;
    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    let url = url::Url::parse(&format!("{}/e2c/v2/Init", api)).unwrap();

    let result = transport.post(&url, &Payload::new().with("TerminalKey", "T1")).await;
    match result {
        Err(KassaError::HttpStatusError { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.is_empty());
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
