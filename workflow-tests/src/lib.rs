//! End-to-end workflow test infrastructure.
//!
//! Runs the fee dashboard controller against stubbed collaborator HTTP
//! services (fee store, payment session API, verification endpoint,
//! receipt generator) with the real hosted-gateway client, so the tests
//! cover the full wire path including the redirect-resumption flow.

use chrono::{Duration, Utc};
use fees_dashboard::config::GatewayConfig;
use fees_dashboard::dashboard::FeeDashboard;
use fees_dashboard::models::StudentContext;
use fees_dashboard::services::{
    FeeStoreClient, HostedGateway, MemoryResumeStore, ReceiptClient, RetryConfig,
};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Once;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const STUDENT_ID: &str = "student-1";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,fees_dashboard=debug,workflow_tests=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn student() -> StudentContext {
    StudentContext {
        id: STUDENT_ID.to_string(),
        name: "Asha Rao".to_string(),
        email: "asha@example.com".to_string(),
        class: "10".to_string(),
        section: "A".to_string(),
    }
}

pub struct WorkflowHarness {
    pub server: MockServer,
    pub dashboard: FeeDashboard<HostedGateway, MemoryResumeStore>,
}

impl WorkflowHarness {
    pub async fn spawn() -> Self {
        init_tracing();
        let server = MockServer::start().await;

        let gateway = HostedGateway::new(GatewayConfig {
            key_id: "gw_test_123".to_string(),
            key_secret: Secret::new("test_secret".to_string()),
            api_base_url: server.uri(),
            checkout_base_url: "https://checkout.example.com".to_string(),
        })
        .with_retry(RetryConfig::quick());

        let dashboard = FeeDashboard::new(
            student(),
            FeeStoreClient::new(server.uri()),
            ReceiptClient::new(server.uri()),
            gateway,
            MemoryResumeStore::new(),
        );

        Self { server, dashboard }
    }
}

/// One fee record as the fee store serves it, due relative to today.
pub fn fee_json(id: &str, status: &str, amount: f64, due_in_days: i64) -> Value {
    let due = Utc::now().date_naive() + Duration::days(due_in_days);
    let mut fee = json!({
        "id": id,
        "studentId": STUDENT_ID,
        "feeType": "tuition",
        "amount": amount,
        "dueDate": due.format("%Y-%m-%d").to_string(),
        "status": status,
        "createdAt": "2026-01-01T00:00:00Z",
    });
    if status == "paid" {
        fee["paymentDate"] = json!(due.format("%Y-%m-%d").to_string());
        fee["paymentMethod"] = json!("online");
    }
    fee
}

/// Mount a `GET /fees` stub; with `Some(n)` the stub expires after `n`
/// matches so a later mount can represent the store after payment.
pub async fn mount_fees(server: &MockServer, fees: &[Value], up_to: Option<u64>) {
    let mut mock = Mock::given(method("GET")).and(path("/fees")).respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "success": true, "fees": fees })),
    );
    if let Some(n) = up_to {
        mock = mock.up_to_n_times(n);
    }
    mock.mount(server).await;
}

pub async fn mount_session(server: &MockServer, order_id: &str, token: &str, amount: f64) {
    Mock::given(method("POST"))
        .and(path("/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "orderId": order_id,
            "paymentSessionId": token,
            "amount": amount,
        })))
        .mount(server)
        .await;
}

pub async fn mount_verify(server: &MockServer, order_id: &str, status: &str) {
    Mock::given(method("GET"))
        .and(path("/payments"))
        .and(query_param("order_id", order_id))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "status": status })),
        )
        .mount(server)
        .await;
}

pub async fn mount_receipt(server: &MockServer, body: &[u8]) {
    Mock::given(method("POST"))
        .and(path("/fees/receipt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}
