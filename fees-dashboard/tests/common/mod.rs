//! Shared harness for dashboard integration tests.
//!
//! Collaborator HTTP services (fee store, receipt generator) are stubbed
//! with wiremock; the payment gateway is a scripted in-process port so
//! tests can drive every checkout and verification branch.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use fees_dashboard::dashboard::FeeDashboard;
use fees_dashboard::error::FeeError;
use fees_dashboard::models::{
    CheckoutOutcome, PaymentSession, StudentContext, VerificationStatus,
};
use fees_dashboard::dtos::CreatePaymentRequest;
use fees_dashboard::services::{FeeStoreClient, MemoryResumeStore, PaymentGatewayPort, ReceiptClient};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const STUDENT_ID: &str = "student-1";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,fees_dashboard=debug")
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

/// Build one fee record JSON object as the fee store would return it.
/// `due_in_days` is relative to today so the 30-day window behaves the
/// same whenever the tests run.
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

/// Mount a `GET /fees` stub. With `Some(n)` the stub expires after `n`
/// matches so a later mount can take over (fee list changing mid-test).
pub async fn mount_fees(server: &MockServer, fees: &[Value], up_to: Option<u64>) {
    let mut mock = Mock::given(method("GET"))
        .and(path("/fees"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "fees": fees })),
        );
    if let Some(n) = up_to {
        mock = mock.up_to_n_times(n);
    }
    mock.mount(server).await;
}

pub async fn mount_receipt(server: &MockServer, body: &[u8]) {
    Mock::given(method("POST"))
        .and(path("/fees/receipt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

#[derive(Default)]
struct GatewayScript {
    prices: Mutex<HashMap<String, f64>>,
    checkout_outcomes: Mutex<VecDeque<CheckoutOutcome>>,
    verify_results: Mutex<VecDeque<Result<VerificationStatus, FeeError>>>,
    fail_create: Mutex<Option<String>>,
    create_calls: AtomicUsize,
    checkout_calls: AtomicUsize,
    verify_calls: AtomicUsize,
    orders: AtomicUsize,
    last_request: Mutex<Option<(Vec<String>, f64)>>,
}

/// In-process gateway port with scriptable behavior per test.
///
/// Defaults: checkout completes in-process, verification reports PAID.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    inner: Arc<GatewayScript>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Teach the fake gateway the server-side price of each fee, so the
    /// session amount is an authoritative sum like the real service's.
    pub fn set_price(&self, fee_id: &str, amount: f64) {
        self.inner
            .prices
            .lock()
            .unwrap()
            .insert(fee_id.to_string(), amount);
    }

    pub fn script_checkout(&self, outcome: CheckoutOutcome) {
        self.inner
            .checkout_outcomes
            .lock()
            .unwrap()
            .push_back(outcome);
    }

    pub fn script_verify(&self, result: Result<VerificationStatus, FeeError>) {
        self.inner.verify_results.lock().unwrap().push_back(result);
    }

    pub fn fail_next_create(&self, message: &str) {
        *self.inner.fail_create.lock().unwrap() = Some(message.to_string());
    }

    pub fn create_calls(&self) -> usize {
        self.inner.create_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.inner.verify_calls.load(Ordering::SeqCst)
    }

    /// Fee ids and amount of the most recent minted session.
    pub fn last_session(&self) -> Option<(Vec<String>, f64)> {
        self.inner.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGatewayPort for ScriptedGateway {
    async fn create_session(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentSession, FeeError> {
        if let Some(message) = self.inner.fail_create.lock().unwrap().take() {
            return Err(FeeError::Gateway(message));
        }

        assert!(
            !request.fee_ids.is_empty(),
            "controller must reject empty selections before reaching the gateway"
        );

        self.inner.create_calls.fetch_add(1, Ordering::SeqCst);
        let n = self.inner.orders.fetch_add(1, Ordering::SeqCst) + 1;

        let prices = self.inner.prices.lock().unwrap();
        let amount: f64 = request.fee_ids.iter().filter_map(|id| prices.get(id)).sum();

        *self.inner.last_request.lock().unwrap() = Some((request.fee_ids.clone(), amount));

        Ok(PaymentSession {
            order_id: format!("order-{}", n),
            session_token: format!("sess-{}", n),
            fee_ids: request.fee_ids.clone(),
            amount,
        })
    }

    async fn open_checkout(&self, _session: &PaymentSession) -> Result<CheckoutOutcome, FeeError> {
        self.inner.checkout_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.inner.checkout_outcomes.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or(CheckoutOutcome::Completed))
    }

    async fn verify(&self, _order_id: &str) -> Result<VerificationStatus, FeeError> {
        self.inner.verify_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.inner.verify_results.lock().unwrap().pop_front();
        scripted.unwrap_or(Ok(VerificationStatus::Paid))
    }
}

pub struct TestHarness {
    pub server: MockServer,
    pub gateway: ScriptedGateway,
    pub dashboard: FeeDashboard<ScriptedGateway, MemoryResumeStore>,
}

impl TestHarness {
    pub async fn spawn() -> Self {
        init_tracing();
        let server = MockServer::start().await;
        let gateway = ScriptedGateway::new();

        let dashboard = FeeDashboard::new(
            student(),
            FeeStoreClient::new(server.uri()),
            ReceiptClient::new(server.uri()),
            gateway.clone(),
            MemoryResumeStore::new(),
        );

        Self {
            server,
            gateway,
            dashboard,
        }
    }
}
