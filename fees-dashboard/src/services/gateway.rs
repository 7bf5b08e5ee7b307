//! Payment gateway port and its hosted-checkout HTTP implementation.
//!
//! The concrete gateway sits behind [`PaymentGatewayPort`] so it can be
//! swapped or mocked in tests instead of being invoked as an untyped
//! global. The hosted implementation talks to the payment session API for
//! initiation and verification; the checkout step itself is a full-page
//! redirect, so it always resolves as redirect-pending and the outcome is
//! re-established later via the resumption path.

use crate::config::GatewayConfig;
use crate::dtos::{ApiErrorBody, CreatePaymentRequest, CreatePaymentResponse, VerifyPaymentResponse};
use crate::error::FeeError;
use crate::models::{CheckoutOutcome, PaymentSession, VerificationStatus};
use crate::services::retry::{retry_call, RetryConfig};
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use std::time::Duration;
use validator::Validate;

/// Per-attempt wall-clock limit on gateway calls. A stalled connection
/// must resolve as a failed attempt so the retry loop can take over.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait PaymentGatewayPort: Send + Sync {
    /// Mint a checkout session for a non-empty set of pending fees.
    ///
    /// Each retry mints a fresh order; the gateway manages idempotency
    /// server-side, so no client-side dedup is needed.
    async fn create_session(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentSession, FeeError>;

    /// Drive the checkout UI for one session and report its terminal
    /// outcome. Never trusted as proof of payment; see [`Self::verify`].
    async fn open_checkout(&self, session: &PaymentSession) -> Result<CheckoutOutcome, FeeError>;

    /// Authoritative payment status by order id, independent of whatever
    /// the checkout UI reported client-side.
    async fn verify(&self, order_id: &str) -> Result<VerificationStatus, FeeError>;
}

/// Gateway client for a hosted (redirect-based) checkout flow.
#[derive(Clone)]
pub struct HostedGateway {
    client: Client,
    config: GatewayConfig,
    retry: RetryConfig,
    timeout: Duration,
}

impl HostedGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            retry: RetryConfig::default(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if gateway credentials are set.
    pub fn is_configured(&self) -> bool {
        !self.config.key_id.is_empty() && !self.config.key_secret.expose_secret().is_empty()
    }

    async fn verify_once(&self, order_id: &str) -> Result<VerificationStatus, FeeError> {
        let url = format!("{}/payments", self.config.api_base_url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .query(&[("order_id", order_id)])
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| FeeError::VerificationUncertain(e.into()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeeError::VerificationUncertain(e.into()))?;

        tracing::debug!(status = %status, order_id = %order_id, "verification response");

        // A 4xx is a definitive rejection of the lookup itself, never a
        // transient condition, so it must not be retried.
        if status.is_client_error() {
            return Err(FeeError::MalformedResponse(format!(
                "verification rejected for order {}: {} {}",
                order_id,
                status,
                ApiErrorBody::describe(&body)
            )));
        }

        if !status.is_success() {
            return Err(FeeError::VerificationUncertain(anyhow!(
                "verification endpoint returned {}: {}",
                status,
                ApiErrorBody::describe(&body)
            )));
        }

        let parsed: VerifyPaymentResponse = serde_json::from_str(&body)
            .map_err(|e| FeeError::MalformedResponse(format!("verification: {}", e)))?;

        if parsed.status == "PAID" {
            tracing::info!(order_id = %order_id, "payment verified as paid");
            Ok(VerificationStatus::Paid)
        } else {
            tracing::warn!(
                order_id = %order_id,
                status = %parsed.status,
                "payment verification returned non-paid status"
            );
            Ok(VerificationStatus::NotPaid(parsed.status))
        }
    }
}

#[async_trait]
impl PaymentGatewayPort for HostedGateway {
    async fn create_session(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentSession, FeeError> {
        // Reject bad input before any network call is made.
        request.validate()?;

        if !self.is_configured() {
            return Err(FeeError::Gateway(
                "gateway credentials not configured".to_string(),
            ));
        }

        let url = format!("{}/payments", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .json(request)
            .send()
            .await
            .map_err(|e| FeeError::Gateway(format!("session creation failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeeError::Gateway(format!("session creation failed: {}", e)))?;

        tracing::debug!(status = %status, "create session response");

        if !status.is_success() {
            let message = ApiErrorBody::describe(&body);
            tracing::error!(status = %status, message = %message, "session creation rejected");
            return Err(FeeError::Gateway(message));
        }

        let parsed: CreatePaymentResponse = serde_json::from_str(&body)
            .map_err(|e| FeeError::MalformedResponse(format!("payment session: {}", e)))?;

        if !parsed.success {
            return Err(FeeError::Gateway(ApiErrorBody::describe(&body)));
        }

        tracing::info!(
            order_id = %parsed.order_id,
            amount = parsed.amount,
            fee_count = request.fee_ids.len(),
            "payment session created"
        );

        Ok(PaymentSession {
            order_id: parsed.order_id,
            session_token: parsed.payment_session_id,
            fee_ids: request.fee_ids.clone(),
            // Server-side sum is authoritative; the client only displays it.
            amount: parsed.amount,
        })
    }

    async fn open_checkout(&self, session: &PaymentSession) -> Result<CheckoutOutcome, FeeError> {
        let checkout_url = format!(
            "{}/checkout?session={}",
            self.config.checkout_base_url, session.session_token
        );

        tracing::info!(
            order_id = %session.order_id,
            checkout_url = %checkout_url,
            "handing off to hosted checkout"
        );

        // A hosted checkout leaves the process entirely; the outcome is
        // re-established on return via the resumption marker.
        Ok(CheckoutOutcome::RedirectPending { checkout_url })
    }

    async fn verify(&self, order_id: &str) -> Result<VerificationStatus, FeeError> {
        // Only transport-level uncertainty is retried; a definitive
        // non-PAID answer is terminal.
        retry_call(
            &self.retry,
            "verify_payment",
            |e| matches!(e, FeeError::VerificationUncertain(_)),
            || self.verify_once(order_id),
        )
        .await
    }
}
