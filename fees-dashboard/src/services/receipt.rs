//! Receipt Generator client.
//!
//! Receipts are a pure read over already-paid records: generation is
//! idempotent for the same inputs and safe to retry indefinitely. A failed
//! download never rolls back the payment it evidences.

use crate::dtos::{ApiErrorBody, ReceiptRequest};
use crate::error::FeeError;
use anyhow::anyhow;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use validator::Validate;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ReceiptClient {
    client: Client,
    base_url: String,
}

impl ReceiptClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Generate a receipt document for a set of already-paid fees.
    pub async fn request_receipt(&self, request: &ReceiptRequest) -> Result<Vec<u8>, FeeError> {
        request
            .validate()
            .map_err(|e| FeeError::Validation(e.to_string()))?;

        let url = format!("{}/fees/receipt", self.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(|e| FeeError::ReceiptFailed(e.into()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = ApiErrorBody::describe(&body);
            tracing::error!(status = %status, message = %message, "receipt generation failed");
            return Err(FeeError::ReceiptFailed(anyhow!(
                "receipt endpoint returned {}: {}",
                status,
                message
            )));
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| FeeError::ReceiptFailed(e.into()))?;

        if content.is_empty() {
            return Err(FeeError::ReceiptFailed(anyhow!(
                "receipt endpoint returned an empty document"
            )));
        }

        tracing::info!(
            fee_count = request.fee_ids.len(),
            bytes = content.len(),
            "receipt generated"
        );

        Ok(content.to_vec())
    }
}

/// Name for a downloaded receipt artifact.
///
/// Embeds the student name and the download date so repeated downloads do
/// not collide; same-day re-downloads overwrite, which is accepted.
pub fn receipt_file_name(student_name: &str, date: NaiveDate) -> String {
    let safe_name: String = student_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("Fee_Receipt_{}_{}.pdf", safe_name, date.format("%Y-%m-%d"))
}
