//! Fee Record Store client.
//!
//! Read-only view over a student's fee line-items. Responses are parsed
//! against a strict schema; anything that does not fit is a
//! [`FeeError::MalformedResponse`] rather than a locally fabricated record.

use crate::dtos::{ApiErrorBody, FeesResponse};
use crate::error::FeeError;
use crate::models::FeeRecord;
use anyhow::anyhow;
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct FeeStoreClient {
    client: Client,
    base_url: String,
}

impl FeeStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch all fee records for one student.
    ///
    /// The caller derives summaries and date-window subsets; this client
    /// only guarantees a well-formed record list.
    pub async fn load_fees(&self, student_id: &str) -> Result<Vec<FeeRecord>, FeeError> {
        let url = format!("{}/fees", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("studentId", student_id)])
            .send()
            .await
            .map_err(|e| FeeError::LoadFailed(e.into()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeeError::LoadFailed(e.into()))?;

        tracing::debug!(status = %status, student_id = %student_id, "fee store response");

        if !status.is_success() {
            let message = ApiErrorBody::describe(&body);
            tracing::error!(status = %status, message = %message, "failed to load fee records");
            return Err(FeeError::LoadFailed(anyhow!(
                "fee store returned {}: {}",
                status,
                message
            )));
        }

        let parsed: FeesResponse = serde_json::from_str(&body)
            .map_err(|e| FeeError::MalformedResponse(format!("fee list: {}", e)))?;

        if !parsed.success {
            return Err(FeeError::LoadFailed(anyhow!(
                "fee store reported failure: {}",
                ApiErrorBody::describe(&body)
            )));
        }

        let today = Utc::now().date_naive();
        for fee in &parsed.fees {
            fee.check_invariants(today)
                .map_err(FeeError::MalformedResponse)?;
        }

        tracing::info!(
            student_id = %student_id,
            count = parsed.fees.len(),
            "loaded fee records"
        );

        Ok(parsed.fees)
    }
}
