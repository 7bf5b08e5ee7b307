use crate::models::FeeRecord;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Response shape of `GET /fees?studentId={id}`.
///
/// Only the raw record list is consumed; the dashboard derives summary,
/// upcoming and overdue subsets locally so the 30-day window rule lives in
/// exactly one place.
#[derive(Debug, Deserialize)]
pub struct FeesResponse {
    pub success: bool,
    #[serde(default)]
    pub fees: Vec<FeeRecord>,
}

/// Body of `POST /payments` — mints one checkout session.
#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[validate(length(min = 1, message = "at least one fee must be selected"))]
    pub fee_ids: Vec<String>,
    #[validate(length(min = 1, message = "student id is required"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "student name is required"))]
    pub student_name: String,
    #[validate(email(message = "student email is invalid"))]
    pub student_email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub success: bool,
    pub order_id: String,
    /// Opaque session token for the hosted checkout UI.
    pub payment_session_id: String,
    /// Authoritative amount, summed server-side over the selected fees.
    pub amount: f64,
}

/// Response shape of `GET /payments?order_id={id}`.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub status: String,
}

/// Body of `POST /fees/receipt`.
#[derive(Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    pub student_id: String,
    pub student_name: String,
    pub student_class: String,
    pub student_section: String,
    #[validate(length(min = 1, message = "at least one fee is required"))]
    pub fee_ids: Vec<String>,
}

/// Error body returned by collaborator services on non-2xx responses.
/// Field names vary between services, so both spellings are accepted.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Best-effort human-readable message out of an error body, falling
    /// back to the raw text when it is not JSON.
    pub fn describe(body: &str) -> String {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => parsed
                .message
                .or(parsed.error)
                .unwrap_or_else(|| body.to_string()),
            Err(_) => body.to_string(),
        }
    }
}
