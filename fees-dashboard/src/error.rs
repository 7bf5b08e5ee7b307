use thiserror::Error;

/// Error taxonomy for the fee payment workflow.
///
/// Every failure is terminal for the current user-initiated action and is
/// surfaced to the caller; nothing is swallowed. Retries are always
/// user-initiated, except the bounded retry around payment verification.
#[derive(Debug, Error)]
pub enum FeeError {
    /// Rejected before any network call; the user must correct input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The fee-list fetch failed; the dashboard renders an explicit error
    /// state rather than an empty or stale list.
    #[error("Failed to load fee records: {0}")]
    LoadFailed(anyhow::Error),

    /// A collaborator response did not match its schema. Never patched up
    /// with a locally fabricated placeholder.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The gateway rejected session creation or checkout.
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Verification returned an authoritative non-PAID status.
    #[error("Payment was not completed successfully, status: {status}")]
    PaymentDeclined { order_id: String, status: String },

    /// The verification call itself failed. Funds may have moved, so this
    /// is deliberately distinct from a confirmed failure.
    #[error("Payment status unclear, check payment history: {0}")]
    VerificationUncertain(anyhow::Error),

    /// Receipt generation failed. Safe to retry; never rolls back the
    /// payment itself.
    #[error("Failed to generate receipt: {0}")]
    ReceiptFailed(anyhow::Error),

    /// The redirect-resumption store could not be reached.
    #[error("Resume store error: {0}")]
    Resume(anyhow::Error),

    /// Another payment attempt is already in flight for this dashboard.
    #[error("A payment attempt is already in progress")]
    PaymentInFlight,
}

impl From<validator::ValidationErrors> for FeeError {
    fn from(err: validator::ValidationErrors) -> Self {
        FeeError::Validation(err.to_string())
    }
}
