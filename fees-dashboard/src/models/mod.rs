use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One billable line-item owed by a student.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecord {
    pub id: String,
    pub student_id: String,
    /// Category label, e.g. "tuition", "library".
    pub fee_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: FeeStatus,
    /// Set only when `status` is `Paid`.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// Set only when `status` is `Paid`, e.g. "online", "cash".
    #[serde(default)]
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl FeeRecord {
    /// Check record-level invariants as received from the fee store.
    ///
    /// `amount` must be positive, an overdue record must actually be past
    /// its due date, and the payment fields must be present exactly when
    /// the record is paid. Violations are treated as a malformed response
    /// at the HTTP boundary, never patched up locally.
    pub fn check_invariants(&self, today: NaiveDate) -> Result<(), String> {
        if self.amount <= 0.0 {
            return Err(format!("fee {} has non-positive amount", self.id));
        }

        if self.status == FeeStatus::Overdue && self.due_date >= today {
            return Err(format!(
                "fee {} is marked overdue but due {} is not in the past",
                self.id, self.due_date
            ));
        }

        let has_payment_fields = self.payment_date.is_some() && self.payment_method.is_some();
        match self.status {
            FeeStatus::Paid if !has_payment_fields => Err(format!(
                "fee {} is paid but missing payment date or method",
                self.id
            )),
            FeeStatus::Paid => Ok(()),
            _ if self.payment_date.is_some() || self.payment_method.is_some() => Err(format!(
                "fee {} is not paid but carries payment fields",
                self.id
            )),
            _ => Ok(()),
        }
    }
}

/// Derived dashboard aggregates over one student's fee records.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeeSummary {
    pub total_amount: f64,
    pub paid_amount: f64,
    pub pending_amount: f64,
    pub overdue_amount: f64,
    /// Paid fraction of the total, as a percentage. Zero when there are
    /// no fee records at all.
    pub payment_rate: f64,
    pub pending_count: usize,
    pub paid_count: usize,
    pub overdue_count: usize,
    pub cancelled_count: usize,
}

/// Identity of the student the dashboard is bound to.
///
/// Passed in explicitly at construction instead of being read from ambient
/// session state, so the controller is a pure function of its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentContext {
    pub id: String,
    pub name: String,
    pub email: String,
    pub class: String,
    pub section: String,
}

/// One checkout attempt minted by the payment gateway.
///
/// Ephemeral: discarded once the checkout flow resolves, never reused
/// across attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSession {
    /// Correlation id used for verification.
    pub order_id: String,
    /// Opaque token handed to the gateway checkout UI.
    pub session_token: String,
    pub fee_ids: Vec<String>,
    /// Authoritative sum computed server-side.
    pub amount: f64,
}

/// Terminal result reported by the gateway checkout UI.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// The gateway observed a completed payment in-process.
    Completed,
    /// The flow continues through a full-page redirect and will resume
    /// via [`resume_payment`](crate::dashboard::FeeDashboard::resume_payment).
    RedirectPending { checkout_url: String },
    Failed { message: String },
    /// The user closed the checkout without completing it.
    Abandoned,
}

/// Authoritative payment status reported by the verification endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Paid,
    /// Any non-PAID status, carried verbatim for the user-facing message.
    NotPaid(String),
}

/// A generated receipt document ready to hand to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDownload {
    pub file_name: String,
    pub content: Vec<u8>,
}
