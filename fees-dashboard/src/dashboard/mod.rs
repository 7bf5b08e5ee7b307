//! Fee dashboard controller.
//!
//! Orchestrates the whole workflow: loads a student's fee records, derives
//! summary and date-window subsets, manages the bulk-payment selection,
//! drives the payment gateway through checkout and verification, and hands
//! the generated receipt to the caller. Single logical thread: every
//! network call is a suspension point and re-entrant payment attempts are
//! rejected while one is in flight.

pub mod state;
pub mod summary;

use crate::dtos::{CreatePaymentRequest, ReceiptRequest};
use crate::error::FeeError;
use crate::models::{
    CheckoutOutcome, FeeRecord, FeeStatus, FeeSummary, ReceiptDownload, StudentContext,
    VerificationStatus,
};
use crate::services::{
    receipt_file_name, FeeStoreClient, PaymentGatewayPort, ReceiptClient, ResumeStore,
};
use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use validator::Validate;

pub use state::{LoadState, PaymentOutcome, PaymentPhase};
pub use summary::ActiveTab;

pub struct FeeDashboard<G, R> {
    student: StudentContext,
    fees: FeeStoreClient,
    receipts: ReceiptClient,
    gateway: G,
    resume: R,

    records: Vec<FeeRecord>,
    summary: FeeSummary,
    upcoming: Vec<FeeRecord>,
    overdue: Vec<FeeRecord>,
    selection: Vec<String>,
    active_tab: ActiveTab,
    load_state: LoadState,
    phase: PaymentPhase,
}

impl<G, R> FeeDashboard<G, R>
where
    G: PaymentGatewayPort,
    R: ResumeStore,
{
    pub fn new(
        student: StudentContext,
        fees: FeeStoreClient,
        receipts: ReceiptClient,
        gateway: G,
        resume: R,
    ) -> Self {
        Self {
            student,
            fees,
            receipts,
            gateway,
            resume,
            records: Vec::new(),
            summary: FeeSummary::default(),
            upcoming: Vec::new(),
            overdue: Vec::new(),
            selection: Vec::new(),
            active_tab: ActiveTab::All,
            load_state: LoadState::NotLoaded,
            phase: PaymentPhase::NotStarted,
        }
    }

    // --- data loading -----------------------------------------------------

    /// Fetch the student's fee records and derive all dashboard aggregates.
    ///
    /// On failure the dashboard is left in an explicit error state with no
    /// records at all; stale or partial data is never shown. Retrying is
    /// up to the user.
    pub async fn load_fees(&mut self) -> Result<(), FeeError> {
        match self.fees.load_fees(&self.student.id).await {
            Ok(records) => {
                self.apply_records(records);
                self.load_state = LoadState::Loaded;
                Ok(())
            }
            Err(e) => {
                self.records.clear();
                self.summary = FeeSummary::default();
                self.upcoming.clear();
                self.overdue.clear();
                self.load_state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn apply_records(&mut self, records: Vec<FeeRecord>) {
        let today = Self::today();
        self.summary = summary::summarize(&records);
        self.upcoming = summary::upcoming_fees(&records, today);
        self.overdue = summary::overdue_fees(&records);
        self.records = records;

        // Drop selections whose records left the pending state, e.g. paid
        // concurrently from another session.
        let records = &self.records;
        self.selection.retain(|id| {
            records
                .iter()
                .any(|f| &f.id == id && f.status == FeeStatus::Pending)
        });
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    // --- filtering & selection --------------------------------------------

    pub fn set_active_tab(&mut self, tab: ActiveTab) {
        self.active_tab = tab;
    }

    pub fn active_tab(&self) -> ActiveTab {
        self.active_tab
    }

    /// Fee records visible under the current tab, order preserved.
    pub fn visible_fees(&self) -> Vec<FeeRecord> {
        summary::filter_by_tab(&self.records, &self.upcoming, self.active_tab)
    }

    /// Toggle one fee in the bulk-payment selection. Only pending records
    /// are selectable.
    pub fn toggle_selection(&mut self, fee_id: &str) -> Result<(), FeeError> {
        if let Some(pos) = self.selection.iter().position(|id| id == fee_id) {
            self.selection.remove(pos);
            return Ok(());
        }

        let record = self
            .records
            .iter()
            .find(|f| f.id == fee_id)
            .ok_or_else(|| FeeError::Validation(format!("unknown fee id: {}", fee_id)))?;

        if record.status != FeeStatus::Pending {
            return Err(FeeError::Validation(format!(
                "fee {} is not payable",
                fee_id
            )));
        }

        self.selection.push(fee_id.to_string());
        Ok(())
    }

    pub fn selected_ids(&self) -> &[String] {
        &self.selection
    }

    // --- payment ----------------------------------------------------------

    /// Bulk payment path: pay the explicitly selected fees. Requires at
    /// least one selection.
    pub async fn pay_selected(&mut self) -> Result<PaymentOutcome, FeeError> {
        if self.selection.is_empty() {
            return Err(FeeError::Validation(
                "no fees selected for payment".to_string(),
            ));
        }
        let fee_ids = self.selection.clone();
        self.run_payment(fee_ids).await
    }

    /// Quick-action path: pay every currently pending fee in one click.
    pub async fn pay_now(&mut self) -> Result<PaymentOutcome, FeeError> {
        let fee_ids: Vec<String> = self
            .records
            .iter()
            .filter(|f| f.status == FeeStatus::Pending)
            .map(|f| f.id.clone())
            .collect();

        if fee_ids.is_empty() {
            return Err(FeeError::Validation("no pending fees to pay".to_string()));
        }
        self.run_payment(fee_ids).await
    }

    async fn run_payment(&mut self, fee_ids: Vec<String>) -> Result<PaymentOutcome, FeeError> {
        if self.phase.in_flight() {
            return Err(FeeError::PaymentInFlight);
        }

        let result = self.drive_payment(fee_ids).await;

        // Selection is reset after every attempt, success or failure, so a
        // stale selection cannot leak into the next one.
        self.selection.clear();
        result
    }

    async fn drive_payment(&mut self, fee_ids: Vec<String>) -> Result<PaymentOutcome, FeeError> {
        // Re-validate selection freshness against the store immediately
        // before minting a session; records paid elsewhere are dropped.
        let fresh = self.fees.load_fees(&self.student.id).await?;
        self.apply_records(fresh);
        self.load_state = LoadState::Loaded;

        let payable: Vec<String> = fee_ids
            .into_iter()
            .filter(|id| {
                self.records
                    .iter()
                    .any(|f| &f.id == id && f.status == FeeStatus::Pending)
            })
            .collect();

        if payable.is_empty() {
            return Err(FeeError::Validation(
                "selected fees are no longer payable".to_string(),
            ));
        }

        let request = CreatePaymentRequest {
            fee_ids: payable,
            student_id: self.student.id.clone(),
            student_name: self.student.name.clone(),
            student_email: self.student.email.clone(),
        };
        request.validate()?;

        let session = match self.gateway.create_session(&request).await {
            Ok(session) => session,
            Err(e) => {
                self.phase = PaymentPhase::NotStarted;
                return Err(e);
            }
        };

        self.phase = PaymentPhase::SessionCreated {
            order_id: session.order_id.clone(),
        };
        tracing::info!(
            order_id = %session.order_id,
            amount = session.amount,
            fee_count = session.fee_ids.len(),
            "payment session created, opening checkout"
        );

        self.phase = PaymentPhase::CheckoutOpen {
            order_id: session.order_id.clone(),
        };

        let outcome = match self.gateway.open_checkout(&session).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.phase = PaymentPhase::Failed {
                    message: e.to_string(),
                };
                return Err(e);
            }
        };

        match outcome {
            CheckoutOutcome::Completed => {
                self.phase = PaymentPhase::Verifying {
                    order_id: session.order_id.clone(),
                };
                self.verify_and_collect(session.order_id, Some(session.fee_ids))
                    .await
            }
            CheckoutOutcome::RedirectPending { checkout_url } => {
                // The flow continues outside this process; the session
                // handle is discarded and the outcome is re-established
                // via the resumption marker on return.
                tracing::info!(order_id = %session.order_id, "checkout redirected, flow leaves process");
                self.phase = PaymentPhase::NotStarted;
                Ok(PaymentOutcome::RedirectPending {
                    order_id: session.order_id,
                    checkout_url,
                })
            }
            CheckoutOutcome::Failed { message } => {
                tracing::warn!(order_id = %session.order_id, message = %message, "checkout failed");
                self.phase = PaymentPhase::Failed {
                    message: message.clone(),
                };
                Err(FeeError::Gateway(message))
            }
            CheckoutOutcome::Abandoned => {
                // No fee status change, no verification, no receipt.
                tracing::info!(order_id = %session.order_id, "checkout abandoned by user");
                self.phase = PaymentPhase::Abandoned;
                Ok(PaymentOutcome::Abandoned)
            }
        }
    }

    /// Authoritative verification, then refresh and receipt on success.
    ///
    /// `fee_ids` of `None` means "every record that is paid after the
    /// refresh", used by the resumption path where the original selection
    /// is no longer known.
    async fn verify_and_collect(
        &mut self,
        order_id: String,
        fee_ids: Option<Vec<String>>,
    ) -> Result<PaymentOutcome, FeeError> {
        match self.gateway.verify(&order_id).await {
            Ok(VerificationStatus::Paid) => {
                self.phase = PaymentPhase::Paid {
                    order_id: order_id.clone(),
                };

                // Wholesale refresh instead of an incremental patch; a
                // refresh failure does not undo a verified payment.
                if let Err(e) = self.load_fees().await {
                    tracing::warn!(error = %e, "fee list refresh after payment failed");
                }

                let receipt_ids = match fee_ids {
                    Some(ids) => ids,
                    None => self
                        .records
                        .iter()
                        .filter(|f| f.status == FeeStatus::Paid)
                        .map(|f| f.id.clone())
                        .collect(),
                };
                if receipt_ids.is_empty() {
                    return Err(FeeError::ReceiptFailed(anyhow!(
                        "no paid fee records to include in receipt"
                    )));
                }

                let receipt = self.request_receipt_named(&receipt_ids).await?;
                Ok(PaymentOutcome::Paid { order_id, receipt })
            }
            Ok(VerificationStatus::NotPaid(status)) => {
                self.phase = PaymentPhase::Failed {
                    message: format!("payment not completed, status: {}", status),
                };
                Err(FeeError::PaymentDeclined { order_id, status })
            }
            Err(e) => {
                // Funds may have moved even though the check failed, so
                // this is reported as uncertainty, not as a failure.
                self.phase = PaymentPhase::Failed {
                    message: "payment status unclear".to_string(),
                };
                match e {
                    FeeError::VerificationUncertain(_) => Err(e),
                    other => Err(FeeError::VerificationUncertain(anyhow::Error::new(other))),
                }
            }
        }
    }

    // --- redirect resumption ----------------------------------------------

    /// Complete a payment whose checkout left the process via redirect.
    ///
    /// Consumes the one-shot marker for `order_id` if the return handler
    /// prepared one; a reload after that, or an expired marker, falls back
    /// to authoritative verification.
    pub async fn resume_payment(&mut self, order_id: &str) -> Result<PaymentOutcome, FeeError> {
        if self.phase.in_flight() {
            return Err(FeeError::PaymentInFlight);
        }

        if let Some(payload) = self.resume.take(order_id).await? {
            tracing::info!(order_id = %order_id, "resuming payment from one-shot marker");
            self.phase = PaymentPhase::Paid {
                order_id: order_id.to_string(),
            };

            if let Err(e) = self.load_fees().await {
                tracing::warn!(error = %e, "fee list refresh after resumed payment failed");
            }

            return Ok(PaymentOutcome::Paid {
                order_id: order_id.to_string(),
                receipt: ReceiptDownload {
                    file_name: receipt_file_name(&self.student.name, Self::today()),
                    content: payload,
                },
            });
        }

        tracing::info!(order_id = %order_id, "no resume marker, falling back to verification");
        self.phase = PaymentPhase::Verifying {
            order_id: order_id.to_string(),
        };
        self.verify_and_collect(order_id.to_string(), None).await
    }

    // --- receipts ---------------------------------------------------------

    /// Re-download a receipt for specific already-paid fees.
    pub async fn download_receipts(&self, fee_ids: &[String]) -> Result<ReceiptDownload, FeeError> {
        if fee_ids.is_empty() {
            return Err(FeeError::Validation(
                "no fees selected for receipt download".to_string(),
            ));
        }

        for id in fee_ids {
            let paid = self
                .records
                .iter()
                .any(|f| &f.id == id && f.status == FeeStatus::Paid);
            if !paid {
                return Err(FeeError::Validation(format!("fee {} is not paid", id)));
            }
        }

        self.request_receipt_named(fee_ids).await
    }

    /// Bulk variant: one receipt covering every paid fee on record.
    pub async fn download_all_paid_receipts(&self) -> Result<ReceiptDownload, FeeError> {
        let paid_ids: Vec<String> = self
            .records
            .iter()
            .filter(|f| f.status == FeeStatus::Paid)
            .map(|f| f.id.clone())
            .collect();

        if paid_ids.is_empty() {
            return Err(FeeError::Validation("no paid fees on record".to_string()));
        }

        self.request_receipt_named(&paid_ids).await
    }

    async fn request_receipt_named(&self, fee_ids: &[String]) -> Result<ReceiptDownload, FeeError> {
        let request = ReceiptRequest {
            student_id: self.student.id.clone(),
            student_name: self.student.name.clone(),
            student_class: self.student.class.clone(),
            student_section: self.student.section.clone(),
            fee_ids: fee_ids.to_vec(),
        };

        let content = self.receipts.request_receipt(&request).await?;

        Ok(ReceiptDownload {
            file_name: receipt_file_name(&self.student.name, Self::today()),
            content,
        })
    }

    // --- accessors --------------------------------------------------------

    pub fn student(&self) -> &StudentContext {
        &self.student
    }

    pub fn records(&self) -> &[FeeRecord] {
        &self.records
    }

    pub fn summary(&self) -> &FeeSummary {
        &self.summary
    }

    pub fn upcoming_fees(&self) -> &[FeeRecord] {
        &self.upcoming
    }

    pub fn overdue_fees(&self) -> &[FeeRecord] {
        &self.overdue
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn phase(&self) -> &PaymentPhase {
        &self.phase
    }

    /// The resumption store, exposed so the embedding layer's return
    /// handler can deposit markers.
    pub fn resume_store(&self) -> &R {
        &self.resume
    }
}
