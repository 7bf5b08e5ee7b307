//! Payment attempt lifecycle.
//!
//! One attempt moves `NotStarted → SessionCreated → CheckoutOpen →
//! {Verifying → Paid | Failed} | Abandoned`. A redirect-based checkout
//! exits the process at `CheckoutOpen` and resumes out-of-band.

use crate::models::ReceiptDownload;

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentPhase {
    NotStarted,
    SessionCreated { order_id: String },
    CheckoutOpen { order_id: String },
    Verifying { order_id: String },
    Paid { order_id: String },
    Failed { message: String },
    Abandoned,
}

impl PaymentPhase {
    /// A new attempt may only start when no other attempt is in flight;
    /// terminal phases are restartable.
    pub fn in_flight(&self) -> bool {
        matches!(
            self,
            PaymentPhase::SessionCreated { .. }
                | PaymentPhase::CheckoutOpen { .. }
                | PaymentPhase::Verifying { .. }
        )
    }

    pub fn order_id(&self) -> Option<&str> {
        match self {
            PaymentPhase::SessionCreated { order_id }
            | PaymentPhase::CheckoutOpen { order_id }
            | PaymentPhase::Verifying { order_id }
            | PaymentPhase::Paid { order_id } => Some(order_id),
            _ => None,
        }
    }
}

/// Result of one driven payment attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    /// Verified paid; the receipt is ready to hand to the user.
    Paid {
        order_id: String,
        receipt: ReceiptDownload,
    },
    /// The flow left the process through a full-page redirect and will be
    /// completed by the resumption path.
    RedirectPending {
        order_id: String,
        checkout_url: String,
    },
    /// Checkout closed without completing; no fee status changed.
    Abandoned,
}

/// Whether the dashboard currently holds trustworthy fee data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded,
    /// The last fetch failed; the UI renders an error state, never stale
    /// or partial data.
    Failed(String),
}
