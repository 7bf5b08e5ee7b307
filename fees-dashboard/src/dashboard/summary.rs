//! Summary derivation and tab filtering over an already-loaded fee list.
//!
//! Pure functions so the arithmetic and the 30-day upcoming window are
//! testable without any I/O. The window is inclusive at both ends.

use crate::error::FeeError;
use crate::models::{FeeRecord, FeeStatus, FeeSummary};
use chrono::{Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// How far ahead a pending fee counts as "upcoming".
pub const UPCOMING_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTab {
    All,
    Pending,
    Paid,
    Overdue,
    Upcoming,
}

impl FromStr for ActiveTab {
    type Err = FeeError;

    /// Unknown tab names fail loudly instead of silently falling back to
    /// `All`, so a misspelled tab in the UI shows up as a bug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ActiveTab::All),
            "pending" => Ok(ActiveTab::Pending),
            "paid" => Ok(ActiveTab::Paid),
            "overdue" => Ok(ActiveTab::Overdue),
            "upcoming" => Ok(ActiveTab::Upcoming),
            other => Err(FeeError::Validation(format!("unknown tab: {}", other))),
        }
    }
}

impl fmt::Display for ActiveTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActiveTab::All => "all",
            ActiveTab::Pending => "pending",
            ActiveTab::Paid => "paid",
            ActiveTab::Overdue => "overdue",
            ActiveTab::Upcoming => "upcoming",
        };
        f.write_str(name)
    }
}

/// Derive dashboard aggregates over a fee list.
pub fn summarize(fees: &[FeeRecord]) -> FeeSummary {
    let mut summary = FeeSummary::default();

    for fee in fees {
        summary.total_amount += fee.amount;
        match fee.status {
            FeeStatus::Pending => {
                summary.pending_amount += fee.amount;
                summary.pending_count += 1;
            }
            FeeStatus::Paid => {
                summary.paid_amount += fee.amount;
                summary.paid_count += 1;
            }
            FeeStatus::Overdue => {
                summary.overdue_amount += fee.amount;
                summary.overdue_count += 1;
            }
            FeeStatus::Cancelled => {
                summary.cancelled_count += 1;
            }
        }
    }

    // Guard against division by zero for students with no fees.
    summary.payment_rate = if summary.total_amount > 0.0 {
        summary.paid_amount / summary.total_amount * 100.0
    } else {
        0.0
    };

    summary
}

/// Pending fees due within the next [`UPCOMING_WINDOW_DAYS`] days of
/// `today`, inclusive at both ends. Original order preserved.
pub fn upcoming_fees(fees: &[FeeRecord], today: NaiveDate) -> Vec<FeeRecord> {
    let horizon = today + Duration::days(UPCOMING_WINDOW_DAYS);
    fees.iter()
        .filter(|f| f.status == FeeStatus::Pending && f.due_date >= today && f.due_date <= horizon)
        .cloned()
        .collect()
}

/// Fees already past due. Original order preserved.
pub fn overdue_fees(fees: &[FeeRecord]) -> Vec<FeeRecord> {
    fees.iter()
        .filter(|f| f.status == FeeStatus::Overdue)
        .cloned()
        .collect()
}

/// Filter the visible list by tab, preserving the order received.
///
/// `Upcoming` reuses the precomputed subset so the date-window rule is
/// applied exactly once, at load time.
pub fn filter_by_tab(
    all: &[FeeRecord],
    upcoming: &[FeeRecord],
    tab: ActiveTab,
) -> Vec<FeeRecord> {
    match tab {
        ActiveTab::All => all.to_vec(),
        ActiveTab::Pending => by_status(all, FeeStatus::Pending),
        ActiveTab::Paid => by_status(all, FeeStatus::Paid),
        ActiveTab::Overdue => by_status(all, FeeStatus::Overdue),
        ActiveTab::Upcoming => upcoming.to_vec(),
    }
}

fn by_status(fees: &[FeeRecord], status: FeeStatus) -> Vec<FeeRecord> {
    fees.iter().filter(|f| f.status == status).cloned().collect()
}
