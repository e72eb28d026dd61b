use std::sync::Arc;

use rust_decimal::Decimal;

use crate::approvals::ApprovalSink;
use crate::domain::approval::{ApprovalLevel, PendingApproval};
use crate::domain::customer::CustomerTier;
use crate::domain::refund::{RefundDecision, RefundOutcome, RefundRequest};

pub const STANDARD_REFUND_WINDOW_DAYS: u32 = 30;
pub const GOLD_REFUND_WINDOW_DAYS: u32 = 60;
pub const PLATINUM_REFUND_WINDOW_DAYS: u32 = 90;

/// Refunds at or below this amount are approved without review.
pub const MAX_REFUND_WITHOUT_APPROVAL: Decimal = Decimal::from_parts(200, 0, 0, false, 0);
/// Refunds at or below this amount need a manager; above it, an executive.
pub const MAX_REFUND_WITH_MANAGER_APPROVAL: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

pub fn refund_window_days(tier: CustomerTier) -> u32 {
    match tier {
        CustomerTier::Standard => STANDARD_REFUND_WINDOW_DAYS,
        CustomerTier::Gold => GOLD_REFUND_WINDOW_DAYS,
        CustomerTier::Platinum => PLATINUM_REFUND_WINDOW_DAYS,
    }
}

/// Pure refund policy. Damage overrides everything, then the tier window,
/// then the amount bands.
pub fn decide_refund(request: &RefundRequest) -> RefundOutcome {
    if request.is_damaged() {
        return approved();
    }

    if request.days_since_delivery() > u64::from(refund_window_days(request.customer_tier())) {
        return RefundOutcome { decision: RefundDecision::Denied, pending_approval: None };
    }

    let total = request.order_total();
    if total <= MAX_REFUND_WITHOUT_APPROVAL {
        return approved();
    }

    let level = if total <= MAX_REFUND_WITH_MANAGER_APPROVAL {
        ApprovalLevel::Manager
    } else {
        ApprovalLevel::Executive
    };

    RefundOutcome {
        decision: RefundDecision::PendingReview { level },
        pending_approval: Some(PendingApproval {
            order_id: request.order_id().clone(),
            amount: total,
            approval_level: level,
        }),
    }
}

fn approved() -> RefundOutcome {
    RefundOutcome { decision: RefundDecision::Approved, pending_approval: None }
}

/// Runs the refund policy and appends every review outcome to the injected sink.
#[derive(Clone)]
pub struct RefundProcessor {
    approvals: Arc<dyn ApprovalSink>,
}

impl RefundProcessor {
    pub fn new(approvals: Arc<dyn ApprovalSink>) -> Self {
        Self { approvals }
    }

    pub fn process(&self, request: &RefundRequest) -> RefundOutcome {
        let outcome = decide_refund(request);
        if let Some(approval) = &outcome.pending_approval {
            self.approvals.record(approval.clone());
        }
        outcome
    }
}
