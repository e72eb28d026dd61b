use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::approval::{ApprovalLevel, PendingApproval};
use crate::domain::customer::CustomerTier;
use crate::domain::order::OrderId;
use crate::errors::DomainError;

/// A validated refund request. Construction is the only place the
/// non-negativity checks run, so every live value satisfies them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RefundRequest {
    order_id: OrderId,
    customer_tier: CustomerTier,
    order_total: Decimal,
    days_since_delivery: u64,
    is_damaged: bool,
}

impl RefundRequest {
    pub fn new(
        order_id: OrderId,
        customer_tier: CustomerTier,
        order_total: Decimal,
        days_since_delivery: i64,
        is_damaged: bool,
    ) -> Result<Self, DomainError> {
        if order_total < Decimal::ZERO {
            return Err(DomainError::NegativeOrderTotal(order_total));
        }
        let days_since_delivery = u64::try_from(days_since_delivery)
            .map_err(|_| DomainError::InvalidDaysSinceDelivery(days_since_delivery))?;

        Ok(Self { order_id, customer_tier, order_total, days_since_delivery, is_damaged })
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn customer_tier(&self) -> CustomerTier {
        self.customer_tier
    }

    pub fn order_total(&self) -> Decimal {
        self.order_total
    }

    pub fn days_since_delivery(&self) -> u64 {
        self.days_since_delivery
    }

    pub fn is_damaged(&self) -> bool {
        self.is_damaged
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefundDecision {
    Approved,
    Denied,
    PendingReview { level: ApprovalLevel },
}

impl RefundDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Denied => "DENIED",
            Self::PendingReview { .. } => "PENDING_REVIEW",
        }
    }

    pub fn requires_review(&self) -> bool {
        matches!(self, Self::PendingReview { .. })
    }
}

impl fmt::Display for RefundDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision plus the approval record it produced, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RefundOutcome {
    pub decision: RefundDecision,
    pub pending_approval: Option<PendingApproval>,
}
