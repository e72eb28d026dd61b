use servicedesk_core::domain::approval::PendingApproval;

use crate::tools::ToolEffect;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Deny { reason_code: &'static str, reminder: String },
}

/// Tracks review outcomes that still owe an escalation.
///
/// An escalation clears every pending approval whose order id appears as a token in the
/// posted text. Only escalations observed after the approval count.
#[derive(Clone, Debug)]
pub struct EscalationGuard {
    enforce: bool,
    channel_id: String,
    pending: Vec<PendingApproval>,
}

impl EscalationGuard {
    pub fn new(enforce: bool, channel_id: impl Into<String>) -> Self {
        Self { enforce, channel_id: channel_id.into(), pending: Vec::new() }
    }

    pub fn observe(&mut self, effect: &ToolEffect) {
        match effect {
            ToolEffect::ApprovalQueued(approval) => self.pending.push(approval.clone()),
            ToolEffect::Escalated { text, .. } => {
                self.pending.retain(|approval| !mentions_order(text, &approval.order_id.0))
            }
        }
    }

    pub fn unescalated(&self) -> &[PendingApproval] {
        &self.pending
    }

    pub fn evaluate_final_answer(&self) -> GuardrailDecision {
        if !self.enforce || self.pending.is_empty() {
            return GuardrailDecision::Allow;
        }

        let outstanding: Vec<String> = self
            .pending
            .iter()
            .map(|approval| {
                format!(
                    "order {} (${:.2}, {} approval)",
                    approval.order_id,
                    approval.amount.round_dp(2),
                    approval.approval_level
                )
            })
            .collect();

        GuardrailDecision::Deny {
            reason_code: "escalation_missing",
            reminder: format!(
                "Policy reminder: the refund for {} is PENDING_REVIEW and has not been escalated. \
                 Call slack_post_message for channel {} with the order ID, amount, customer and \
                 approval level before giving your final answer.",
                outstanding.join(", "),
                self.channel_id
            ),
        }
    }
}

/// Whole-token match, so `ORD-010` does not count as a mention of `ORD-01`.
fn mentions_order(text: &str, order_id: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .any(|token| token == order_id)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use servicedesk_core::domain::approval::{ApprovalLevel, PendingApproval};
    use servicedesk_core::domain::order::OrderId;

    use super::{EscalationGuard, GuardrailDecision};
    use crate::tools::ToolEffect;

    fn queued(order: &str, level: ApprovalLevel) -> ToolEffect {
        ToolEffect::ApprovalQueued(PendingApproval {
            order_id: OrderId(order.to_string()),
            amount: Decimal::new(500, 0),
            approval_level: level,
        })
    }

    fn escalated(text: &str) -> ToolEffect {
        ToolEffect::Escalated { destination: "C1".to_string(), text: text.to_string() }
    }

    #[test]
    fn allows_when_nothing_is_pending() {
        let guard = EscalationGuard::new(true, "C1");

        assert_eq!(guard.evaluate_final_answer(), GuardrailDecision::Allow);
    }

    #[test]
    fn denies_until_matching_escalation_is_seen() {
        let mut guard = EscalationGuard::new(true, "C1");
        guard.observe(&queued("ORD-010", ApprovalLevel::Manager));

        match guard.evaluate_final_answer() {
            GuardrailDecision::Deny { reason_code, reminder } => {
                assert_eq!(reason_code, "escalation_missing");
                assert!(reminder.contains("order ORD-010 ($500.00, manager approval)"), "{reminder}");
                assert!(reminder.contains("channel C1"));
            }
            GuardrailDecision::Allow => panic!("expected denial"),
        }

        guard.observe(&escalated("Refund Escalation - Order ORD-999"));
        assert!(matches!(guard.evaluate_final_answer(), GuardrailDecision::Deny { .. }));

        guard.observe(&escalated("Refund Escalation - Order ORD-010 - $500.00"));
        assert_eq!(guard.evaluate_final_answer(), GuardrailDecision::Allow);
    }

    #[test]
    fn escalation_for_longer_order_id_does_not_clear_prefix() {
        let mut guard = EscalationGuard::new(true, "C1");
        guard.observe(&queued("ORD-01", ApprovalLevel::Manager));

        guard.observe(&escalated("Refund Escalation - Order ORD-010"));
        assert_eq!(guard.unescalated().len(), 1);

        guard.observe(&escalated("Refund Escalation - Order ORD-01."));
        assert!(guard.unescalated().is_empty());
    }

    #[test]
    fn earlier_escalation_does_not_cover_later_review() {
        let mut guard = EscalationGuard::new(true, "C1");
        guard.observe(&escalated("Order ORD-020 heads up"));
        guard.observe(&queued("ORD-020", ApprovalLevel::Executive));

        assert_eq!(guard.unescalated().len(), 1);
    }

    #[test]
    fn disabled_guard_only_tracks() {
        let mut guard = EscalationGuard::new(false, "C1");
        guard.observe(&queued("ORD-030", ApprovalLevel::Manager));

        assert_eq!(guard.evaluate_final_answer(), GuardrailDecision::Allow);
        assert_eq!(guard.unescalated().len(), 1);
    }
}
