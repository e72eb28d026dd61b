use std::sync::Mutex;

use crate::domain::approval::PendingApproval;

/// Append-only destination for refunds that need human review.
///
/// Implementations must be safe to share across concurrent decision loops.
/// Nothing in this workspace dequeues or resolves the records.
pub trait ApprovalSink: Send + Sync {
    fn record(&self, approval: PendingApproval);
}

#[derive(Debug, Default)]
pub struct InMemoryApprovalLog {
    entries: Mutex<Vec<PendingApproval>>,
}

impl InMemoryApprovalLog {
    pub fn snapshot(&self) -> Vec<PendingApproval> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ApprovalSink for InMemoryApprovalLog {
    fn record(&self, approval: PendingApproval) {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(approval);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::{ApprovalSink, InMemoryApprovalLog};
    use crate::domain::approval::{ApprovalLevel, PendingApproval};
    use crate::domain::order::OrderId;

    fn approval(order: &str) -> PendingApproval {
        PendingApproval {
            order_id: OrderId(order.to_string()),
            amount: Decimal::new(250, 0),
            approval_level: ApprovalLevel::Manager,
        }
    }

    #[test]
    fn log_preserves_append_order() {
        let log = InMemoryApprovalLog::default();
        log.record(approval("ORD-1"));
        log.record(approval("ORD-2"));

        let ids: Vec<String> = log.snapshot().into_iter().map(|a| a.order_id.0).collect();
        assert_eq!(ids, vec!["ORD-1", "ORD-2"]);
    }

    #[tokio::test]
    async fn log_accepts_concurrent_writers() {
        let log = Arc::new(InMemoryApprovalLog::default());
        let mut handles = Vec::new();
        for index in 0..8 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.record(approval(&format!("ORD-{index}")));
            }));
        }
        for handle in handles {
            handle.await.expect("writer task");
        }

        assert_eq!(log.len(), 8);
    }
}
