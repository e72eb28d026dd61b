pub mod approvals;
pub mod config;
pub mod domain;
pub mod errors;
pub mod escalation;
pub mod lookup;
pub mod rules;

pub use approvals::{ApprovalSink, InMemoryApprovalLog};
pub use domain::approval::{ApprovalLevel, PendingApproval};
pub use domain::customer::{Customer, CustomerId, CustomerTier};
pub use domain::order::{Order, OrderId, OrderStatus, ShippingSpeed};
pub use domain::refund::{RefundDecision, RefundOutcome, RefundRequest};
pub use errors::{DomainError, InterfaceError};
pub use escalation::{EscalationError, EscalationReceipt, EscalationSink};
pub use lookup::{LookupError, LookupService};
