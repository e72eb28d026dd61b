//! Deterministic business rules. No I/O; every function here is a pure
//! function of its arguments (the refund processor's sink append aside).

pub mod refund;
pub mod shipping;

pub use refund::{decide_refund, refund_window_days, RefundProcessor};
pub use shipping::{can_cancel, can_modify, delivery_estimate, shipping_cost};
