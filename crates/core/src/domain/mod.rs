pub mod approval;
pub mod customer;
pub mod order;
pub mod refund;
