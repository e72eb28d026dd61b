use async_trait::async_trait;
use thiserror::Error;

use crate::domain::customer::{Customer, CustomerId};
use crate::domain::order::{Order, OrderId};

/// A storage failure. A missing record is `Ok(None)`, never this.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("lookup store unavailable: {0}")]
    Unavailable(String),
    #[error("stored record is malformed: {0}")]
    Corrupt(String),
}

/// Read-only view over customers and their orders.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn find_customer(&self, id: &CustomerId) -> Result<Option<Customer>, LookupError>;
    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, LookupError>;
    async fn orders_for_customer(&self, id: &CustomerId) -> Result<Vec<Order>, LookupError>;
}
