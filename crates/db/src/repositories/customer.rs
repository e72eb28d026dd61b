use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;

use servicedesk_core::domain::customer::{Customer, CustomerId, CustomerTier};
use servicedesk_core::domain::order::{Order, OrderId, OrderStatus};
use servicedesk_core::lookup::{LookupError, LookupService};

use super::RepositoryError;
use crate::DbPool;

/// SQLite-backed lookups over the `customers` and `orders` tables.
pub struct SqlLookupService {
    pool: DbPool,
}

impl SqlLookupService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Row counts for `(customers, orders)`. Fails when the schema is missing.
    pub async fn record_counts(&self) -> Result<(i64, i64), RepositoryError> {
        let customers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customers").fetch_one(&self.pool).await?;
        let orders: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?;
        Ok((customers, orders))
    }

    async fn customer_row(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, tier, email FROM customers WHERE id = ?1")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_customer).transpose()
    }

    async fn order_row(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, customer_id, total, status, days_since_delivery FROM orders WHERE id = ?1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn order_rows(&self, customer_id: &CustomerId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, customer_id, total, status, days_since_delivery
             FROM orders WHERE customer_id = ?1 ORDER BY id",
        )
        .bind(&customer_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_order).collect()
    }
}

#[async_trait]
impl LookupService for SqlLookupService {
    async fn find_customer(&self, id: &CustomerId) -> Result<Option<Customer>, LookupError> {
        Ok(self.customer_row(id).await?)
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, LookupError> {
        Ok(self.order_row(id).await?)
    }

    async fn orders_for_customer(&self, id: &CustomerId) -> Result<Vec<Order>, LookupError> {
        Ok(self.order_rows(id).await?)
    }
}

fn decode<T>(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let id: String = decode(row, "id")?;
    let tier_str: String = decode(row, "tier")?;
    let tier = CustomerTier::from_str(&tier_str)
        .map_err(|e| RepositoryError::Decode(format!("customer {id}: {e}")))?;

    Ok(Customer {
        id: CustomerId(id),
        name: decode(row, "name")?,
        tier,
        email: decode(row, "email")?,
    })
}

fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> Result<Order, RepositoryError> {
    let id: String = decode(row, "id")?;
    let total_str: String = decode(row, "total")?;
    let status_str: String = decode(row, "status")?;
    let days: i64 = decode(row, "days_since_delivery")?;

    let total = Decimal::from_str(&total_str)
        .map_err(|e| RepositoryError::Decode(format!("order {id} total `{total_str}`: {e}")))?;
    let status = OrderStatus::from_str(&status_str)
        .map_err(|e| RepositoryError::Decode(format!("order {id}: {e}")))?;
    let days_since_delivery = u32::try_from(days).map_err(|_| {
        RepositoryError::Decode(format!("order {id} days_since_delivery out of range: {days}"))
    })?;

    Ok(Order {
        id: OrderId(id),
        customer_id: CustomerId(decode(row, "customer_id")?),
        total,
        status,
        days_since_delivery,
    })
}
