use rust_decimal::Decimal;
use tracing::info;

use servicedesk_core::domain::customer::{Customer, CustomerId, CustomerTier};
use servicedesk_core::domain::order::{Order, OrderId, OrderStatus};

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

struct SampleCustomer {
    id: &'static str,
    name: &'static str,
    tier: CustomerTier,
    email: &'static str,
}

struct SampleOrder {
    id: &'static str,
    customer_id: &'static str,
    total_cents: i64,
    status: OrderStatus,
    days_since_delivery: u32,
}

const SAMPLE_CUSTOMERS: &[SampleCustomer] = &[
    SampleCustomer {
        id: "CUST-001",
        name: "John Doe",
        tier: CustomerTier::Standard,
        email: "john@example.com",
    },
    SampleCustomer {
        id: "CUST-002",
        name: "Jane Smith",
        tier: CustomerTier::Gold,
        email: "jane@example.com",
    },
    SampleCustomer {
        id: "CUST-003",
        name: "Bob Johnson",
        tier: CustomerTier::Platinum,
        email: "bob@example.com",
    },
    SampleCustomer {
        id: "CUST-004",
        name: "Alice Williams",
        tier: CustomerTier::Standard,
        email: "alice@example.com",
    },
    SampleCustomer {
        id: "CUST-005",
        name: "Charlie Brown",
        tier: CustomerTier::Gold,
        email: "charlie@example.com",
    },
];

const SAMPLE_ORDERS: &[SampleOrder] = &[
    SampleOrder {
        id: "ORD-001",
        customer_id: "CUST-001",
        total_cents: 7500,
        status: OrderStatus::Delivered,
        days_since_delivery: 5,
    },
    SampleOrder {
        id: "ORD-002",
        customer_id: "CUST-002",
        total_cents: 25000,
        status: OrderStatus::Delivered,
        days_since_delivery: 35,
    },
    SampleOrder {
        id: "ORD-003",
        customer_id: "CUST-003",
        total_cents: 150000,
        status: OrderStatus::Delivered,
        days_since_delivery: 10,
    },
    SampleOrder {
        id: "ORD-004",
        customer_id: "CUST-001",
        total_cents: 4999,
        status: OrderStatus::Shipped,
        days_since_delivery: 0,
    },
    SampleOrder {
        id: "ORD-005",
        customer_id: "CUST-004",
        total_cents: 12000,
        status: OrderStatus::Processing,
        days_since_delivery: 0,
    },
    SampleOrder {
        id: "ORD-006",
        customer_id: "CUST-002",
        total_cents: 19999,
        status: OrderStatus::Delivered,
        days_since_delivery: 3,
    },
    SampleOrder {
        id: "ORD-007",
        customer_id: "CUST-005",
        total_cents: 5500,
        status: OrderStatus::Delivered,
        days_since_delivery: 2,
    },
    SampleOrder {
        id: "ORD-008",
        customer_id: "CUST-003",
        total_cents: 8999,
        status: OrderStatus::Pending,
        days_since_delivery: 0,
    },
];

/// Demo storefront data: five customers across all tiers and eight orders
/// covering every refund and shipping branch worth exercising by hand.
pub struct SampleDataset;

impl SampleDataset {
    pub fn customers() -> Vec<Customer> {
        SAMPLE_CUSTOMERS
            .iter()
            .map(|sample| Customer {
                id: CustomerId(sample.id.to_string()),
                name: sample.name.to_string(),
                tier: sample.tier,
                email: sample.email.to_string(),
            })
            .collect()
    }

    pub fn orders() -> Vec<Order> {
        SAMPLE_ORDERS
            .iter()
            .map(|sample| Order {
                id: OrderId(sample.id.to_string()),
                customer_id: CustomerId(sample.customer_id.to_string()),
                total: Decimal::new(sample.total_cents, 2),
                status: sample.status,
                days_since_delivery: sample.days_since_delivery,
            })
            .collect()
    }

    /// Insert the dataset. Rows that already exist are left untouched, so
    /// repeated loads are no-ops.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        let mut customers_inserted = 0;
        let mut orders_inserted = 0;

        for customer in Self::customers() {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO customers (id, name, tier, email) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&customer.id.0)
            .bind(&customer.name)
            .bind(customer.tier.as_str())
            .bind(&customer.email)
            .execute(&mut *tx)
            .await?;
            customers_inserted += result.rows_affected();
        }

        for order in Self::orders() {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO orders (id, customer_id, total, status, days_since_delivery)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&order.id.0)
            .bind(&order.customer_id.0)
            .bind(order.total.to_string())
            .bind(order.status.as_str())
            .bind(i64::from(order.days_since_delivery))
            .execute(&mut *tx)
            .await?;
            orders_inserted += result.rows_affected();
        }

        tx.commit().await?;

        info!(
            event_name = "db.seed.loaded",
            customers_inserted, orders_inserted, "sample dataset loaded"
        );

        Ok(SeedResult { customers_inserted, orders_inserted })
    }

    /// Check that every sample row is present with its seeded values.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for customer in SAMPLE_CUSTOMERS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE id = ?1 AND tier = ?2)",
            )
            .bind(customer.id)
            .bind(customer.tier.as_str())
            .fetch_one(pool)
            .await?;
            checks.push((customer.id, present == 1));
        }

        for order in SAMPLE_ORDERS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM orders
                 WHERE id = ?1 AND customer_id = ?2 AND total = ?3 AND status = ?4)",
            )
            .bind(order.id)
            .bind(order.customer_id)
            .bind(Decimal::new(order.total_cents, 2).to_string())
            .bind(order.status.as_str())
            .fetch_one(pool)
            .await?;
            checks.push((order.id, present == 1));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    pub customers_inserted: u64,
    pub orders_inserted: u64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl VerificationResult {
    pub fn missing(&self) -> Vec<&'static str> {
        self.checks.iter().filter(|(_, present)| !present).map(|(label, _)| *label).collect()
    }
}
