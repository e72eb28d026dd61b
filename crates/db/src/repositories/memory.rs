use std::collections::HashMap;

use tokio::sync::RwLock;

use servicedesk_core::domain::customer::{Customer, CustomerId};
use servicedesk_core::domain::order::{Order, OrderId};
use servicedesk_core::lookup::{LookupError, LookupService};

use crate::fixtures::SampleDataset;

/// Map-backed lookups for tests and database-less runs.
#[derive(Default)]
pub struct InMemoryLookupService {
    customers: RwLock<HashMap<String, Customer>>,
    orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryLookupService {
    pub fn from_records(customers: Vec<Customer>, orders: Vec<Order>) -> Self {
        Self {
            customers: RwLock::new(
                customers.into_iter().map(|customer| (customer.id.0.clone(), customer)).collect(),
            ),
            orders: RwLock::new(orders.into_iter().map(|order| (order.id.0.clone(), order)).collect()),
        }
    }

    pub fn with_sample_data() -> Self {
        Self::from_records(SampleDataset::customers(), SampleDataset::orders())
    }

    pub async fn upsert_customer(&self, customer: Customer) {
        self.customers.write().await.insert(customer.id.0.clone(), customer);
    }

    pub async fn upsert_order(&self, order: Order) {
        self.orders.write().await.insert(order.id.0.clone(), order);
    }
}

#[async_trait::async_trait]
impl LookupService for InMemoryLookupService {
    async fn find_customer(&self, id: &CustomerId) -> Result<Option<Customer>, LookupError> {
        let customers = self.customers.read().await;
        Ok(customers.get(&id.0).cloned())
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, LookupError> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id.0).cloned())
    }

    async fn orders_for_customer(&self, id: &CustomerId) -> Result<Vec<Order>, LookupError> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> =
            orders.values().filter(|order| order.customer_id == *id).cloned().collect();
        matching.sort_by(|left, right| left.id.0.cmp(&right.id.0));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use servicedesk_core::domain::customer::{Customer, CustomerId, CustomerTier};
    use servicedesk_core::domain::order::{Order, OrderId, OrderStatus};
    use servicedesk_core::lookup::LookupService;

    use super::InMemoryLookupService;

    #[tokio::test]
    async fn sample_data_matches_seeded_customers() {
        let service = InMemoryLookupService::with_sample_data();

        let bob = service
            .find_customer(&CustomerId("CUST-003".to_string()))
            .await
            .expect("lookup")
            .expect("seeded customer");
        assert_eq!(bob.tier, CustomerTier::Platinum);

        let orders =
            service.orders_for_customer(&CustomerId("CUST-001".to_string())).await.expect("lookup");
        let ids: Vec<&str> = orders.iter().map(|order| order.id.0.as_str()).collect();
        assert_eq!(ids, vec!["ORD-001", "ORD-004"]);
    }

    #[tokio::test]
    async fn upserts_replace_existing_records() {
        let service = InMemoryLookupService::default();
        let customer = Customer {
            id: CustomerId("C-1".to_string()),
            name: "Before".to_string(),
            tier: CustomerTier::Standard,
            email: "c1@example.com".to_string(),
        };
        service.upsert_customer(customer.clone()).await;
        service.upsert_customer(Customer { name: "After".to_string(), ..customer }).await;

        service
            .upsert_order(Order {
                id: OrderId("O-1".to_string()),
                customer_id: CustomerId("C-1".to_string()),
                total: Decimal::new(4200, 2),
                status: OrderStatus::Shipped,
                days_since_delivery: 0,
            })
            .await;

        let found =
            service.find_customer(&CustomerId("C-1".to_string())).await.expect("lookup");
        assert_eq!(found.map(|c| c.name), Some("After".to_string()));
        let order = service.find_order(&OrderId("O-1".to_string())).await.expect("lookup");
        assert_eq!(order.map(|o| o.total), Some(Decimal::new(4200, 2)));
    }
}
