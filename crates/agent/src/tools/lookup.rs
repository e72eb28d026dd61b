use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use servicedesk_core::domain::customer::CustomerId;
use servicedesk_core::domain::order::OrderId;
use servicedesk_core::lookup::LookupService;

use super::{money, parse_arguments, Tool, ToolError, ToolOutput};

#[derive(Deserialize)]
struct OrderArgs {
    order_id: String,
}

#[derive(Deserialize)]
struct CustomerArgs {
    customer_id: String,
}

pub struct LookupOrderTool {
    lookup: Arc<dyn LookupService>,
}

impl LookupOrderTool {
    pub fn new(lookup: Arc<dyn LookupService>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl Tool for LookupOrderTool {
    fn name(&self) -> &'static str {
        "lookup_order"
    }

    fn description(&self) -> &'static str {
        "Look up order details by order ID (e.g. \"ORD-001\"): customer, amount, status and days since delivery."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "order_id": {"type": "string", "description": "The order ID to look up"}
            },
            "required": ["order_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: OrderArgs = parse_arguments(arguments)?;
        let order_id = OrderId(args.order_id.trim().to_string());
        let not_found = || ToolOutput::text(format!("Order {order_id} not found in system."));

        let Some(order) = self.lookup.find_order(&order_id).await? else {
            return Ok(not_found());
        };
        let Some(customer) = self.lookup.find_customer(&order.customer_id).await? else {
            return Ok(not_found());
        };

        Ok(ToolOutput::text(format!(
            "Order Details:\nID: {}\nCustomer: {} ({})\nAmount: {}\nStatus: {}\nDays since delivery: {}",
            order.id,
            customer.name,
            customer.id,
            money(order.total),
            order.status,
            order.days_since_delivery,
        )))
    }
}

pub struct CustomerOrdersTool {
    lookup: Arc<dyn LookupService>,
}

impl CustomerOrdersTool {
    pub fn new(lookup: Arc<dyn LookupService>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl Tool for CustomerOrdersTool {
    fn name(&self) -> &'static str {
        "get_customer_orders"
    }

    fn description(&self) -> &'static str {
        "Get all orders for a customer (e.g. \"CUST-001\")."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": {"type": "string", "description": "The customer ID"}
            },
            "required": ["customer_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: CustomerArgs = parse_arguments(arguments)?;
        let customer_id = CustomerId(args.customer_id.trim().to_string());
        let orders = self.lookup.orders_for_customer(&customer_id).await?;

        if orders.is_empty() {
            return Ok(ToolOutput::text(format!("No orders found for customer {customer_id}.")));
        }

        let lines: Vec<String> = orders
            .iter()
            .map(|order| {
                format!(
                    "- {}: {}, Status: {}, Delivered {} days ago",
                    order.id,
                    money(order.total),
                    order.status,
                    order.days_since_delivery
                )
            })
            .collect();

        Ok(ToolOutput::text(format!("Orders for customer {customer_id}:\n{}", lines.join("\n"))))
    }
}

pub struct LookupCustomerTool {
    lookup: Arc<dyn LookupService>,
}

impl LookupCustomerTool {
    pub fn new(lookup: Arc<dyn LookupService>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl Tool for LookupCustomerTool {
    fn name(&self) -> &'static str {
        "lookup_customer"
    }

    fn description(&self) -> &'static str {
        "Look up customer details (name, tier, email) by customer ID."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_id": {"type": "string", "description": "The customer ID to look up"}
            },
            "required": ["customer_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: CustomerArgs = parse_arguments(arguments)?;
        let customer_id = CustomerId(args.customer_id.trim().to_string());

        let Some(customer) = self.lookup.find_customer(&customer_id).await? else {
            return Ok(ToolOutput::text(format!("Customer {customer_id} not found in system.")));
        };

        Ok(ToolOutput::text(format!(
            "Customer Details:\nID: {}\nName: {}\nTier: {}\nEmail: {}",
            customer.id,
            customer.name,
            customer.tier.as_str().to_uppercase(),
            customer.email,
        )))
    }
}
