use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use servicedesk_core::domain::customer::CustomerTier;
use servicedesk_core::domain::order::{OrderStatus, ShippingSpeed};
use servicedesk_core::rules::{can_cancel, can_modify, delivery_estimate, shipping_cost};

use super::{money, parse_arguments, Tool, ToolError, ToolOutput};

#[derive(Deserialize)]
struct ShippingCostArgs {
    order_total: Decimal,
    shipping_speed: String,
    #[serde(default)]
    customer_tier: Option<String>,
}

#[derive(Deserialize)]
struct StatusArgs {
    order_status: String,
}

#[derive(Deserialize)]
struct SpeedArgs {
    shipping_speed: String,
}

fn speed_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["standard", "expedited", "express"],
        "description": "Shipping speed"
    })
}

fn status_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "order_status": {
                "type": "string",
                "enum": ["pending", "processing", "shipped", "delivered", "cancelled"],
                "description": "Current order status"
            }
        },
        "required": ["order_status"]
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct ShippingCostTool;

#[async_trait]
impl Tool for ShippingCostTool {
    fn name(&self) -> &'static str {
        "calculate_shipping_cost"
    }

    fn description(&self) -> &'static str {
        "Calculate the shipping cost for an order total, shipping speed and customer tier."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "order_total": {"type": "number", "description": "Order amount before shipping"},
                "shipping_speed": speed_schema(),
                "customer_tier": {
                    "type": "string",
                    "enum": ["standard", "gold", "platinum"],
                    "description": "Customer tier",
                    "default": "standard"
                }
            },
            "required": ["order_total", "shipping_speed"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: ShippingCostArgs = parse_arguments(arguments)?;
        let speed: ShippingSpeed = args.shipping_speed.parse()?;
        let tier = match args.customer_tier.as_deref() {
            Some(tier) => tier.parse()?,
            None => CustomerTier::Standard,
        };

        let cost = shipping_cost(args.order_total, speed, tier)?;
        let content = if cost.is_zero() {
            format!("Free {speed} shipping for this order.")
        } else {
            format!("{} shipping costs {}", capitalize(speed.as_str()), money(cost))
        };
        Ok(ToolOutput::text(content))
    }
}

pub struct CanCancelOrderTool;

#[async_trait]
impl Tool for CanCancelOrderTool {
    fn name(&self) -> &'static str {
        "check_can_cancel_order"
    }

    fn description(&self) -> &'static str {
        "Check whether an order in the given status can be cancelled."
    }

    fn input_schema(&self) -> Value {
        status_schema()
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: StatusArgs = parse_arguments(arguments)?;
        let status: OrderStatus = args.order_status.parse()?;
        Ok(ToolOutput::text(format!("Order can be cancelled: {}", can_cancel(status))))
    }
}

pub struct CanModifyOrderTool;

#[async_trait]
impl Tool for CanModifyOrderTool {
    fn name(&self) -> &'static str {
        "check_can_modify_order"
    }

    fn description(&self) -> &'static str {
        "Check whether an order in the given status can be modified."
    }

    fn input_schema(&self) -> Value {
        status_schema()
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: StatusArgs = parse_arguments(arguments)?;
        let status: OrderStatus = args.order_status.parse()?;
        Ok(ToolOutput::text(format!("Order can be modified: {}", can_modify(status))))
    }
}

pub struct DeliveryEstimateTool;

#[async_trait]
impl Tool for DeliveryEstimateTool {
    fn name(&self) -> &'static str {
        "get_delivery_estimate"
    }

    fn description(&self) -> &'static str {
        "Get the estimated delivery time for a shipping speed. Always use this instead of guessing."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"shipping_speed": speed_schema()},
            "required": ["shipping_speed"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: SpeedArgs = parse_arguments(arguments)?;
        let speed: ShippingSpeed = args.shipping_speed.parse()?;
        Ok(ToolOutput::text(format!(
            "Estimated delivery time for {speed}: {}",
            delivery_estimate(speed)
        )))
    }
}
