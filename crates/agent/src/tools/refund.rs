use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use servicedesk_core::domain::customer::CustomerTier;
use servicedesk_core::domain::order::OrderId;
use servicedesk_core::domain::refund::{RefundDecision, RefundRequest};
use servicedesk_core::rules::{refund_window_days, RefundProcessor};

use super::{money, parse_arguments, Tool, ToolEffect, ToolError, ToolOutput};

#[derive(Deserialize)]
struct RefundArgs {
    order_id: String,
    customer_tier: String,
    order_total: Decimal,
    days_since_delivery: i64,
    #[serde(default)]
    is_damaged: bool,
}

#[derive(Deserialize)]
struct TierArgs {
    customer_tier: String,
}

pub struct ProcessRefundTool {
    processor: RefundProcessor,
}

impl ProcessRefundTool {
    pub fn new(processor: RefundProcessor) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl Tool for ProcessRefundTool {
    fn name(&self) -> &'static str {
        "process_refund_request"
    }

    fn description(&self) -> &'static str {
        "Decide a refund request with the refund policy. Returns APPROVED, DENIED, or PENDING_REVIEW."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "order_id": {"type": "string", "description": "The order ID for the refund"},
                "customer_tier": {
                    "type": "string",
                    "enum": ["standard", "gold", "platinum"],
                    "description": "Customer tier"
                },
                "order_total": {"type": "number", "description": "Total order amount in dollars"},
                "days_since_delivery": {
                    "type": "integer",
                    "description": "Days since the order was delivered"
                },
                "is_damaged": {
                    "type": "boolean",
                    "description": "Whether the item arrived damaged",
                    "default": false
                }
            },
            "required": ["order_id", "customer_tier", "order_total", "days_since_delivery"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: RefundArgs = parse_arguments(arguments)?;
        let tier: CustomerTier = args.customer_tier.parse()?;
        let request = RefundRequest::new(
            OrderId(args.order_id.trim().to_string()),
            tier,
            args.order_total,
            args.days_since_delivery,
            args.is_damaged,
        )?;

        let outcome = self.processor.process(&request);

        let mut content = format!(
            "Refund Request Result:\n  Status: {}\n  Order: {}\n  Amount: {}",
            outcome.decision.as_str(),
            request.order_id(),
            money(request.order_total()),
        );
        if let RefundDecision::PendingReview { level } = outcome.decision {
            content.push_str(&format!("\n  Approval required: {level}"));
        }

        let mut output = ToolOutput::text(content);
        if let Some(approval) = outcome.pending_approval {
            output = output.with_effect(ToolEffect::ApprovalQueued(approval));
        }
        Ok(output)
    }
}

pub struct RefundWindowTool;

#[async_trait]
impl Tool for RefundWindowTool {
    fn name(&self) -> &'static str {
        "get_refund_window"
    }

    fn description(&self) -> &'static str {
        "Get the refund window in days for a customer tier."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_tier": {
                    "type": "string",
                    "enum": ["standard", "gold", "platinum"],
                    "description": "Customer tier"
                }
            },
            "required": ["customer_tier"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: TierArgs = parse_arguments(arguments)?;
        let tier: CustomerTier = args.customer_tier.parse()?;

        Ok(ToolOutput::text(format!(
            "{} tier customers have a {}-day refund window.",
            tier.as_str().to_uppercase(),
            refund_window_days(tier)
        )))
    }
}
