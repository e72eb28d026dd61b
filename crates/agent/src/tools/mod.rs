use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use servicedesk_core::approvals::ApprovalSink;
use servicedesk_core::domain::approval::PendingApproval;
use servicedesk_core::errors::DomainError;
use servicedesk_core::escalation::EscalationError;
use servicedesk_core::lookup::{LookupError, LookupService};
use servicedesk_core::rules::refund::RefundProcessor;

pub mod escalation;
pub mod lookup;
pub mod refund;
pub mod shipping;

pub use escalation::SlackPostMessageTool;
pub use lookup::{CustomerOrdersTool, LookupCustomerTool, LookupOrderTool};
pub use refund::{ProcessRefundTool, RefundWindowTool};
pub use shipping::{CanCancelOrderTool, CanModifyOrderTool, DeliveryEstimateTool, ShippingCostTool};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Rules or lookup backed; no external I/O.
    Local,
    /// Escalation backed; may block on the network and fail transiently.
    Remote,
}

/// What the oracle sees for one tool.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSchema {
    pub fn to_openai_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Observable side effects the loop tracks beyond the result text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolEffect {
    ApprovalQueued(PendingApproval),
    Escalated { destination: String, text: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub effects: Vec<ToolEffect>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), effects: Vec::new() }
    }

    pub fn with_effect(mut self, effect: ToolEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Escalation(#[from] EscalationError),
    #[error("tool timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("tool `{0}` is already registered")]
    DuplicateName(String),
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> Value;

    fn kind(&self) -> ToolKind {
        ToolKind::Local
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError>;

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.input_schema(),
        }
    }
}

/// `$12.50` style amount with two decimals.
pub(crate) fn money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Decode oracle-supplied arguments into a typed struct.
pub(crate) fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Name-keyed tools, kept in registration order for schema publication.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T) -> Result<(), ToolError>
    where
        T: Tool + 'static,
    {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateName(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Add discovered remote tools after construction.
    pub fn extend_remote<I>(&mut self, tools: I) -> Result<(), ToolError>
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        for tool in tools {
            self.register_arc(tool)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).and_then(|position| self.tools.get(*position)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|tool| tool.schema()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn has_remote(&self) -> bool {
        self.tools.iter().any(|tool| tool.kind() == ToolKind::Remote)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// The rules and lookup tools, in catalogue order. Escalation is added by the
/// caller because it needs a configured destination.
pub fn local_registry(
    lookup: Arc<dyn LookupService>,
    approvals: Arc<dyn ApprovalSink>,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::default();
    registry.register(LookupOrderTool::new(lookup.clone()))?;
    registry.register(CustomerOrdersTool::new(lookup.clone()))?;
    registry.register(LookupCustomerTool::new(lookup))?;
    registry.register(ProcessRefundTool::new(RefundProcessor::new(approvals)))?;
    registry.register(RefundWindowTool)?;
    registry.register(ShippingCostTool)?;
    registry.register(CanCancelOrderTool)?;
    registry.register(CanModifyOrderTool)?;
    registry.register(DeliveryEstimateTool)?;
    Ok(registry)
}
