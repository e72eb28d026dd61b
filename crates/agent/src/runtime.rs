use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use servicedesk_core::config::AppConfig;
use servicedesk_core::domain::approval::PendingApproval;

use crate::guardrails::{EscalationGuard, GuardrailDecision};
use crate::llm::{OracleReply, ReasoningOracle, ReasoningRequest};
use crate::prompt::{PromptError, SystemPolicy};
use crate::tools::{ToolEffect, ToolError, ToolRegistry, ToolSchema};
use crate::transcript::{human_turn, ToolCall, Transcript, Turn};

pub const MAX_ITERATIONS: usize = 10;
pub const ESCALATION_TOOL: &str = "slack_post_message";

pub const TIMEOUT_RESPONSE: &str =
    "I apologize, but I took too long to process your request. Please try again.";
pub const FAILED_RESPONSE: &str =
    "I apologize, but I'm experiencing technical difficulties. Please try again shortly.";
pub const EMPTY_MESSAGE_RESPONSE: &str =
    "I need a message to help you. Could you please provide more details?";

#[derive(Debug, Error)]
pub enum LoopConfigError {
    #[error("escalation channel id is not configured")]
    MissingDestination,
    #[error("escalation is enforced but no `slack_post_message` tool is registered")]
    MissingEscalationTool,
    #[error("tool timeout must be greater than zero")]
    InvalidToolTimeout,
    #[error(transparent)]
    Policy(#[from] PromptError),
}

#[derive(Clone, Debug)]
pub struct LoopSettings {
    pub escalation_channel_id: String,
    pub tool_timeout: Duration,
    pub enforce_escalation: bool,
}

impl LoopSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            escalation_channel_id: config.slack.escalation_channel_id.clone(),
            tool_timeout: Duration::from_secs(config.agent.tool_timeout_secs),
            enforce_escalation: config.agent.enforce_escalation,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub context: DecisionContext,
    /// Accepted for wire compatibility; prior turns are not replayed.
    #[serde(default)]
    pub history: Vec<Value>,
}

impl DecisionRequest {
    pub fn new(message: impl Into<String>, customer_id: Option<&str>) -> Self {
        Self {
            message: message.into(),
            context: DecisionContext {
                customer_id: customer_id.map(str::to_string),
                extra: Map::new(),
            },
            history: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    Done,
    Timeout,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub response: String,
    /// Every dispatched tool name, in request order, duplicates included.
    pub tool_calls: Vec<String>,
    pub status: LoopStatus,
    pub pending_approvals: Vec<PendingApproval>,
}

struct DispatchResult {
    content: String,
    is_error: bool,
    effects: Vec<ToolEffect>,
}

impl DispatchResult {
    fn failure(content: String) -> Self {
        Self { content, is_error: true, effects: Vec::new() }
    }
}

/// Bounded reason/dispatch loop for one inbound message.
pub struct DecisionLoop {
    registry: Arc<ToolRegistry>,
    schemas: Vec<ToolSchema>,
    oracle: Arc<dyn ReasoningOracle>,
    system_policy: String,
    settings: LoopSettings,
}

impl DecisionLoop {
    pub fn new(
        registry: ToolRegistry,
        oracle: Arc<dyn ReasoningOracle>,
        settings: LoopSettings,
    ) -> Result<Self, LoopConfigError> {
        if settings.escalation_channel_id.trim().is_empty() {
            return Err(LoopConfigError::MissingDestination);
        }
        if settings.tool_timeout.is_zero() {
            return Err(LoopConfigError::InvalidToolTimeout);
        }
        if settings.enforce_escalation && !registry.contains(ESCALATION_TOOL) {
            return Err(LoopConfigError::MissingEscalationTool);
        }

        let system_policy = SystemPolicy::new()?.render(&settings.escalation_channel_id)?;
        let schemas = registry.schemas();

        Ok(Self { registry: Arc::new(registry), schemas, oracle, system_policy, settings })
    }

    pub fn system_policy(&self) -> &str {
        &self.system_policy
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    pub async fn run(&self, request: DecisionRequest) -> DecisionOutcome {
        if request.message.trim().is_empty() {
            return DecisionOutcome {
                response: EMPTY_MESSAGE_RESPONSE.to_string(),
                tool_calls: Vec::new(),
                status: LoopStatus::Done,
                pending_approvals: Vec::new(),
            };
        }

        let correlation_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("decision_loop", correlation_id = %correlation_id);
        self.run_inner(request, &correlation_id).instrument(span).await
    }

    async fn run_inner(&self, request: DecisionRequest, correlation_id: &str) -> DecisionOutcome {
        let mut transcript = Transcript::new(
            self.system_policy.clone(),
            human_turn(&request.message, request.context.customer_id.as_deref()),
        );
        let mut guard =
            EscalationGuard::new(self.settings.enforce_escalation, &self.settings.escalation_channel_id);
        let mut audit = Vec::new();
        let mut pending_approvals = Vec::new();

        for iteration in 1..=MAX_ITERATIONS {
            info!(
                event_name = "agent.loop.iteration",
                correlation_id,
                iteration,
                transcript_len = transcript.len(),
                "reasoning step"
            );

            let reply = match self
                .oracle
                .reason(ReasoningRequest { transcript: &transcript, tools: &self.schemas })
                .await
            {
                Ok(reply) => reply,
                Err(oracle_error) => {
                    error!(
                        event_name = "agent.oracle.failed",
                        correlation_id,
                        iteration,
                        error = %oracle_error,
                        "oracle call failed"
                    );
                    return DecisionOutcome {
                        response: FAILED_RESPONSE.to_string(),
                        tool_calls: audit,
                        status: LoopStatus::Failed,
                        pending_approvals,
                    };
                }
            };

            match reply {
                OracleReply::Final(text) => match guard.evaluate_final_answer() {
                    GuardrailDecision::Allow => {
                        info!(
                            event_name = "agent.loop.done",
                            correlation_id,
                            iteration,
                            tool_calls = audit.len(),
                            "final answer accepted"
                        );
                        return DecisionOutcome {
                            response: text,
                            tool_calls: audit,
                            status: LoopStatus::Done,
                            pending_approvals,
                        };
                    }
                    GuardrailDecision::Deny { reason_code, reminder } => {
                        warn!(
                            event_name = "agent.guard.final_refused",
                            correlation_id,
                            iteration,
                            reason_code,
                            outstanding = guard.unescalated().len(),
                            "final answer refused"
                        );
                        transcript.push(Turn::OracleText { content: text });
                        transcript.push(Turn::System { content: reminder });
                    }
                },
                OracleReply::ToolCalls(calls) => {
                    audit.extend(calls.iter().map(|call| call.name.clone()));
                    let results =
                        join_all(calls.iter().map(|call| self.dispatch(call, correlation_id))).await;

                    transcript.push(Turn::OracleToolCalls { calls: calls.clone() });
                    for (call, result) in calls.into_iter().zip(results) {
                        for effect in &result.effects {
                            guard.observe(effect);
                            if let ToolEffect::ApprovalQueued(approval) = effect {
                                pending_approvals.push(approval.clone());
                            }
                        }
                        transcript.push(Turn::ToolResult {
                            call_id: call.call_id,
                            name: call.name,
                            content: result.content,
                            is_error: result.is_error,
                        });
                    }
                }
            }
        }

        warn!(
            event_name = "agent.loop.timeout",
            correlation_id,
            max_iterations = MAX_ITERATIONS,
            tool_calls = audit.len(),
            "iteration budget exhausted"
        );
        DecisionOutcome {
            response: TIMEOUT_RESPONSE.to_string(),
            tool_calls: audit,
            status: LoopStatus::Timeout,
            pending_approvals,
        }
    }

    async fn dispatch(&self, call: &ToolCall, correlation_id: &str) -> DispatchResult {
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(
                event_name = "agent.tool.unknown",
                correlation_id,
                tool = %call.name,
                call_id = %call.call_id,
                "oracle requested an unregistered tool"
            );
            return DispatchResult::failure(format!("Tool {} not found", call.name));
        };

        info!(
            event_name = "agent.tool.dispatched",
            correlation_id,
            tool = %call.name,
            call_id = %call.call_id,
            kind = ?tool.kind(),
            "dispatching tool"
        );

        let outcome =
            tokio::time::timeout(self.settings.tool_timeout, tool.execute(call.arguments.clone()))
                .await
                .unwrap_or(Err(ToolError::Timeout { secs: self.settings.tool_timeout.as_secs() }));

        match outcome {
            Ok(output) => DispatchResult { content: output.content, is_error: false, effects: output.effects },
            Err(tool_error) => {
                warn!(
                    event_name = "agent.tool.failed",
                    correlation_id,
                    tool = %call.name,
                    call_id = %call.call_id,
                    error = %tool_error,
                    "tool call failed"
                );
                DispatchResult::failure(format!("Error calling tool: {tool_error}"))
            }
        }
    }
}
