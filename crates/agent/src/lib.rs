//! Servicedesk agent: the tool-mediated decision loop.
//!
//! A [`runtime::DecisionLoop`] takes one customer message, asks a
//! [`llm::ReasoningOracle`] what to do, dispatches the requested
//! [`tools::Tool`]s, and folds their results back into a
//! [`transcript::Transcript`] until the oracle answers or the iteration budget
//! runs out.
//!
//! The oracle never decides refund or shipping outcomes. Those come from the
//! rule engine in `servicedesk-core`, reached only through tools.

pub mod guardrails;
pub mod llm;
pub mod prompt;
pub mod runtime;
pub mod tools;
pub mod transcript;

pub use guardrails::{EscalationGuard, GuardrailDecision};
pub use llm::{
    OpenAiCompatibleOracle, OracleError, OracleReply, ReasoningOracle, ReasoningRequest,
    ScriptedOracle,
};
pub use prompt::{PromptError, SystemPolicy};
pub use runtime::{
    DecisionContext, DecisionLoop, DecisionOutcome, DecisionRequest, LoopConfigError,
    LoopSettings, LoopStatus, MAX_ITERATIONS,
};
pub use tools::{local_registry, Tool, ToolError, ToolKind, ToolRegistry, ToolSchema};
pub use transcript::{ToolCall, Transcript, Turn};
