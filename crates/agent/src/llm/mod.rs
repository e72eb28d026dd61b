use async_trait::async_trait;
use thiserror::Error;

use crate::tools::ToolSchema;
use crate::transcript::{ToolCall, Transcript};

pub mod openai;
pub mod scripted;

pub use openai::OpenAiCompatibleOracle;
pub use scripted::ScriptedOracle;

#[derive(Clone, Copy, Debug)]
pub struct ReasoningRequest<'a> {
    pub transcript: &'a Transcript,
    pub tools: &'a [ToolSchema],
}

#[derive(Clone, Debug, PartialEq)]
pub enum OracleReply {
    Final(String),
    ToolCalls(Vec<ToolCall>),
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport failed: {0}")]
    Transport(String),
    #[error("oracle API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("oracle reply was malformed: {0}")]
    InvalidResponse(String),
    #[error("oracle is misconfigured: {0}")]
    Configuration(String),
}

/// The reasoning step of the decision loop: answer, or ask for tools.
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    async fn reason(&self, request: ReasoningRequest<'_>) -> Result<OracleReply, OracleError>;
}
