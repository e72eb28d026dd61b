use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EscalationError {
    #[error("escalation transport failed: {0}")]
    Transport(String),
    #[error("escalation rejected by channel: {0}")]
    Rejected(String),
    #[error("escalation destination is empty")]
    MissingDestination,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationReceipt {
    pub destination: String,
    /// Channel-assigned message id, when the channel reports one.
    pub message_id: Option<String>,
}

/// Human-reviewed channel. Sends are fire-and-forget from the loop's view:
/// a failure is reported back to the oracle, never raised to the caller.
#[async_trait]
pub trait EscalationSink: Send + Sync {
    async fn send(&self, destination: &str, text: &str)
        -> Result<EscalationReceipt, EscalationError>;
}
