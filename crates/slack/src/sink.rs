use async_trait::async_trait;
use tokio::sync::Mutex;

use servicedesk_core::escalation::{EscalationError, EscalationReceipt, EscalationSink};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedMessage {
    pub destination: String,
    pub text: String,
}

/// Keeps escalations in memory instead of posting them.
#[derive(Debug, Default)]
pub struct RecordingEscalationSink {
    messages: Mutex<Vec<RecordedMessage>>,
    reject_with: Option<String>,
}

impl RecordingEscalationSink {
    /// A sink whose every send is rejected with `reason`, for failure-path tests.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self { messages: Mutex::new(Vec::new()), reject_with: Some(reason.into()) }
    }

    pub async fn messages(&self) -> Vec<RecordedMessage> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl EscalationSink for RecordingEscalationSink {
    async fn send(
        &self,
        destination: &str,
        text: &str,
    ) -> Result<EscalationReceipt, EscalationError> {
        if destination.trim().is_empty() {
            return Err(EscalationError::MissingDestination);
        }
        if let Some(reason) = &self.reject_with {
            return Err(EscalationError::Rejected(reason.clone()));
        }

        let mut messages = self.messages.lock().await;
        messages.push(RecordedMessage { destination: destination.to_string(), text: text.to_string() });
        Ok(EscalationReceipt {
            destination: destination.to_string(),
            message_id: Some(format!("recorded-{}", messages.len())),
        })
    }
}
