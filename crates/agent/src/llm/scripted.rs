use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{OracleError, OracleReply, ReasoningOracle, ReasoningRequest};
use crate::transcript::Transcript;

/// Replays canned replies in order. Used by tests and offline dry runs.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Result<OracleReply, OracleError>>>,
    repeat: Option<OracleReply>,
    seen: Mutex<Vec<Transcript>>,
}

impl ScriptedOracle {
    pub fn new(replies: impl IntoIterator<Item = OracleReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().map(Ok).collect()),
            repeat: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// An oracle that never stops giving the same reply.
    pub fn repeating(reply: OracleReply) -> Self {
        Self { repeat: Some(reply), ..Self::default() }
    }

    pub fn then_fail(self, error: OracleError) -> Self {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push_back(Err(error));
        self
    }

    /// Transcripts as they were at each reasoning call.
    pub fn seen(&self) -> Vec<Transcript> {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    async fn reason(&self, request: ReasoningRequest<'_>) -> Result<OracleReply, OracleError> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.transcript.clone());

        let next = self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).pop_front();
        match (next, &self.repeat) {
            (Some(reply), _) => reply,
            (None, Some(reply)) => Ok(reply.clone()),
            (None, None) => Err(OracleError::InvalidResponse("script exhausted".to_string())),
        }
    }
}
