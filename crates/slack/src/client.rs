use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use servicedesk_core::config::SlackConfig;
use servicedesk_core::escalation::{EscalationError, EscalationReceipt, EscalationSink};

use crate::blocks::{escalation_message, Block};

#[derive(Debug, Serialize)]
struct PostMessagePayload<'a> {
    channel: &'a str,
    text: &'a str,
    blocks: &'a [Block],
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Posts escalations with `chat.postMessage`.
pub struct SlackEscalationClient {
    http: reqwest::Client,
    api_base_url: String,
    bot_token: SecretString,
}

impl SlackEscalationClient {
    pub fn new(
        api_base_url: impl Into<String>,
        bot_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, EscalationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EscalationError::Transport(format!("http client setup failed: {e}")))?;
        let api_base_url = api_base_url.into().trim_end_matches('/').to_string();

        Ok(Self { http, api_base_url, bot_token })
    }

    pub fn from_config(config: &SlackConfig) -> Result<Self, EscalationError> {
        Self::new(
            config.api_base_url.clone(),
            config.bot_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat.postMessage", self.api_base_url)
    }
}

#[async_trait]
impl EscalationSink for SlackEscalationClient {
    async fn send(
        &self,
        destination: &str,
        text: &str,
    ) -> Result<EscalationReceipt, EscalationError> {
        if destination.trim().is_empty() {
            return Err(EscalationError::MissingDestination);
        }

        let message = escalation_message(text);
        let payload = PostMessagePayload {
            channel: destination,
            text: &message.fallback_text,
            blocks: &message.blocks,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.bot_token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| EscalationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "slack.escalation.http_failed",
                channel = %destination,
                status = status.as_u16(),
                "slack returned non-success status"
            );
            return Err(EscalationError::Transport(format!("slack returned HTTP {status}")));
        }

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| EscalationError::Transport(format!("unreadable slack response: {e}")))?;

        let receipt = interpret_response(destination, body)?;
        info!(
            event_name = "slack.escalation.posted",
            channel = %destination,
            message_id = ?receipt.message_id,
            "escalation posted"
        );
        Ok(receipt)
    }
}

fn interpret_response(
    destination: &str,
    body: PostMessageResponse,
) -> Result<EscalationReceipt, EscalationError> {
    if !body.ok {
        let reason = body.error.unwrap_or_else(|| "unknown_error".to_string());
        warn!(
            event_name = "slack.escalation.rejected",
            channel = %destination,
            reason = %reason,
            "slack rejected escalation"
        );
        return Err(EscalationError::Rejected(reason));
    }

    Ok(EscalationReceipt { destination: destination.to_string(), message_id: body.ts })
}
