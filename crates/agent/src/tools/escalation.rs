use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use servicedesk_core::escalation::EscalationSink;

use super::{parse_arguments, Tool, ToolEffect, ToolError, ToolKind, ToolOutput};

#[derive(Deserialize)]
struct PostMessageArgs {
    #[serde(default)]
    channel_id: Option<String>,
    text: String,
}

/// Posts an escalation to the configured review channel.
pub struct SlackPostMessageTool {
    sink: Arc<dyn EscalationSink>,
    channel_id: String,
}

impl SlackPostMessageTool {
    pub fn new(sink: Arc<dyn EscalationSink>, channel_id: impl Into<String>) -> Self {
        Self { sink, channel_id: channel_id.into() }
    }
}

#[async_trait]
impl Tool for SlackPostMessageTool {
    fn name(&self) -> &'static str {
        "slack_post_message"
    }

    fn description(&self) -> &'static str {
        "Post a new message to a Slack channel. Use it to escalate refunds that are PENDING_REVIEW."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "channel_id": {
                    "type": "string",
                    "description": "The ID of the channel to post to; defaults to the escalation channel"
                },
                "text": {"type": "string", "description": "The message text to post"}
            },
            "required": ["text"]
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Remote
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: PostMessageArgs = parse_arguments(arguments)?;
        let channel = match args.channel_id.as_deref().map(str::trim) {
            None | Some("") => self.channel_id.as_str(),
            Some(requested) if requested == self.channel_id => self.channel_id.as_str(),
            Some(requested) => {
                return Err(ToolError::InvalidArguments(format!(
                    "escalations can only be posted to channel {}, not {requested}",
                    self.channel_id
                )))
            }
        };
        if args.text.trim().is_empty() {
            return Err(ToolError::InvalidArguments("text must not be empty".to_string()));
        }

        let receipt = self.sink.send(channel, &args.text).await?;
        let content = match &receipt.message_id {
            Some(message_id) => {
                format!("Message posted to channel {} (ts {message_id}).", receipt.destination)
            }
            None => format!("Message posted to channel {}.", receipt.destination),
        };

        Ok(ToolOutput::text(content).with_effect(ToolEffect::Escalated {
            destination: receipt.destination,
            text: args.text,
        }))
    }
}
