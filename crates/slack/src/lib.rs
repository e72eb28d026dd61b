//! Slack escalation channel
//!
//! Refund outcomes that need human review are posted to a Slack channel:
//! - **Client** (`client`) - `chat.postMessage` over HTTPS with the bot token
//! - **Block Kit** (`blocks`) - escalation message layout with plain-text fallback
//! - **Recording sink** (`sink`) - in-memory channel for tests and dry runs
//!
//! Both senders implement `servicedesk_core::EscalationSink`, which is what the
//! decision loop's `slack_post_message` tool talks to.

pub mod blocks;
pub mod client;
pub mod sink;

pub use client::SlackEscalationClient;
pub use sink::{RecordedMessage, RecordingEscalationSink};
