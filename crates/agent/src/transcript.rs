use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool invocation requested by the oracle. Consumed exactly once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub name: String,
    #[serde(default = "empty_arguments")]
    pub arguments: Value,
}

fn empty_arguments() -> Value {
    Value::Object(serde_json::Map::new())
}

impl ToolCall {
    pub fn new(call_id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self { call_id: call_id.into(), name: name.into(), arguments }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    System { content: String },
    Human { content: String },
    OracleText { content: String },
    OracleToolCalls { calls: Vec<ToolCall> },
    ToolResult { call_id: String, name: String, content: String, is_error: bool },
}

/// Ordered record of one decision. Append-only; dropped when the loop returns.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new(system_policy: impl Into<String>, human_turn: impl Into<String>) -> Self {
        Self {
            turns: vec![
                Turn::System { content: system_policy.into() },
                Turn::Human { content: human_turn.into() },
            ],
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn tool_results(&self) -> impl Iterator<Item = (&str, &str, bool)> {
        self.turns.iter().filter_map(|turn| match turn {
            Turn::ToolResult { name, content, is_error, .. } => {
                Some((name.as_str(), content.as_str(), *is_error))
            }
            _ => None,
        })
    }
}

/// `[Customer ID: {id}] {message}` when an id is known, otherwise the message.
pub fn human_turn(message: &str, customer_id: Option<&str>) -> String {
    match customer_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("[Customer ID: {id}] {message}"),
        None => message.to_string(),
    }
}
