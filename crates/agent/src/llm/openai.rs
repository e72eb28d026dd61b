use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use servicedesk_core::config::{LlmConfig, LlmProvider};

use super::{OracleError, OracleReply, ReasoningOracle, ReasoningRequest};
use crate::transcript::{ToolCall, Turn};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Chat-completions client for OpenAI and OpenAI-compatible servers (Ollama `/v1`).
pub struct OpenAiCompatibleOracle {
    http: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
    max_retries: u32,
    initial_backoff: Duration,
}

impl OpenAiCompatibleOracle {
    pub fn from_config(config: &LlmConfig) -> Result<Self, OracleError> {
        let base_url = match (&config.provider, config.base_url.as_deref()) {
            (_, Some(url)) if !url.trim().is_empty() => url.trim().to_string(),
            (LlmProvider::OpenAi, _) => OPENAI_BASE_URL.to_string(),
            (LlmProvider::Ollama, _) => {
                return Err(OracleError::Configuration(
                    "llm.base_url is required for the ollama provider".to_string(),
                ))
            }
        };
        if config.provider == LlmProvider::OpenAi && config.api_key.is_none() {
            return Err(OracleError::Configuration(
                "llm.api_key is required for the openai provider".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    fn build_request_body(&self, request: &ReasoningRequest<'_>) -> Value {
        let messages: Vec<Value> = request.transcript.turns().iter().map(turn_to_message).collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });
        if !request.tools.is_empty() {
            body["tools"] =
                Value::Array(request.tools.iter().map(|schema| schema.to_openai_schema()).collect());
            body["tool_choice"] = json!("auto");
        }
        body
    }

    async fn post_once(&self, body: &Value) -> Result<ChatCompletion, AttemptError> {
        let mut builder = self.http.post(&self.endpoint).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(OracleError::Transport(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let error = OracleError::Api { status: status.as_u16(), message };
            return Err(if is_retryable_status(status.as_u16()) {
                AttemptError::Retryable(error)
            } else {
                AttemptError::Fatal(error)
            });
        }

        response
            .json::<ChatCompletion>()
            .await
            .map_err(|e| AttemptError::Fatal(OracleError::InvalidResponse(e.to_string())))
    }
}

#[async_trait]
impl ReasoningOracle for OpenAiCompatibleOracle {
    async fn reason(&self, request: ReasoningRequest<'_>) -> Result<OracleReply, OracleError> {
        let body = self.build_request_body(&request);
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            match self.post_once(&body).await {
                Ok(completion) => return parse_completion(completion),
                Err(AttemptError::Fatal(error)) => return Err(error),
                Err(AttemptError::Retryable(error)) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        event_name = "agent.oracle.retry",
                        attempt,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %error,
                        "oracle call failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Err(AttemptError::Retryable(error)) => return Err(error),
            }
        }
    }
}

enum AttemptError {
    Retryable(OracleError),
    Fatal(OracleError),
}

fn turn_to_message(turn: &Turn) -> Value {
    match turn {
        Turn::System { content } => json!({"role": "system", "content": content}),
        Turn::Human { content } => json!({"role": "user", "content": content}),
        Turn::OracleText { content } => json!({"role": "assistant", "content": content}),
        Turn::OracleToolCalls { calls } => json!({
            "role": "assistant",
            "content": Value::Null,
            "tool_calls": calls.iter().map(|call| json!({
                "id": call.call_id,
                "type": "function",
                "function": {
                    "name": call.name,
                    "arguments": call.arguments.to_string(),
                }
            })).collect::<Vec<_>>(),
        }),
        Turn::ToolResult { call_id, content, .. } => {
            json!({"role": "tool", "tool_call_id": call_id, "content": content})
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    /// Some compatible servers send `null` alongside a text answer.
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

fn parse_completion(completion: ChatCompletion) -> Result<OracleReply, OracleError> {
    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| OracleError::InvalidResponse("reply contained no choices".to_string()))?;

    let tool_calls = message.tool_calls.unwrap_or_default();
    if !tool_calls.is_empty() {
        let calls = tool_calls
            .into_iter()
            .map(|call| {
                let call_id = call
                    .id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple()));
                ToolCall::new(call_id, call.function.name, decode_arguments(call.function.arguments))
            })
            .collect::<Vec<_>>();
        debug!(event_name = "agent.oracle.tool_calls", count = calls.len(), "oracle requested tools");
        return Ok(OracleReply::ToolCalls(calls));
    }

    match message.content {
        Some(content) => Ok(OracleReply::Final(content)),
        None => Err(OracleError::InvalidResponse(
            "reply had neither content nor tool calls".to_string(),
        )),
    }
}

/// OpenAI sends arguments as a JSON string; Ollama sometimes sends an object.
/// Undecodable strings are passed through so the tool reports the problem.
fn decode_arguments(raw: Option<Value>) -> Value {
    match raw {
        None | Some(Value::Null) => json!({}),
        Some(Value::String(text)) if text.trim().is_empty() => json!({}),
        Some(Value::String(text)) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        Some(other) => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    use servicedesk_core::config::{LlmConfig, LlmProvider};

    use super::{decode_arguments, parse_completion, ChatCompletion, OpenAiCompatibleOracle};
    use crate::llm::{OracleError, OracleReply, ReasoningOracle, ReasoningRequest};
    use crate::tools::ToolSchema;
    use crate::transcript::{ToolCall, Transcript, Turn};

    type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    /// Replies with `failures` 503s before answering with `reply`.
    async fn spawn_stub(reply: Value, failures: usize) -> (String, Seen, Arc<AtomicUsize>) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let hits = Arc::new(AtomicUsize::new(0));
        let handler_seen = seen.clone();
        let handler_hits = hits.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let seen = handler_seen.clone();
                let hits = handler_hits.clone();
                let reply = reply.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    seen.lock().await.push((auth, body));
                    if hits.fetch_add(1, Ordering::SeqCst) < failures {
                        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": "busy"})))
                    } else {
                        (StatusCode::OK, Json(reply))
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        (format!("http://{addr}/v1"), seen, hits)
    }

    fn config(base_url: &str, max_retries: u32) -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::OpenAi,
            api_key: Some(SecretString::from("sk-test".to_string())),
            base_url: Some(base_url.to_string()),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout_secs: 5,
            max_retries,
        }
    }

    fn oracle(base_url: &str, max_retries: u32) -> OpenAiCompatibleOracle {
        OpenAiCompatibleOracle::from_config(&config(base_url, max_retries))
            .expect("oracle")
            .with_initial_backoff(Duration::from_millis(1))
    }

    fn schemas() -> Vec<ToolSchema> {
        vec![ToolSchema {
            name: "lookup_order".to_string(),
            description: "Look up an order".to_string(),
            parameters: json!({"type": "object", "properties": {"order_id": {"type": "string"}}}),
        }]
    }

    #[tokio::test]
    async fn transcript_is_sent_as_chat_messages() {
        let (base_url, seen, _hits) =
            spawn_stub(json!({"choices": [{"message": {"role": "assistant", "content": "Done."}}]}), 0)
                .await;
        let mut transcript = Transcript::new("policy", "[Customer ID: CUST-001] refund ORD-001");
        transcript.push(Turn::OracleToolCalls {
            calls: vec![ToolCall::new("call_1", "lookup_order", json!({"order_id": "ORD-001"}))],
        });
        transcript.push(Turn::ToolResult {
            call_id: "call_1".to_string(),
            name: "lookup_order".to_string(),
            content: "Order Details: ...".to_string(),
            is_error: false,
        });
        let tools = schemas();

        let reply = oracle(&base_url, 0)
            .reason(ReasoningRequest { transcript: &transcript, tools: &tools })
            .await
            .expect("reason");

        assert_eq!(reply, OracleReply::Final("Done.".to_string()));
        let seen = seen.lock().await;
        let (auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
        assert_eq!(body["model"], json!("gpt-4o-mini"));
        assert_eq!(body["tool_choice"], json!("auto"));
        assert_eq!(body["tools"][0]["function"]["name"], json!("lookup_order"));

        let roles: Vec<&str> =
            body["messages"].as_array().expect("messages").iter().filter_map(|m| m["role"].as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool"]);
        assert_eq!(body["messages"][2]["tool_calls"][0]["function"]["arguments"], json!(r#"{"order_id":"ORD-001"}"#));
        assert_eq!(body["messages"][3]["tool_call_id"], json!("call_1"));
    }

    #[tokio::test]
    async fn tool_calls_are_decoded() {
        let reply = json!({"choices": [{"message": {"role": "assistant", "content": null, "tool_calls": [
            {"id": "call_a", "type": "function", "function": {"name": "lookup_order", "arguments": "{\"order_id\":\"ORD-002\"}"}},
            {"type": "function", "function": {"name": "get_refund_window", "arguments": {"customer_tier": "gold"}}}
        ]}}]});
        let (base_url, _seen, _hits) = spawn_stub(reply, 0).await;
        let transcript = Transcript::new("policy", "hi");

        let reply = oracle(&base_url, 0)
            .reason(ReasoningRequest { transcript: &transcript, tools: &[] })
            .await
            .expect("reason");

        let OracleReply::ToolCalls(calls) = reply else { panic!("expected tool calls") };
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].call_id, "call_a");
        assert_eq!(calls[0].arguments, json!({"order_id": "ORD-002"}));
        assert!(calls[1].call_id.starts_with("call_"));
        assert_eq!(calls[1].arguments, json!({"customer_tier": "gold"}));
    }

    #[test]
    fn null_tool_calls_with_text_is_a_final_answer() {
        let completion: ChatCompletion = serde_json::from_value(json!({"choices": [
            {"message": {"role": "assistant", "content": "Hello", "tool_calls": null}}
        ]}))
        .expect("null tool_calls should decode");

        let reply = parse_completion(completion).expect("parse");

        assert_eq!(reply, OracleReply::Final("Hello".to_string()));
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let (base_url, _seen, hits) =
            spawn_stub(json!({"choices": [{"message": {"content": "ok"}}]}), 2).await;
        let transcript = Transcript::new("policy", "hi");

        let reply = oracle(&base_url, 2)
            .reason(ReasoningRequest { transcript: &transcript, tools: &[] })
            .await
            .expect("reason");

        assert_eq!(reply, OracleReply::Final("ok".to_string()));
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let (base_url, _seen, hits) =
            spawn_stub(json!({"choices": [{"message": {"content": "ok"}}]}), 10).await;
        let transcript = Transcript::new("policy", "hi");

        let result = oracle(&base_url, 1)
            .reason(ReasoningRequest { transcript: &transcript, tools: &[] })
            .await;

        assert!(matches!(result, Err(OracleError::Api { status: 503, .. })));
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let (base_url, _seen, _hits) = spawn_stub(json!({"choices": []}), 0).await;
        let transcript = Transcript::new("policy", "hi");

        let result = oracle(&base_url, 0)
            .reason(ReasoningRequest { transcript: &transcript, tools: &[] })
            .await;

        assert!(matches!(result, Err(OracleError::InvalidResponse(_))));
    }

    #[test]
    fn openai_requires_api_key() {
        let mut config = config("http://localhost:1/v1", 0);
        config.api_key = None;

        assert!(matches!(
            OpenAiCompatibleOracle::from_config(&config),
            Err(OracleError::Configuration(_))
        ));
    }

    #[test]
    fn undecodable_arguments_pass_through() {
        assert_eq!(decode_arguments(None), json!({}));
        assert_eq!(decode_arguments(Some(json!(""))), json!({}));
        assert_eq!(decode_arguments(Some(json!("{oops"))), json!("{oops"));
    }
}
