use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use servicedesk_agent::{DecisionLoop, DecisionRequest};
use servicedesk_core::errors::InterfaceError;

#[derive(Clone)]
pub struct MessagesState {
    decision_loop: Arc<DecisionLoop>,
}

pub fn router(decision_loop: Arc<DecisionLoop>) -> Router {
    Router::new()
        .route("/v1/messages", post(handle_message))
        .with_state(MessagesState { decision_loop })
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    correlation_id: String,
}

/// Caller-facing error; the internal message stays in the logs.
struct ApiError(InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        };
        let body = ErrorBody {
            error: self.0.user_message(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub async fn handle_message(
    State(state): State<MessagesState>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let correlation_id = Uuid::new_v4().to_string();
            warn!(
                event_name = "server.messages.rejected",
                correlation_id = %correlation_id,
                error = %rejection.body_text(),
                "inbound message rejected"
            );
            return ApiError(InterfaceError::BadRequest {
                message: rejection.body_text(),
                correlation_id,
            })
            .into_response();
        }
    };

    info!(
        event_name = "server.messages.received",
        has_customer_id = request.context.customer_id.is_some(),
        history_len = request.history.len(),
        "inbound message accepted"
    );
    let outcome = state.decision_loop.run(request).await;
    (StatusCode::OK, Json(outcome)).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use servicedesk_agent::tools::{local_registry, SlackPostMessageTool};
    use servicedesk_agent::{DecisionLoop, LoopSettings, OracleReply, ScriptedOracle, ToolCall};
    use servicedesk_core::approvals::InMemoryApprovalLog;
    use servicedesk_db::InMemoryLookupService;
    use servicedesk_slack::RecordingEscalationSink;

    use super::router;

    fn decision_loop(oracle: ScriptedOracle) -> Arc<DecisionLoop> {
        let mut registry = local_registry(
            Arc::new(InMemoryLookupService::with_sample_data()),
            Arc::new(InMemoryApprovalLog::default()),
        )
        .expect("registry");
        registry
            .register(SlackPostMessageTool::new(Arc::new(RecordingEscalationSink::default()), "C0ESCALATE"))
            .expect("escalation tool");
        let settings = LoopSettings {
            escalation_channel_id: "C0ESCALATE".to_string(),
            tool_timeout: Duration::from_secs(5),
            enforce_escalation: true,
        };
        Arc::new(DecisionLoop::new(registry, Arc::new(oracle), settings).expect("loop"))
    }

    async fn post(app: axum::Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/messages")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn message_runs_through_decision_loop() {
        let oracle = ScriptedOracle::new([
            OracleReply::ToolCalls(vec![ToolCall::new(
                "call_1",
                "check_can_cancel_order",
                json!({"order_status": "processing"}),
            )]),
            OracleReply::Final("Yes, ORD-005 can still be cancelled.".to_string()),
        ]);
        let app = router(decision_loop(oracle));

        let (status, body) = post(
            app,
            r#"{"message":"Can I cancel ORD-005?","context":{"customer_id":"CUST-004"},"history":[]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Yes, ORD-005 can still be cancelled.");
        assert_eq!(body["status"], "done");
        assert_eq!(body["tool_calls"], json!(["check_can_cancel_order"]));
        assert_eq!(body["pending_approvals"], json!([]));
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request_with_correlation_id() {
        let app = router(decision_loop(ScriptedOracle::default()));

        let (status, body) = post(app, "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "The request could not be processed. Check inputs and try again.");
        assert!(body["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn missing_message_gets_the_prompt_for_details() {
        let app = router(decision_loop(ScriptedOracle::default()));

        let (status, body) = post(app, r#"{"context":{"customer_id":"CUST-001"}}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["response"],
            "I need a message to help you. Could you please provide more details?"
        );
    }
}
