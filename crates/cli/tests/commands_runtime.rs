use std::env;
use std::sync::{Arc, Mutex, OnceLock};

use serde_json::{json, Value};
use tempfile::TempDir;

use servicedesk_agent::{OracleReply, ReasoningOracle, ScriptedOracle, ToolCall};
use servicedesk_cli::commands::ask::{self, AskInput};
use servicedesk_cli::commands::{doctor, migrate, seed};
use servicedesk_core::config::LoadOptions;

const SLACK_ENV: [(&str, &str); 3] = [
    ("SLACK_BOT_TOKEN", "xoxb-test"),
    ("SLACK_TEAM_ID", "T0001"),
    ("SLACK_ESCALATION_CHANNEL_ID", "C0ESCALATE"),
];

fn file_database(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("servicedesk.db").display())
}

fn valid_env(database_url: &str) -> Vec<(&'static str, String)> {
    let mut vars: Vec<(&'static str, String)> =
        SLACK_ENV.iter().map(|(key, value)| (*key, value.to_string())).collect();
    vars.push(("SERVICEDESK_DATABASE_URL", database_url.to_string()));
    vars
}

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&valid_env("sqlite::memory:"), || {
        let result = migrate::run(LoadOptions::default());
        assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_without_slack_settings() {
    with_env(&[("SERVICEDESK_DATABASE_URL", "sqlite::memory:".to_string())], || {
        let result = migrate::run(LoadOptions::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = TempDir::new().expect("tempdir");
    with_env(&valid_env(&file_database(&dir)), || {
        let first = seed::run(LoadOptions::default());
        assert_eq!(first.exit_code, 0, "first seed failed: {}", first.output);
        let first_message = parse_payload(&first.output)["message"].as_str().unwrap_or("").to_string();
        assert!(first_message.contains("(5 new customers, 8 new orders)"), "{first_message}");

        let second = seed::run(LoadOptions::default());
        assert_eq!(second.exit_code, 0, "second seed failed: {}", second.output);
        let second_message = parse_payload(&second.output)["message"].as_str().unwrap_or("").to_string();
        assert!(second_message.contains("(0 new customers, 0 new orders)"), "{second_message}");
    });
}

#[test]
fn doctor_reports_missing_schema_as_database_failure() {
    let dir = TempDir::new().expect("tempdir");
    with_env(&valid_env(&file_database(&dir)), || {
        let result = doctor::run(LoadOptions::default(), true);
        assert_eq!(result.exit_code, 4, "{}", result.output);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "fail");
        let schema = report["checks"]
            .as_array()
            .and_then(|checks| checks.iter().find(|check| check["name"] == "database_schema"))
            .cloned()
            .unwrap_or(Value::Null);
        assert_eq!(schema["status"], "fail");
    });
}

#[test]
fn doctor_passes_after_migrate_and_redacts_token() {
    let dir = TempDir::new().expect("tempdir");
    with_env(&valid_env(&file_database(&dir)), || {
        assert_eq!(migrate::run(LoadOptions::default()).exit_code, 0);

        let result = doctor::run(LoadOptions::default(), true);
        assert_eq!(result.exit_code, 0, "{}", result.output);
        assert!(!result.output.contains("xoxb-test"), "token leaked: {}", result.output);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "pass");
    });
}

#[test]
fn doctor_skips_downstream_checks_when_config_fails() {
    with_env(&[], || {
        let result = doctor::run(LoadOptions::default(), false);
        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("- [fail] config_validation"));
        assert!(result.output.contains("- [skip] database_connectivity"));
    });
}

#[test]
fn ask_rejects_malformed_request() {
    with_env(&valid_env("sqlite::memory:"), || {
        let result = ask::run(LoadOptions::default(), AskInput::Json("{oops".to_string()));
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "invalid_request");
    });
}

#[test]
fn ask_runs_decision_against_seeded_store() {
    let dir = TempDir::new().expect("tempdir");
    with_env(&valid_env(&file_database(&dir)), || {
        let oracle = Arc::new(ScriptedOracle::new([
            OracleReply::ToolCalls(vec![ToolCall::new(
                "call_1",
                "lookup_order",
                json!({"order_id": "ORD-001"}),
            )]),
            OracleReply::Final("ORD-001 was delivered 5 days ago.".to_string()),
        ]));

        let result = ask::execute(
            LoadOptions::default(),
            AskInput::Json(
                r#"{"message":"Where is ORD-001?","context":{"customer_id":"CUST-001"}}"#.to_string(),
            ),
            Some(oracle.clone() as Arc<dyn ReasoningOracle>),
        );
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["message"], "ORD-001 was delivered 5 days ago.");
        assert_eq!(payload["data"]["status"], "done");
        assert_eq!(payload["data"]["tool_calls"], json!(["lookup_order"]));

        let transcripts = oracle.seen();
        let lookup = transcripts[1]
            .tool_results()
            .map(|(_, content, _)| content.to_string())
            .next()
            .unwrap_or_default();
        assert!(lookup.contains("Customer: John Doe (CUST-001)"), "{lookup}");
        assert!(lookup.contains("Amount: $75.00"), "{lookup}");
    });
}

#[test]
fn ask_with_blank_message_does_not_consult_oracle() {
    let dir = TempDir::new().expect("tempdir");
    with_env(&valid_env(&file_database(&dir)), || {
        let oracle = Arc::new(ScriptedOracle::default());

        let result = ask::execute(
            LoadOptions::default(),
            AskInput::Inline { message: "  ".to_string(), customer_id: None },
            Some(oracle.clone() as Arc<dyn ReasoningOracle>),
        );
        assert_eq!(result.exit_code, 0, "{}", result.output);
        assert_eq!(
            parse_payload(&result.output)["message"],
            "I need a message to help you. Could you please provide more details?"
        );
        assert_eq!(oracle.calls(), 0);
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|error| panic!("invalid JSON `{output}`: {error}"))
}

fn with_env(vars: &[(&str, String)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|e| e.into_inner());

    let keys = [
        "SERVICEDESK_DATABASE_URL",
        "SERVICEDESK_DATABASE_MAX_CONNECTIONS",
        "SERVICEDESK_DATABASE_TIMEOUT_SECS",
        "SERVICEDESK_DATABASE_SEED_SAMPLE_DATA",
        "SERVICEDESK_SLACK_BOT_TOKEN",
        "SERVICEDESK_SLACK_TEAM_ID",
        "SERVICEDESK_SLACK_ESCALATION_CHANNEL_ID",
        "SERVICEDESK_SLACK_API_BASE_URL",
        "SERVICEDESK_SLACK_TIMEOUT_SECS",
        "SERVICEDESK_LLM_PROVIDER",
        "SERVICEDESK_LLM_API_KEY",
        "SERVICEDESK_LLM_BASE_URL",
        "SERVICEDESK_LLM_MODEL",
        "SERVICEDESK_LLM_TEMPERATURE",
        "SERVICEDESK_LLM_TIMEOUT_SECS",
        "SERVICEDESK_LLM_MAX_RETRIES",
        "SERVICEDESK_AGENT_TOOL_TIMEOUT_SECS",
        "SERVICEDESK_AGENT_ENFORCE_ESCALATION",
        "SERVICEDESK_SERVER_BIND_ADDRESS",
        "SERVICEDESK_SERVER_PORT",
        "SERVICEDESK_LOGGING_LEVEL",
        "SERVICEDESK_LOGGING_FORMAT",
        "SERVICEDESK_LOG_LEVEL",
        "SERVICEDESK_LOG_FORMAT",
        "SLACK_BOT_TOKEN",
        "SLACK_TEAM_ID",
        "SLACK_ESCALATION_CHANNEL_ID",
        "OPENAI_API_KEY",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
