use std::sync::Arc;

use servicedesk_agent::tools::{local_registry, SlackPostMessageTool};
use servicedesk_agent::{
    DecisionLoop, DecisionOutcome, DecisionRequest, LoopSettings, OpenAiCompatibleOracle,
    ReasoningOracle,
};
use servicedesk_core::approvals::InMemoryApprovalLog;
use servicedesk_core::config::{AppConfig, LoadOptions};
use servicedesk_db::{connect_with_config, migrations, DbPool, SampleDataset, SqlLookupService};
use servicedesk_slack::SlackEscalationClient;

use crate::commands::{
    build_runtime, load_config, CommandResult, Failure, EXIT_CONFIG, EXIT_DATABASE,
    EXIT_LOOP_CONSTRUCTION, EXIT_MIGRATION,
};

#[derive(Debug, Clone)]
pub enum AskInput {
    /// A `DecisionRequest` document, usually read from stdin.
    Json(String),
    Inline { message: String, customer_id: Option<String> },
}

impl AskInput {
    fn into_request(self) -> Result<DecisionRequest, String> {
        match self {
            Self::Json(text) => serde_json::from_str(&text)
                .map_err(|error| format!("request is not a valid decision request: {error}")),
            Self::Inline { message, customer_id } => {
                Ok(DecisionRequest::new(message, customer_id.as_deref()))
            }
        }
    }
}

pub fn run(options: LoadOptions, input: AskInput) -> CommandResult {
    execute(options, input, None)
}

/// Runs one decision. `oracle` replaces the configured language model when given.
pub fn execute(
    options: LoadOptions,
    input: AskInput,
    oracle: Option<Arc<dyn ReasoningOracle>>,
) -> CommandResult {
    let request = match input.into_request() {
        Ok(request) => request,
        Err(message) => return CommandResult::failure("ask", "invalid_request", message, EXIT_CONFIG),
    };
    let config = match load_config("ask", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("ask") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DATABASE))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;
        if config.database.seed_sample_data {
            SampleDataset::load(&pool)
                .await
                .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;
        }

        let decision_loop = build_loop(&config, pool.clone(), oracle)?;
        let outcome = decision_loop.run(request).await;
        pool.close().await;
        Ok::<DecisionOutcome, Failure>(outcome)
    });

    match result {
        Ok(outcome) => CommandResult::success_with_data(
            "ask",
            outcome.response.clone(),
            serde_json::to_value(&outcome).ok(),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ask", error_class, message, exit_code)
        }
    }
}

fn build_loop(
    config: &AppConfig,
    pool: DbPool,
    oracle: Option<Arc<dyn ReasoningOracle>>,
) -> Result<DecisionLoop, Failure> {
    let construction = |error: String| ("loop_construction", error, EXIT_LOOP_CONSTRUCTION);

    let mut registry = local_registry(
        Arc::new(SqlLookupService::new(pool)),
        Arc::new(InMemoryApprovalLog::default()),
    )
    .map_err(|error| construction(error.to_string()))?;

    let slack = SlackEscalationClient::from_config(&config.slack)
        .map_err(|error| construction(error.to_string()))?;
    registry
        .register(SlackPostMessageTool::new(
            Arc::new(slack),
            config.slack.escalation_channel_id.clone(),
        ))
        .map_err(|error| construction(error.to_string()))?;

    let oracle: Arc<dyn ReasoningOracle> = match oracle {
        Some(oracle) => oracle,
        None => Arc::new(
            OpenAiCompatibleOracle::from_config(&config.llm)
                .map_err(|error| construction(error.to_string()))?,
        ),
    };

    DecisionLoop::new(registry, oracle, LoopSettings::from_config(config))
        .map_err(|error| construction(error.to_string()))
}
