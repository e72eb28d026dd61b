use std::sync::Arc;

use servicedesk_agent::tools::{local_registry, SlackPostMessageTool};
use servicedesk_agent::{
    DecisionLoop, LoopConfigError, LoopSettings, OpenAiCompatibleOracle, OracleError,
    ReasoningOracle, ToolError,
};
use servicedesk_core::approvals::InMemoryApprovalLog;
use servicedesk_core::config::{AppConfig, ConfigError};
use servicedesk_core::escalation::EscalationError;
use servicedesk_db::{
    connect_with_config, migrations, DbPool, RepositoryError, SampleDataset, SqlLookupService,
};
use servicedesk_slack::SlackEscalationClient;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    /// Every pending review queued since startup. Nothing drains it, so it grows
    /// for the life of the process.
    pub approvals: Arc<InMemoryApprovalLog>,
    pub decision_loop: Arc<DecisionLoop>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("sample data seeding failed: {0}")]
    Seed(#[source] RepositoryError),
    #[error("tool registry construction failed: {0}")]
    Tools(#[from] ToolError),
    #[error("escalation client construction failed: {0}")]
    Escalation(#[from] EscalationError),
    #[error("oracle construction failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("decision loop construction failed: {0}")]
    DecisionLoop(#[from] LoopConfigError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    bootstrap_with_oracle(config, None).await
}

/// Wires the application. `oracle` replaces the configured language model when given.
pub async fn bootstrap_with_oracle(
    config: AppConfig,
    oracle: Option<Arc<dyn ReasoningOracle>>,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    if config.database.seed_sample_data {
        let seeded = SampleDataset::load(&db_pool).await.map_err(BootstrapError::Seed)?;
        info!(
            event_name = "system.bootstrap.sample_data_seeded",
            correlation_id = "bootstrap",
            customers_inserted = seeded.customers_inserted,
            orders_inserted = seeded.orders_inserted,
            "sample data present"
        );
    }

    let approvals = Arc::new(InMemoryApprovalLog::default());
    let mut registry =
        local_registry(Arc::new(SqlLookupService::new(db_pool.clone())), approvals.clone())?;
    let slack = SlackEscalationClient::from_config(&config.slack)?;
    registry.register(SlackPostMessageTool::new(
        Arc::new(slack),
        config.slack.escalation_channel_id.clone(),
    ))?;

    let oracle: Arc<dyn ReasoningOracle> = match oracle {
        Some(oracle) => oracle,
        None => Arc::new(OpenAiCompatibleOracle::from_config(&config.llm)?),
    };
    let decision_loop = DecisionLoop::new(registry, oracle, LoopSettings::from_config(&config))?;
    info!(
        event_name = "system.bootstrap.decision_loop_ready",
        correlation_id = "bootstrap",
        tools = ?decision_loop.tool_names(),
        provider = ?config.llm.provider,
        model = %config.llm.model,
        "decision loop constructed"
    );

    Ok(Application { config, db_pool, approvals, decision_loop: Arc::new(decision_loop) })
}
