pub mod commands;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::ask::AskInput;
use commands::{CommandResult, EXIT_CONFIG};
use servicedesk_core::config::{ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "servicedesk",
    about = "Servicedesk operator CLI",
    long_about = "Run refund and order decisions, apply migrations, seed sample data, and check readiness.",
    after_help = "Examples:\n  echo '{\"message\":\"Refund ORD-002\",\"context\":{\"customer_id\":\"CUST-002\"}}' | servicedesk ask\n  servicedesk ask --message \"Can I cancel ORD-005?\" --customer-id CUST-004\n  servicedesk doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a servicedesk.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override database.url")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run one decision; reads a JSON request from stdin unless --message is given")]
    Ask {
        #[arg(long, help = "Customer message to decide on")]
        message: Option<String>,
        #[arg(long, requires = "message", help = "Customer identifier for the message")]
        customer_id: Option<String>,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the sample customers and orders; existing rows are left untouched")]
    Seed,
    #[command(about = "Validate config, escalation destination, oracle and database readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config.clone(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let result = match cli.command {
        Command::Ask { message: Some(message), customer_id } => {
            commands::ask::run(options, AskInput::Inline { message, customer_id })
        }
        Command::Ask { message: None, .. } => match read_stdin() {
            Ok(text) => commands::ask::run(options, AskInput::Json(text)),
            Err(error) => CommandResult::failure(
                "ask",
                "invalid_request",
                format!("failed to read request from stdin: {error}"),
                EXIT_CONFIG,
            ),
        },
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Doctor { json } => commands::doctor::run(options, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn read_stdin() -> std::io::Result<String> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
