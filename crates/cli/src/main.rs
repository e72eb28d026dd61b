use std::process::ExitCode;

fn main() -> ExitCode {
    servicedesk_cli::run()
}
