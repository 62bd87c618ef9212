use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bcq_cli::app::App;
use bcq_cli::cli::{self, Cli};
use bcq_cli::config::{self, ConfigFlags};
use bcq_cli::output::{self, OutputMode};

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("BCQ_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "bcq=debug,bcq_cli=debug,bcq_core=debug" } else { "warn" }));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (doesn't override existing env vars)
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = e.print();
                    ExitCode::SUCCESS
                }
                _ => {
                    let _ = e.print();
                    exit_code(1)
                }
            };
        }
    };

    init_tracing(cli.verbose);
    let mode = OutputMode::detect(cli.wants_json());

    let flags = ConfigFlags {
        profile: cli.profile.as_deref(),
        account: cli.account.as_deref(),
        base_url: cli.base_url.as_deref(),
    };
    let resolved = match config::load(&flags) {
        Ok(resolved) => resolved,
        Err(e) => return exit_code(output::render_error(&e.into(), mode)),
    };
    tracing::debug!(
        base_url = %resolved.base_url,
        account = ?resolved.account_id,
        profile = ?resolved.profile,
        "configuration resolved"
    );

    let app = match App::connect(resolved, cli.project.clone()) {
        Ok(app) => app,
        Err(e) => return exit_code(output::render_error(&e.into(), mode)),
    };

    match cli::run(&app, cli.command).await {
        Ok(envelope) => {
            output::render(&envelope, mode);
            ExitCode::SUCCESS
        }
        Err(e) => exit_code(output::render_error(&e.into(), mode)),
    }
}
