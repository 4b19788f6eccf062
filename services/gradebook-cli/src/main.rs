//! Gradebook command-line client
//!
//! Signs in against the gradebook backend, keeps the session in a local
//! storage file, and prints grades, schedule, notifications and settings.
//! Logs go to stderr; command output goes to stdout.

mod cli;
mod commands;
mod config;

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, USAGE};
use crate::commands::App;
use crate::config::Config;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// What to tell the user about a failed command.
fn user_message(err: &anyhow::Error) -> String {
    if let Some(api) = err.downcast_ref::<gradebook_client::ApiError>() {
        return api.user_message();
    }
    if let Some(state) = err.downcast_ref::<gradebook_core::Error>() {
        return state.user_message();
    }
    format!("{err:#}")
}

async fn run() -> Result<()> {
    let cli = cli::parse(std::env::args().skip(1))?;
    if cli.command == Command::Help {
        writeln!(std::io::stdout(), "{USAGE}")?;
        return Ok(());
    }

    let config_path = Config::resolve_path(cli.config.as_deref());
    let config = Config::load(config_path.as_deref(), cli.base_url.as_deref()).with_context(|| {
        match &config_path {
            Some(path) => format!("failed to load config from {}", path.display()),
            None => "invalid configuration".to_string(),
        }
    })?;
    info!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        "configuration loaded"
    );

    let app = App::open(&config).await?;
    let mut stdout = std::io::stdout();
    app.run(cli.command, &mut stdout).await?;
    stdout.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            eprintln!("error: {}", user_message(&e));
            ExitCode::FAILURE
        }
    }
}
