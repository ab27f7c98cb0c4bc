//! SQL Server inventory tool.
//!
//! Connects once, walks every catalog for each requested task, and writes
//! tab-separated results to standard output.
//!
//! # Exit codes
//! - 0: completed
//! - 1: usage or configuration error
//! - 99: connection or catalog discovery failure

use anyhow::Context;
use clap::Parser;
use dbprobe::{
    Cli, INVALID_TASK_EXIT_DELAY, build_run_options, invalid_task_messages, load_connection,
    select_tasks,
};
use dbprobe_core::error::{EXIT_FATAL, EXIT_OK, EXIT_USAGE};
use dbprobe_core::{MssqlExecutor, ProbeError, RunSummary, init_logging, run};
use std::io::Write;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("{}", e);
        return ExitCode::from(EXIT_USAGE);
    }

    let tasks = match select_tasks(&cli) {
        Ok(tasks) => tasks,
        Err(unknown) => {
            for message in invalid_task_messages(&unknown) {
                eprintln!("{}", message);
            }
            let _ = std::io::stdout().flush();
            tokio::time::sleep(INVALID_TASK_EXIT_DELAY).await;
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match probe(&cli, tasks).await {
        Ok(summary) => {
            info!(
                "Done: {} tasks, {} catalogs processed, {} skipped, {} searches stopped early",
                summary.tasks_run,
                summary.catalogs_processed,
                summary.catalogs_skipped,
                summary.search_aborts
            );
            if let Ok(json) = serde_json::to_string(&summary) {
                tracing::debug!("Run summary: {}", json);
            }
            ExitCode::from(EXIT_OK)
        }
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<ProbeError>()
                .map_or(EXIT_FATAL, ProbeError::exit_code);
            ExitCode::from(code)
        }
    }
}

/// Connects, runs every task, and closes the connection.
async fn probe(cli: &Cli, tasks: dbprobe_core::TaskSet) -> anyhow::Result<RunSummary> {
    let options = build_run_options(cli, tasks)?;
    let (config, mut credentials) = load_connection(cli)?;

    if cli.password_prompt && !credentials.has_password() {
        let password = rpassword::prompt_password(format!(
            "Password for {}@{}: ",
            credentials.username(),
            config.address()
        ))
        .context("Failed to read password")?;
        credentials = credentials.with_password(password);
    }

    info!("Connecting to {}", config);
    let mut executor = MssqlExecutor::connect(&config, &credentials).await?;
    drop(credentials);
    info!("Connected");

    let outcome = run(&mut executor, &options, std::io::stdout()).await;

    info!("{} statements executed", executor.statements_executed());
    if let Err(e) = executor.close().await {
        warn!("{}", e);
    }

    Ok(outcome?)
}
