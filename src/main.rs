//! go-offline - Maven offline repository preparation CLI tool
//!
//! Resolves the plugins, dependencies, parent POMs and configured extra
//! artifacts of a Maven build and downloads them into a local repository.

use clap::Parser;
use go_offline::cli::CliArgs;
use go_offline::config::GoOfflineConfig;
use go_offline::error::{AppError, ConfigError};
use go_offline::logging::init_logging;
use go_offline::maven::{load_reactor, HttpClient, MavenResolver, RepositoryTransport};
use go_offline::orchestrator::Orchestrator;
use go_offline::output::{create_formatter, OutputConfig};
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

/// Exit status for configuration errors
const CONFIG_ERROR_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose, args.quiet);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) if is_config_error(&e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(CONFIG_ERROR_EXIT)
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn is_config_error(error: &anyhow::Error) -> bool {
    error.downcast_ref::<ConfigError>().is_some()
        || matches!(error.downcast_ref::<AppError>(), Some(AppError::Config(_)))
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        project = %args.path.display(),
        "Starting go-offline"
    );

    // Configuration problems abort before anything touches a repository
    let config = GoOfflineConfig::from_cli(&args)?;
    config.validate()?;

    let mut context = config.resolution_context()?;
    let client = HttpClient::new()?;
    let resolver = Arc::new(MavenResolver::new(
        RepositoryTransport::new(client),
        config.local_repository()?,
    ));

    let reactor = load_reactor(&args.path, &resolver, &context).await?;
    reactor.extend_context(&mut context);

    let fail_on_errors = config.fail_on_errors;
    let orchestrator = Orchestrator::new(
        config,
        resolver.clone(),
        resolver,
        context,
        reactor.units,
    )
    .with_progress(args.show_progress());
    let report = orchestrator.run().await?;

    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet, fail_on_errors);
    let formatter = create_formatter(output_config);
    let mut stdout = io::stdout().lock();
    formatter.format(&report, &mut stdout)?;
    stdout.flush()?;

    if report.is_failure(fail_on_errors) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
