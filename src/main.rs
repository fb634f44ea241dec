//! Binary entry point for the `mcn-conform` CLI.

mod cli;

use std::io::{self, Write};
use std::process;
use std::time::Duration;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use clap::Parser;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use mcn_conform::bulk::DEFAULT_ITERATION_DELAY;
use mcn_conform::scenario::catalog::{self, CatalogError};
use mcn_conform::{
    BulkError, BulkOrchestrator, BulkRequest, BulkTarget, ConfigError, HarnessConfig, HealthStatus,
    ResourceKind, ScenarioRunner, Sweeper, Transport, TransportError,
};

use cli::{BulkSubnetCommand, BulkVpcCommand, Cli, Command, ScenarioCommand};

/// Every check passed.
const EXIT_PASSED: i32 = 0;
/// The process could not do its work (configuration, bad input, I/O).
const EXIT_PROCESS_FAILURE: i32 = 1;
/// At least one check failed or was inconclusive.
const EXIT_CHECKS_FAILED: i32 = 2;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] TransportError),
    #[error(transparent)]
    Bulk(#[from] BulkError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to read field table {path}: {message}")]
    FieldTable { path: String, message: String },
    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
    #[error("failed to serialise report: {0}")]
    Serialise(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            EXIT_PROCESS_FAILURE
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mcn_conform=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let config = HarnessConfig::load_without_cli_args()?;
    config.validate()?;
    let runner = ScenarioRunner::from_config(config)?;
    execute(cli.command, &runner, DEFAULT_ITERATION_DELAY, &mut io::stdout()).await
}

async fn execute<T: Transport>(
    command: Command,
    runner: &ScenarioRunner<T>,
    iteration_delay: Duration,
    out: &mut impl Write,
) -> Result<i32, CliError> {
    match command {
        Command::BulkVpc(BulkVpcCommand {
            count,
            cidrs,
            teardown,
        }) => {
            let request = BulkRequest::vpc(count, cidrs);
            run_bulk(runner, &request, teardown, iteration_delay, out).await
        }
        Command::BulkSubnet(BulkSubnetCommand {
            vpc_id,
            count,
            cidrs,
            teardown,
        }) => {
            let request = BulkRequest::subnet(vpc_id, count, cidrs);
            run_bulk(runner, &request, teardown, iteration_delay, out).await
        }
        Command::DeleteVpc(args) => run_sweep(runner, ResourceKind::Vpc, &args.ids, out).await,
        Command::DeleteSubnet(args) => {
            run_sweep(runner, ResourceKind::Subnet, &args.ids, out).await
        }
        Command::Scenario(args) => run_scenario(runner, args, out).await,
        Command::Health => run_health(runner, out).await,
    }
}

async fn run_bulk<T: Transport>(
    runner: &ScenarioRunner<T>,
    request: &BulkRequest,
    teardown: bool,
    iteration_delay: Duration,
    out: &mut impl Write,
) -> Result<i32, CliError> {
    let run = BulkOrchestrator::new(runner)
        .with_delay(iteration_delay)
        .run(request)
        .await?;
    writeln!(out, "{}", serde_json::to_string_pretty(&run)?)?;

    let mut passed = run.all_passed();
    if teardown {
        let kind = match request.target {
            BulkTarget::Vpc => ResourceKind::Vpc,
            BulkTarget::Subnet { .. } => ResourceKind::Subnet,
        };
        let identifiers = run.identifiers();
        info!(count = identifiers.len(), %kind, "tearing down bulk resources");
        let summary = Sweeper::new(runner).sweep(kind, &identifiers).await;
        writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        passed &= summary.is_clean();
    }
    Ok(exit_code_for(passed))
}

async fn run_sweep<T: Transport>(
    runner: &ScenarioRunner<T>,
    kind: ResourceKind,
    ids: &[String],
    out: &mut impl Write,
) -> Result<i32, CliError> {
    let summary = Sweeper::new(runner).sweep(kind, ids).await;
    writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
    Ok(exit_code_for(summary.is_clean()))
}

async fn run_scenario<T: Transport>(
    runner: &ScenarioRunner<T>,
    args: ScenarioCommand,
    out: &mut impl Write,
) -> Result<i32, CliError> {
    let fields = args.fields.as_deref().map(read_field_table).transpose()?;
    let scenario = catalog::lookup(
        &args.name,
        fields,
        args.target_id.as_deref(),
        runner.config(),
    )?;
    match runner.run(&scenario, None).await {
        Ok(report) => {
            match report.identifier() {
                Some(id) => writeln!(
                    out,
                    "{}: passed (status {}, id {id})",
                    report.scenario, report.status
                )?,
                None => writeln!(out, "{}: passed (status {})", report.scenario, report.status)?,
            }
            Ok(EXIT_PASSED)
        }
        Err(err) => {
            let verdict = if err.is_inconclusive() {
                "inconclusive"
            } else {
                "failed"
            };
            writeln!(out, "{}: {verdict} ({})", scenario.name, err.kind())?;
            writeln!(io::stderr(), "{err}").ok();
            Ok(EXIT_CHECKS_FAILED)
        }
    }
}

async fn run_health<T: Transport>(
    runner: &ScenarioRunner<T>,
    out: &mut impl Write,
) -> Result<i32, CliError> {
    let status = runner.probe_health().await;
    let (line, healthy) = match &status {
        HealthStatus::Healthy => (String::from("healthy"), true),
        HealthStatus::NotExposed => (String::from("health endpoint not exposed"), true),
        HealthStatus::ClientError(code) => (format!("client error ({code})"), false),
        HealthStatus::ServerError(code) => (format!("server error ({code})"), false),
        HealthStatus::Unexpected(code) => (format!("unexpected status ({code})"), false),
        HealthStatus::Unreachable(message) => (format!("unreachable: {message}"), false),
    };
    writeln!(out, "{line}")?;
    Ok(exit_code_for(healthy))
}

fn read_field_table(path: &str) -> Result<String, CliError> {
    let to_error = |message: String| CliError::FieldTable {
        path: path.to_owned(),
        message,
    };
    let file = Utf8Path::new(path);
    let name = file
        .file_name()
        .ok_or_else(|| to_error(String::from("path does not name a file")))?;
    let parent = file
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| to_error(err.to_string()))?;
    dir.read_to_string(name)
        .map_err(|err| to_error(err.to_string()))
}

const fn exit_code_for(passed: bool) -> i32 {
    if passed {
        EXIT_PASSED
    } else {
        EXIT_CHECKS_FAILED
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod main_tests;
