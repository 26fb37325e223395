mod config;
mod report;

use clap::{Parser, Subcommand};
use config::{Config, ConfigError, LoggingConfig, MetricsConfig};
use flags::client::{ClientError, FlagClient};
use flags::metrics_defs::{ALL_METRICS, MetricType};
use metrics_exporter_statsd::StatsdBuilder;
use report::Report;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "flagsync", about = "Synchronize and inspect remote feature flags")]
struct Cli {
    #[arg(long, short, default_value = "flagsync.yaml")]
    config: PathBuf,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Fetch the flags once and print the resolved state as JSON
    Fetch,
    /// Poll the remote and print every flag change until interrupted
    Watch {
        /// Overrides the configured polling interval
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Acknowledge the out-of-service notice for the current flag version
    Dismiss,
    /// Forget any acknowledgment of the out-of-service notice
    ResetDismissal,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invalid sentry dsn: {0}")]
    Dsn(String),
    #[error("could not set up metrics: {0}")]
    Metrics(String),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("could not serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;

    let _sentry = init_logging(config.common.logging.as_ref())?;
    init_metrics(config.common.metrics.as_ref())?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(run(cli.command, config.flags))
}

fn init_logging(
    logging: Option<&LoggingConfig>,
) -> Result<Option<sentry::ClientInitGuard>, CliError> {
    let guard = match logging {
        Some(logging) => {
            let dsn = logging
                .sentry_dsn
                .parse::<sentry::types::Dsn>()
                .map_err(|e| CliError::Dsn(e.to_string()))?;
            Some(sentry::init(sentry::ClientOptions {
                dsn: Some(dsn),
                release: sentry::release_name!(),
                ..Default::default()
            }))
        }
        None => None,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(guard.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    Ok(guard)
}

fn init_metrics(metrics: Option<&MetricsConfig>) -> Result<(), CliError> {
    let Some(metrics) = metrics else {
        return Ok(());
    };

    let recorder = StatsdBuilder::from(metrics.statsd_host.clone(), metrics.statsd_port)
        .build(Some(&metrics.prefix))
        .map_err(|e| CliError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|e| CliError::Metrics(e.to_string()))?;

    for def in ALL_METRICS {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }

    tracing::info!(
        host = %metrics.statsd_host,
        port = metrics.statsd_port,
        "reporting metrics to statsd"
    );
    Ok(())
}

async fn run(command: CliCommand, config: flags::config::Config) -> Result<(), CliError> {
    let client = FlagClient::new(&config)?;

    let result = match command {
        CliCommand::Fetch => {
            client.refresh().await;
            print_report(&client)
        }
        CliCommand::Watch { interval_secs } => {
            watch(&client, interval_secs.map(Duration::from_secs)).await
        }
        CliCommand::Dismiss => {
            client.refresh().await;
            client.dismiss();
            print_report(&client)
        }
        CliCommand::ResetDismissal => {
            client.reset_dismissal();
            tracing::info!("out-of-service dismissal reset");
            Ok(())
        }
    };

    client.dispose();
    result
}

async fn watch(client: &FlagClient, interval: Option<Duration>) -> Result<(), CliError> {
    let mut changes = client.subscribe_flags();
    match interval {
        Some(interval) => client.start_polling_every(interval),
        None => client.start_polling(),
    }

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let domains: Vec<_> = changes.borrow_and_update().domains().collect();
                tracing::info!(?domains, "flags changed");
                print_report(client)?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping");
                break;
            }
        }
    }

    client.stop_polling();
    Ok(())
}

fn print_report(client: &FlagClient) -> Result<(), CliError> {
    let report = Report::collect(client);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
