use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use restock_watcher::config::LoggingConfig;
use restock_watcher::watcher::Watcher;
use restock_watcher::{
    AppConfig, HttpFetcher, NotificationDispatcher, RunSummary, SmtpMailer, TrackingRunner,
};

#[derive(Parser)]
#[command(name = "restock-watcher", version, about = "Watch product pages and email when items are back in stock")]
struct Cli {
    /// Extra configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check every product once and exit
    Check {
        /// Print one JSON record per product to stdout
        #[arg(long)]
        json: bool,
    },
    /// Check on a cron schedule until interrupted
    Watch {
        /// Six-field cron expression, overrides scheduler.cron
        #[arg(long)]
        cron: Option<String>,
    },
    /// Print the configured product table as TOML
    Products,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _guard = init_tracing(&config.logging)?;

    info!("Starting Restock Watcher...");

    match cli.command {
        Command::Check { json } => {
            let runner = build_runner(&config)?;
            let records = runner.run(&config.products).await;

            if json {
                for record in &records {
                    println!("{}", serde_json::to_string(record)?);
                }
            }

            let summary = RunSummary::from_records(&records);
            if summary.all_failed() {
                error!("All {} product checks failed", summary.total);
                return Ok(ExitCode::from(2));
            }
        }
        Command::Watch { cron } => {
            if let Some(cron) = cron {
                config.scheduler.cron = cron;
                config.validate().context("Invalid --cron expression")?;
            }
            let runner = build_runner(&config)?.with_alert_mode(config.scheduler.alert_mode);
            Watcher::new(runner, config.products.clone(), config.scheduler.clone())
                .run_until_shutdown()
                .await?;
            info!("Shutting down...");
        }
        Command::Products => {
            #[derive(serde::Serialize)]
            struct Table<'a> {
                products: &'a [restock_watcher::ProductSpec],
            }
            print!("{}", toml::to_string_pretty(&Table { products: &config.products })?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn build_runner(config: &AppConfig) -> Result<TrackingRunner> {
    let fetcher = HttpFetcher::new(&config.scraper)?;
    let smtp = &config.notifications.smtp;
    let dispatcher = NotificationDispatcher::new(Arc::new(SmtpMailer::new(smtp)), smtp.credentials());

    Ok(TrackingRunner::new(Arc::new(fetcher), dispatcher)
        .with_concurrency(config.scraper.max_concurrent_checks))
}

fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env().add_directive("restock_watcher=info".parse()?);
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match &logging.directory {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            Ok(None)
        }
    }
}
