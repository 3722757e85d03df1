mod config;
mod demos;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use config::{DemoConfig, LoggingConfig};
use demos::DemoContext;
use std::path::PathBuf;
use tokio::task::LocalSet;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "rivulet-cli")]
#[command(about = "Rivulet CLI - run the reactive stream demos", long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (overrides the config file; RUST_LOG wins over both)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Demo {
    /// Two subscribers on a cold interval
    Cold,
    /// Hand-written multiply-by-ten operator
    CustomOperator,
    /// Sequential concatenation
    Concat,
    /// Two offset timers merged
    Merge,
    /// Three sources zipped into records
    Zip,
    /// retry(2) followed by catch_error
    Retry,
    /// Failing async task retried immediately with retry(3)
    RetryTask,
    /// Failing async task retried with the configured delay and backoff
    RetryPolicy,
    /// retry_when driven by an interval
    RetryWhen,
    /// Every demo in order
    All,
}

impl Demo {
    const SEQUENCE: [Demo; 9] = [
        Demo::Cold,
        Demo::CustomOperator,
        Demo::Concat,
        Demo::Merge,
        Demo::Zip,
        Demo::Retry,
        Demo::RetryTask,
        Demo::RetryPolicy,
        Demo::RetryWhen,
    ];
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_demo(demo: Demo, ctx: &DemoContext) -> Result<()> {
    match demo {
        Demo::Cold => demos::cold(ctx).await,
        Demo::CustomOperator => demos::custom_operator(ctx).await,
        Demo::Concat => demos::concat(ctx).await,
        Demo::Merge => demos::merge(ctx).await,
        Demo::Zip => demos::zip_records(ctx).await,
        Demo::Retry => demos::retry(ctx).await,
        Demo::RetryTask => demos::retry_task(ctx).await,
        Demo::RetryPolicy => demos::retry_policy(ctx).await,
        Demo::RetryWhen => demos::retry_when(ctx).await,
        Demo::All => {
            for demo in Demo::SEQUENCE {
                Box::pin(run_demo(demo, ctx)).await?;
                println!();
            }
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DemoConfig::from_file(path).context("Failed to load configuration")?,
        None => DemoConfig::default(),
    };
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging);
    info!("Rivulet CLI v{}", env!("CARGO_PKG_VERSION"));

    let ctx = DemoContext::new(config);
    let result = LocalSet::new().run_until(run_demo(args.demo, &ctx)).await;

    if let Err(e) = &result {
        error!(error = %e, "{}", format!("Demo failed: {:#}", e).red());
    }
    result
}
