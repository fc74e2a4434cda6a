mod cli;
mod summary;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shelver_core::{load_config, validate_config, Organizer};

use cli::{Args, LogFormat};
use summary::Summary;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.log_format);

    if let Err(e) = run(args).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            load_config(Some(path.as_path()))
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => load_config(None).context("Failed to load configuration")?,
    }
    .organizer;
    args.apply_to(&mut config);
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        "Organizing {} into {} ({}, {})",
        args.input.display(),
        config.dest_root.display(),
        if config.apply { "apply" } else { "dry run" },
        config.mode
    );

    let generated_at = report_timestamp(std::env::var("SOURCE_DATE_EPOCH").ok().as_deref())?;
    let report_path = config.report_path.clone();
    let organizer = Organizer::new(config);
    let report = organizer
        .organize(&args.input, generated_at)
        .await
        .with_context(|| format!("Failed to organize {}", args.input.display()))?;

    print!("{}", Summary::new(&report));
    println!();
    println!("Report written to {}", report_path.display());
    Ok(())
}

/// `SOURCE_DATE_EPOCH` when set, so repeated dry runs produce identical reports.
fn report_timestamp(source_date_epoch: Option<&str>) -> Result<DateTime<Utc>> {
    match source_date_epoch {
        Some(raw) => {
            let secs: i64 = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid SOURCE_DATE_EPOCH: {raw:?}"))?;
            DateTime::from_timestamp(secs, 0)
                .with_context(|| format!("SOURCE_DATE_EPOCH out of range: {secs}"))
        }
        None => Ok(Utc::now()),
    }
}
