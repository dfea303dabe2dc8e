use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recap_scheduler::{
    bootstrap,
    commands,
    config::Config,
    scheduler::{log_outcome, Scheduler},
    Cli, Command,
};
use recap_summary::SummaryOutcome;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!(
        interval_secs = config.scheduler.interval_secs,
        threshold = config.summary.threshold.get(),
        "Starting recap scheduler"
    );

    // Startup connectivity failures abort before any check runs
    let store = bootstrap::connect_store(&config).await?;

    match cli.command() {
        Command::Run => {
            let llm = bootstrap::build_invoker(&config)?;
            let controller = bootstrap::build_controller(&config, store, llm)?;
            let scheduler = Scheduler::new(
                Arc::new(controller),
                Duration::from_secs(config.scheduler.interval_secs),
            )
            .with_collection(config.scheduler.collection.clone())
            .with_run_on_start(config.scheduler.run_on_start);

            scheduler.run().await;
            tracing::info!("Scheduler stopped");
        }
        Command::Once { collection } => {
            let llm = bootstrap::build_invoker(&config)?;
            let controller = bootstrap::build_controller(&config, store, llm)?;
            let collection = collection.unwrap_or_else(|| config.scheduler.collection.clone());

            let outcome = controller.check_and_trigger(&collection).await;
            log_outcome(&outcome);
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            if matches!(outcome, SummaryOutcome::Error { .. } | SummaryOutcome::SaveFailed { .. }) {
                anyhow::bail!("Auto-summary check did not complete: {}", outcome.status());
            }
        }
        Command::Status => {
            let report = commands::status(store.as_ref(), config.summary.threshold.get()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Purge { pattern, dry_run } => {
            let report = commands::purge(store.as_ref(), &pattern, dry_run).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so `once`/`status` output stays machine readable
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
