//! Discovery Worker
//!
//! Runs continuous discovery on a cron schedule, or a single workflow on
//! demand. Every run is journaled in Postgres, so re-running with the same
//! `--workflow-id` resumes instead of starting over.

use anyhow::{Context, Result};
use clap::Parser;
use durable::WorkflowContext;
use server_core::domains::discovery::{DorkSweepRequest, DorkSweepWorkflow};
use server_core::kernel::scheduled_tasks::{run_continuous_discovery, start_scheduler};
use server_core::kernel::ServerDeps;
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "worker", about = "Company discovery and career-page crawl worker")]
struct Args {
    /// Run one continuous discovery and exit instead of scheduling.
    #[arg(long)]
    once: bool,

    /// Apply database migrations before starting.
    #[arg(long)]
    migrate: bool,

    /// Run one dork sweep for KEYWORD and exit.
    #[arg(long, value_name = "KEYWORD", conflicts_with = "once")]
    dork_sweep: Option<String>,

    /// Workflow id for a one-shot run; reuse an id to resume that run.
    #[arg(long, value_name = "ID")]
    workflow_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,durable=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    tracing::info!("Starting discovery worker");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    if args.migrate {
        tracing::info!("Running migrations");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    let deps = ServerDeps::from_config(&config, pool)?;

    if let Some(keyword) = args.dork_sweep {
        let workflow_id = args
            .workflow_id
            .unwrap_or_else(|| format!("dork-sweep-{}", Uuid::now_v7()));
        let ctx = WorkflowContext::new(workflow_id.as_str(), deps.journal.clone());
        let result = DorkSweepWorkflow::new(deps)
            .run(&ctx, DorkSweepRequest::new(keyword))
            .await?;

        tracing::info!(
            workflow_id = %workflow_id,
            urls_found = result.urls_found,
            urls_queued = result.urls_queued,
            "Dork sweep finished"
        );
        return Ok(());
    }

    if args.once {
        let workflow_id = args
            .workflow_id
            .unwrap_or_else(|| format!("continuous-discovery-{}", Uuid::now_v7()));
        run_continuous_discovery(&deps, config.discovery.clone(), &workflow_id).await?;
        return Ok(());
    }

    let mut scheduler = start_scheduler(
        deps,
        &config.discovery_cron,
        config.discovery.clone(),
        chrono::Duration::days(config.journal_retention_days),
    )
    .await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down discovery worker");
    scheduler.shutdown().await?;

    Ok(())
}
