use anyhow::Result;
use clap::Parser;
use marketcal::{
    config::Config,
    fetcher::HttpPageLoader,
    jobs::{JobRegistry, Scheduler, SchedulerConfig, plan_jobs},
    snapshot::SnapshotWriter,
    telemetry,
};
use std::{path::PathBuf, sync::Arc};
use tracing::info;

#[derive(Parser)]
#[command(name = "scheduler", about = "Run every configured source on its daily schedule")]
struct Cli {
    /// Path to the JSON config file (defaults to $MARKETCAL_CONFIG or ./config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory snapshots are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_args(cli.config.as_deref());
    if let Some(dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }
    info!(output_dir = %config.output_dir().display(), "configuration resolved");

    let catalog = config.catalog();
    let registry = JobRegistry::for_catalog(
        &catalog,
        Arc::new(HttpPageLoader::new()?),
        SnapshotWriter::new(config.output_dir()),
    );
    let jobs = plan_jobs(config.schedule(), &catalog, &registry)?;

    let scheduler = Scheduler::new(
        jobs,
        SchedulerConfig {
            poll_interval: config.poll_interval(),
        },
    )?;
    scheduler.listen_for_ctrl_c();
    scheduler.run().await;

    Ok(())
}
