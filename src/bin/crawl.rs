use anyhow::{Context, Result};
use clap::Parser;
use marketcal::{
    config::Config,
    fetcher::HttpPageLoader,
    jobs::{JobHandler, JobOutcome, SourcePipeline},
    snapshot::SnapshotWriter,
    telemetry,
};
use std::{path::PathBuf, process::ExitCode, sync::Arc};
use tracing::{info, warn};

/// Exit status when the page yielded no records and nothing was written.
const EXIT_EMPTY: u8 = 2;

#[derive(Parser)]
#[command(name = "crawl", about = "Run one source pipeline once and exit")]
struct Cli {
    /// Source name (`marketwatch`, `investing`, `google_finance`) or a
    /// schedule job name such as `investing_morning`
    source: String,

    /// Path to the JSON config file (defaults to $MARKETCAL_CONFIG or ./config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory snapshots are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_args(cli.config.as_deref());
    if let Some(dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }

    let catalog = config.catalog();
    let source = catalog.resolve_job(&cli.source).with_context(|| {
        format!(
            "unknown source '{}' (known: {})",
            cli.source,
            catalog.names().collect::<Vec<_>>().join(", ")
        )
    })?;

    let pipeline = SourcePipeline::new(
        source.clone(),
        Arc::new(HttpPageLoader::new()?),
        SnapshotWriter::new(config.output_dir()),
    );

    match pipeline.run().await? {
        JobOutcome::Written { records, paths } => {
            info!(
                records,
                snapshot = %paths.snapshot.display(),
                latest = %paths.latest.display(),
                metadata = %paths.metadata.display(),
                "crawl finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        JobOutcome::Empty => {
            warn!(source = %source.name, "crawl finished without records");
            Ok(ExitCode::from(EXIT_EMPTY))
        }
    }
}
