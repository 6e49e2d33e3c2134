use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use marketcal::{
    config::Config,
    report::{ReportError, SummaryReport},
    sources::{investing, marketwatch},
    telemetry,
};
use std::{path::PathBuf, process::ExitCode};
use tracing::{info, warn};

/// Exit status when there was no snapshot to summarize.
const EXIT_NO_DATA: u8 = 2;

#[derive(Parser)]
#[command(name = "report", about = "Summarize the latest economic and earnings snapshots")]
struct Cli {
    /// Path to the JSON config file (defaults to $MARKETCAL_CONFIG or ./config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the snapshots
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory the summary is written to
    #[arg(long)]
    report_dir: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_args(cli.config.as_deref());
    if let Some(dir) = cli.data_dir {
        config = config.with_output_dir(dir);
    }
    let report_dir = cli
        .report_dir
        .unwrap_or_else(|| config.report_dir().to_path_buf());

    let catalog = config.catalog();
    let economic = catalog
        .get(marketwatch::NAME)
        .context("economic calendar source is not configured")?;
    let earnings = catalog
        .get(investing::NAME)
        .context("earnings calendar source is not configured")?;

    let report = match SummaryReport::build(
        config.output_dir(),
        economic,
        earnings,
        Local::now().date_naive(),
    ) {
        Ok(report) => report,
        Err(ReportError::NoData) => {
            warn!(data_dir = %config.output_dir().display(), "no snapshot data to analyze");
            return Ok(ExitCode::from(EXIT_NO_DATA));
        }
        Err(e) => return Err(e.into()),
    };

    let path = report.write(&report_dir)?;
    info!(path = %path.display(), "analysis complete");
    Ok(ExitCode::SUCCESS)
}
