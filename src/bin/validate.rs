use anyhow::{Result, bail};
use clap::Parser;
use marketcal::{config::Config, telemetry, validator};
use std::{path::PathBuf, process::ExitCode};
use tracing::info;

#[derive(Parser)]
#[command(name = "validate", about = "Check the latest snapshot of each source")]
struct Cli {
    /// Sources to check; defaults to every source on the schedule
    sources: Vec<String>,

    /// Path to the JSON config file (defaults to $MARKETCAL_CONFIG or ./config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the snapshots
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_args(cli.config.as_deref());
    if let Some(dir) = cli.data_dir {
        config = config.with_output_dir(dir);
    }
    let catalog = config.catalog();

    let mut names: Vec<String> = if cli.sources.is_empty() {
        config
            .schedule()
            .iter()
            .filter_map(|entry| catalog.resolve_job(&entry.name))
            .map(|source| source.name.clone())
            .collect()
    } else {
        cli.sources
    };
    names.sort();
    names.dedup();

    let mut failed = 0;
    for name in &names {
        let Some(source) = catalog.resolve_job(name) else {
            bail!("unknown source '{}'", name);
        };
        if validator::validate_source(config.output_dir(), source).is_err() {
            failed += 1;
        }
    }

    info!(checked = names.len(), failed, "validation finished");
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
