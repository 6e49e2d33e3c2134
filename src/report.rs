//! Daily summary over the latest economic and earnings snapshots.

use chrono::NaiveDate;
use serde::Serialize;
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::info;

use crate::{
    snapshot::{Table, read_table},
    sources::SourceDefinition,
};

const PREVIEW_ROWS: usize = 5;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("no snapshot data available")]
    NoData,

    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },

    #[error("failed to write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub record_count: usize,
    pub columns: Vec<String>,
    /// First rows of the snapshot, as written.
    pub preview: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

/// Actual minus forecast, over rows where both are numeric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurpriseStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub date: NaiveDate,
    pub economic: Option<SourceSummary>,
    pub earnings: Option<SourceSummary>,
    pub earnings_by_country: Vec<CountryCount>,
    pub forecast_surprise: Option<SurpriseStats>,
}

impl SummaryReport {
    /// Builds the report from whichever latest snapshots exist in `data_dir`.
    pub fn build(
        data_dir: &Path,
        economic: &SourceDefinition,
        earnings: &SourceDefinition,
        date: NaiveDate,
    ) -> Result<Self, ReportError> {
        let economic_table = load_latest(data_dir, economic)?;
        let earnings_table = load_latest(data_dir, earnings)?;
        if economic_table.is_none() && earnings_table.is_none() {
            return Err(ReportError::NoData);
        }

        Ok(Self {
            date,
            economic: economic_table
                .as_ref()
                .map(|table| summarize(&economic.name, table)),
            earnings: earnings_table
                .as_ref()
                .map(|table| summarize(&earnings.name, table)),
            earnings_by_country: earnings_table
                .as_ref()
                .map(country_distribution)
                .unwrap_or_default(),
            forecast_surprise: economic_table.as_ref().and_then(surprise_stats),
        })
    }

    /// `economic_summary_YYYYMMDD.json`
    pub fn file_name(&self) -> String {
        format!("economic_summary_{}.json", self.date.format("%Y%m%d"))
    }

    /// Writes the report as pretty JSON under `report_dir`, creating it if
    /// needed.
    pub fn write(&self, report_dir: &Path) -> Result<PathBuf, ReportError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| ReportError::Io { path, source }
        };
        fs::create_dir_all(report_dir).map_err(io_error(report_dir))?;
        let path = report_dir.join(self.file_name());
        fs::write(&path, serde_json::to_vec_pretty(self)?).map_err(io_error(&path))?;
        info!(path = %path.display(), "summary report written");
        Ok(path)
    }
}

fn load_latest(data_dir: &Path, source: &SourceDefinition) -> Result<Option<Table>, ReportError> {
    let path = data_dir.join(&source.latest_file);
    if !path.exists() {
        info!(source = %source.name, path = %path.display(), "no snapshot found, skipping");
        return Ok(None);
    }
    let table = read_table(&path).map_err(|source| ReportError::Read {
        path: path.clone(),
        source,
    })?;
    info!(source = %source.name, records = table.rows.len(), "snapshot loaded");
    Ok(Some(table))
}

fn summarize(source: &str, table: &Table) -> SourceSummary {
    SourceSummary {
        source: source.to_string(),
        record_count: table.rows.len(),
        columns: table.headers.clone(),
        preview: table.rows.iter().take(PREVIEW_ROWS).cloned().collect(),
    }
}

/// Record counts per country, most frequent first. Blank countries are not
/// counted.
fn country_distribution(table: &Table) -> Vec<CountryCount> {
    let Some(countries) = table.column("country") else {
        return Vec::new();
    };
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for country in countries.map(str::trim).filter(|c| !c.is_empty()) {
        *counts.entry(country).or_default() += 1;
    }
    let mut distribution: Vec<CountryCount> = counts
        .into_iter()
        .map(|(country, count)| CountryCount {
            country: country.to_string(),
            count,
        })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.country.cmp(&b.country)));
    distribution
}

fn surprise_stats(table: &Table) -> Option<SurpriseStats> {
    let actual = table.column("actual")?;
    let forecast = table.column("forecast")?;
    let differences: Vec<f64> = actual
        .zip(forecast)
        .filter_map(|(a, f)| Some(parse_number(a)? - parse_number(f)?))
        .collect();
    if differences.is_empty() {
        return None;
    }

    let count = differences.len();
    let sum: f64 = differences.iter().sum();
    Some(SurpriseStats {
        count,
        mean: sum / count as f64,
        min: differences.iter().copied().fold(f64::INFINITY, f64::min),
        max: differences.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

/// Lenient parse of a calendar figure: `0.4%`, `1,234`, `-12.5K`, `$3.2B`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (digits, scale) = match cleaned.chars().last()?.to_ascii_uppercase() {
        'K' => (&cleaned[..cleaned.len() - 1], 1e3),
        'M' => (&cleaned[..cleaned.len() - 1], 1e6),
        'B' => (&cleaned[..cleaned.len() - 1], 1e9),
        'T' => (&cleaned[..cleaned.len() - 1], 1e12),
        _ => (cleaned.as_str(), 1.0),
    };
    let value: f64 = digits.parse().ok()?;
    value.is_finite().then_some(value * scale)
}
