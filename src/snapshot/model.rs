use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

use crate::normalizer::Record;

/// Records from one extraction run plus what is known about the capture.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub source: String,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    pub period: String,
    pub captured_at: DateTime<Local>,
    pub source_url: Url,
}

impl Snapshot {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// `YYYYMMDD_HHMMSS` stamp shared by every file of this run.
    pub fn file_timestamp(&self) -> String {
        self.captured_at.format("%Y%m%d_%H%M%S").to_string()
    }
}

/// Contents of the per-run JSON sidecar. The period lands under a
/// source-specific key (`period` or `date_range`).
#[derive(Debug, Clone, Serialize)]
pub struct Sidecar {
    pub crawl_time: String,
    #[serde(flatten)]
    pub period: BTreeMap<String, String>,
    pub record_count: usize,
    pub source_url: String,
    pub checksum: String,
}
