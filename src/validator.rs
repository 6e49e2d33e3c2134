//! Checks a source's "latest" snapshot before anyone downstream trusts it.
//!
//! Hard failures: the file is missing, unreadable, or lacks a required
//! column. Empty values in data-quality columns are only counted and logged.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{snapshot::read_table, sources::SourceDefinition};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Columns the header must contain.
    pub required: Vec<String>,
    /// Columns where empty values are reported as warnings.
    pub quality: Vec<String>,
}

impl ValidationRules {
    pub fn new(required: &[&str], quality: &[&str]) -> Self {
        Self {
            required: required.iter().map(|c| c.to_string()).collect(),
            quality: quality.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("snapshot not found: {0}")]
    Missing(PathBuf),

    #[error("failed to read {path}: {source}")]
    Unreadable { path: PathBuf, source: csv::Error },

    #[error("missing required columns: {0:?}")]
    MissingColumns(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub rows: usize,
    /// Empty-value counts per data-quality column; only non-zero entries.
    pub empty_values: BTreeMap<String, usize>,
}

impl ValidationReport {
    pub fn warning_count(&self) -> usize {
        self.empty_values.values().sum()
    }

    pub fn has_warnings(&self) -> bool {
        !self.empty_values.is_empty()
    }
}

pub fn validate_file(path: &Path, rules: &ValidationRules) -> Result<ValidationReport, ValidationError> {
    if !path.exists() {
        return Err(ValidationError::Missing(path.to_path_buf()));
    }

    let table = read_table(path).map_err(|source| ValidationError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), rows = table.rows.len(), "snapshot loaded");

    let missing: Vec<String> = rules
        .required
        .iter()
        .filter(|column| table.column_index(column).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns(missing));
    }

    let mut report = ValidationReport {
        rows: table.rows.len(),
        empty_values: BTreeMap::new(),
    };
    for column in &rules.quality {
        let Some(values) = table.column(column) else {
            continue;
        };
        let empty = values.filter(|v| v.trim().is_empty()).count();
        if empty > 0 {
            warn!(column = %column, empty, "records with empty values");
            report.empty_values.insert(column.clone(), empty);
        }
    }
    Ok(report)
}

/// Validates `source`'s latest snapshot in `data_dir`, logging the verdict.
pub fn validate_source(
    data_dir: &Path,
    source: &SourceDefinition,
) -> Result<ValidationReport, ValidationError> {
    let path = data_dir.join(&source.latest_file);
    match validate_file(&path, &source.validation) {
        Ok(report) => {
            info!(
                source = %source.name,
                rows = report.rows,
                warnings = report.warning_count(),
                "validation passed"
            );
            Ok(report)
        }
        Err(e) => {
            error!(source = %source.name, error = %e, "validation failed");
            Err(e)
        }
    }
}
