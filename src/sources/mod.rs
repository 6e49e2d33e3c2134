//! Built-in source catalogue.
//!
//! A [`SourceDefinition`] is everything the pipeline needs to know about one
//! site: where it lives, how to request it, how to read it, what the output
//! table looks like and what the validator insists on. Layout changes on a
//! site are handled by editing the definition (or overriding it from the
//! config file), never the extraction code.

pub mod google_finance;
pub mod investing;
pub mod marketwatch;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use crate::{extractor::RuleSet, fetcher::FetchOptions, validator::ValidationRules};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    pub name: String,
    pub url: Url,
    #[serde(default)]
    pub fetch: FetchOptions,
    pub rules: RuleSet,
    /// Output column order. Fields the rules do not produce stay empty.
    pub columns: Vec<String>,
    /// Prefix of the timestamped snapshot, e.g. `marketwatch_economic_data`.
    pub file_stem: String,
    /// Prefix of the timestamped metadata sidecar.
    pub metadata_stem: String,
    /// File name of the snapshot that always holds the latest run.
    pub latest_file: String,
    /// Sidecar key under which the page period is recorded.
    #[serde(default = "default_period_key")]
    pub period_key: String,
    #[serde(default)]
    pub validation: ValidationRules,
}

fn default_period_key() -> String {
    "period".to_string()
}

#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: BTreeMap<String, SourceDefinition>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// MarketWatch economic calendar, Investing.com earnings calendar and
    /// Google Finance top stories.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert(marketwatch::definition());
        catalog.insert(investing::definition());
        catalog.insert(google_finance::definition());
        catalog
    }

    /// Adds `source`, replacing any definition with the same name.
    pub fn insert(&mut self, source: SourceDefinition) {
        self.sources.insert(source.name.clone(), source);
    }

    pub fn get(&self, name: &str) -> Option<&SourceDefinition> {
        self.sources.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceDefinition> {
        self.sources.values()
    }

    /// Source a schedule entry belongs to: an exact name match, otherwise the
    /// longest source name followed by `_` at the start of `job_name`
    /// (`investing_evening` belongs to `investing`).
    pub fn resolve_job(&self, job_name: &str) -> Option<&SourceDefinition> {
        if let Some(source) = self.sources.get(job_name) {
            return Some(source);
        }
        self.sources
            .values()
            .filter(|source| {
                job_name
                    .strip_prefix(source.name.as_str())
                    .is_some_and(|rest| rest.starts_with('_'))
            })
            .max_by_key(|source| source.name.len())
    }
}
