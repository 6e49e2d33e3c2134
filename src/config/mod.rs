//! Runtime configuration.
//!
//! Settings come from a JSON file (`config.json` by default, or the path in
//! `MARKETCAL_CONFIG`) with a few environment overrides on top. Loading never
//! fails: an unreadable or malformed file falls back to the built-in
//! defaults, and a bad schedule entry keeps its default fire time.

use chrono::NaiveTime;
use serde::Deserialize;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::sources::{SourceCatalog, SourceDefinition};

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "MARKETCAL_CONFIG";
pub const ENV_OUTPUT_DIR: &str = "MARKETCAL_OUTPUT_DIR";
pub const ENV_POLL_INTERVAL_SECS: &str = "MARKETCAL_POLL_INTERVAL_SECS";

const DEFAULT_CONFIG_PATH: &str = "config.json";
const DEFAULT_OUTPUT_DIR: &str = "./data";
const DEFAULT_REPORT_DIR: &str = "./reports";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_SCHEDULE: [(&str, &str); 4] = [
    ("marketwatch_morning", "09:00"),
    ("marketwatch_evening", "18:00"),
    ("investing_morning", "09:30"),
    ("investing_evening", "18:30"),
];

/// A named set of daily fire times, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub name: String,
    pub times: Vec<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    output_dir: PathBuf,
    report_dir: PathBuf,
    poll_interval: Duration,
    schedule: Vec<ScheduleEntry>,
    sources: Vec<SourceDefinition>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    output_directory: Option<PathBuf>,
    report_directory: Option<PathBuf>,
    poll_interval_secs: Option<u64>,
    schedule: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    sources: Vec<SourceDefinition>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            schedule: default_schedule(),
            sources: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the file named by `MARKETCAL_CONFIG` (or `config.json`), then
    /// applies environment overrides.
    pub fn from_env() -> Self {
        let path = env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(Path::new(&path)).with_env_overrides()
    }

    /// Same as [`Config::from_env`], except an explicit `path` wins over
    /// `MARKETCAL_CONFIG`.
    pub fn from_args(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load(path).with_env_overrides(),
            None => Self::from_env(),
        }
    }

    /// Reads `path`, falling back to defaults when it is missing or malformed.
    pub fn load(path: &Path) -> Self {
        let result = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|raw| Self::from_json(&raw));
        match result {
            Ok(config) => {
                info!(path = %path.display(), "configuration loaded");
                config
            }
            Err(e) => {
                warn!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Parses a config document. Schedule entries override the default
    /// entry of the same name; a malformed entry keeps its default, and
    /// names without a default are added.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = serde_json::from_str(raw)?;
        let defaults = Self::default();

        let schedule = match file.schedule {
            Some(entries) => merge_schedule(defaults.schedule, entries),
            None => defaults.schedule,
        };

        Ok(Self {
            output_dir: file.output_directory.unwrap_or(defaults.output_dir),
            report_dir: file.report_directory.unwrap_or(defaults.report_dir),
            poll_interval: file
                .poll_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            schedule,
            sources: file.sources,
        })
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = env::var(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(secs) = env::var(ENV_POLL_INTERVAL_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            self.poll_interval = Duration::from_secs(secs);
        }
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Directory snapshots are written to and read from.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
    /// Directory summary reports are written to.
    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
    pub fn schedule(&self) -> &[ScheduleEntry] {
        &self.schedule
    }

    /// Built-in sources with any definitions from the config file layered on top.
    pub fn catalog(&self) -> SourceCatalog {
        let mut catalog = SourceCatalog::builtin();
        for source in &self.sources {
            catalog.insert(source.clone());
        }
        catalog
    }
}

fn default_schedule() -> Vec<ScheduleEntry> {
    DEFAULT_SCHEDULE
        .iter()
        .filter_map(|(name, time)| {
            Some(ScheduleEntry {
                name: name.to_string(),
                times: vec![parse_time(time).ok()?],
            })
        })
        .collect()
}

fn merge_schedule(
    mut schedule: Vec<ScheduleEntry>,
    entries: BTreeMap<String, Value>,
) -> Vec<ScheduleEntry> {
    for (name, value) in entries {
        let existing = schedule.iter().position(|entry| entry.name == name);
        match (parse_entry(&name, &value), existing) {
            (Ok(entry), Some(index)) => schedule[index] = entry,
            (Ok(entry), None) => schedule.push(entry),
            (Err(e), Some(_)) => {
                warn!(job = %name, error = %e, "malformed schedule entry, keeping default")
            }
            (Err(e), None) => warn!(job = %name, error = %e, "skipping schedule entry"),
        }
    }
    schedule
}

fn parse_entry(name: &str, value: &Value) -> Result<ScheduleEntry, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        field: format!("schedule.{name}"),
        reason,
    };
    let raw_times: Vec<&str> = match value {
        Value::String(time) => vec![time.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| invalid(format!("expected \"HH:MM\", got {item}")))
            })
            .collect::<Result<_, _>>()?,
        other => return Err(invalid(format!("expected \"HH:MM\" or a list, got {other}"))),
    };
    if raw_times.is_empty() {
        return Err(invalid("no fire times".to_string()));
    }
    let times = raw_times
        .into_iter()
        .map(|time| parse_time(time).map_err(|e| invalid(format!("'{time}': {e}"))))
        .collect::<Result<_, _>>()?;
    Ok(ScheduleEntry {
        name: name.to_string(),
        times,
    })
}

/// Parses a local wall-clock `HH:MM`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
}
