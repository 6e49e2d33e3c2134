use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    snapshot::model::{Sidecar, Snapshot},
    sources::SourceDefinition,
};

const MAX_SAME_SECOND_RUNS: usize = 100;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to encode csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to encode metadata: {0}")]
    Json(#[from] serde_json::Error),
}

/// File naming for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLayout {
    pub file_stem: String,
    pub metadata_stem: String,
    pub latest_file: String,
    pub period_key: String,
}

impl From<&SourceDefinition> for SnapshotLayout {
    fn from(source: &SourceDefinition) -> Self {
        Self {
            file_stem: source.file_stem.clone(),
            metadata_stem: source.metadata_stem.clone(),
            latest_file: source.latest_file.clone(),
            period_key: source.period_key.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPaths {
    pub snapshot: PathBuf,
    pub latest: PathBuf,
    pub metadata: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(WrittenPaths),
    /// Nothing was extracted; every existing file was left alone.
    SkippedEmpty,
}

/// Persists snapshots under one output directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn latest_path(&self, layout: &SnapshotLayout) -> PathBuf {
        self.output_dir.join(&layout.latest_file)
    }

    /// Writes the timestamped table, replaces the latest table and writes the
    /// metadata sidecar.
    ///
    /// An empty snapshot writes nothing at all: a transient empty scrape must
    /// never replace the last good "latest" file.
    pub fn write(
        &self,
        snapshot: &Snapshot,
        layout: &SnapshotLayout,
    ) -> Result<WriteOutcome, SnapshotError> {
        if snapshot.is_empty() {
            warn!(
                source = %snapshot.source,
                "no records extracted, keeping previous snapshot"
            );
            return Ok(WriteOutcome::SkippedEmpty);
        }

        fs::create_dir_all(&self.output_dir).map_err(|source| SnapshotError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let body = encode_csv(snapshot)?;
        let (snapshot_path, stamp) =
            self.create_archive(&layout.file_stem, &snapshot.file_timestamp(), &body)?;
        info!(path = %snapshot_path.display(), records = snapshot.record_count(), "snapshot saved");

        let latest_path = self.latest_path(layout);
        replace_file(&latest_path, &body)?;

        let sidecar = Sidecar {
            crawl_time: snapshot.captured_at.to_rfc3339(),
            period: BTreeMap::from([(layout.period_key.clone(), snapshot.period.clone())]),
            record_count: snapshot.record_count(),
            source_url: snapshot.source_url.to_string(),
            checksum: format!("{:x}", md5::compute(&body)),
        };
        let metadata_path = self
            .output_dir
            .join(format!("{}_{}.json", layout.metadata_stem, stamp));
        create_new_file(&metadata_path, &serde_json::to_vec_pretty(&sidecar)?)?;

        Ok(WriteOutcome::Written(WrittenPaths {
            snapshot: snapshot_path,
            latest: latest_path,
            metadata: metadata_path,
        }))
    }

    /// Writes the timestamped table without touching an existing archive.
    /// Runs captured in the same second get `_1`, `_2`, ... appended to the
    /// stamp; the returned stamp is reused for the sidecar.
    fn create_archive(
        &self,
        file_stem: &str,
        base_stamp: &str,
        contents: &[u8],
    ) -> Result<(PathBuf, String), SnapshotError> {
        let mut stamp = base_stamp.to_string();
        let mut attempt = 0;
        loop {
            let path = self.output_dir.join(format!("{file_stem}_{stamp}.csv"));
            match create_new_file(&path, contents) {
                Ok(()) => return Ok((path, stamp)),
                Err(SnapshotError::Io { source, .. })
                    if source.kind() == io::ErrorKind::AlreadyExists
                        && attempt < MAX_SAME_SECOND_RUNS =>
                {
                    attempt += 1;
                    warn!(path = %path.display(), "snapshot already exists for this second");
                    stamp = format!("{base_stamp}_{attempt}");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn encode_csv(snapshot: &Snapshot) -> Result<Vec<u8>, SnapshotError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&snapshot.columns)?;
    for record in &snapshot.records {
        writer.write_record(record.values().iter().map(|v| single_line(v)))?;
    }
    writer
        .into_inner()
        .map_err(|e| SnapshotError::Csv(e.into_error().into()))
}

/// Fields never carry raw line breaks, so every record is exactly one line.
fn single_line(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), SnapshotError> {
    fs::write(path, contents).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create_new_file(path: &Path, contents: &[u8]) -> Result<(), SnapshotError> {
    let io_error = |source: io::Error| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(io_error)?;
    file.write_all(contents).map_err(io_error)
}

/// Whole-file replacement: readers see either the old or the new table.
fn replace_file(path: &Path, contents: &[u8]) -> Result<(), SnapshotError> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    write_file(&staging, contents)?;
    fs::rename(&staging, path).map_err(|source| {
        let _ = fs::remove_file(&staging);
        SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}
