use anyhow::Context;
use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    extractor::{self, Extraction},
    fetcher::{PageLoader, PageResponse},
    jobs::{JobHandler, JobOutcome},
    normalizer,
    page::HtmlPage,
    snapshot::{Snapshot, SnapshotLayout, SnapshotWriter, WriteOutcome},
    sources::SourceDefinition,
};

/// Fetch, extract, normalize and persist one source.
#[derive(Clone)]
pub struct SourcePipeline {
    source: SourceDefinition,
    loader: Arc<dyn PageLoader>,
    writer: SnapshotWriter,
}

impl SourcePipeline {
    pub fn new(source: SourceDefinition, loader: Arc<dyn PageLoader>, writer: SnapshotWriter) -> Self {
        Self {
            source,
            loader,
            writer,
        }
    }

    pub fn source(&self) -> &SourceDefinition {
        &self.source
    }

    /// Builds the snapshot for a fetched page, or an empty one when the fetch
    /// degraded to nothing. Parsing stays in this synchronous scope because
    /// the parsed document cannot cross an await point.
    fn build_snapshot(&self, response: Option<&PageResponse>) -> Snapshot {
        let extraction = match response {
            Some(response) => {
                let page = HtmlPage::from_response(response);
                extractor::extract(&self.source.rules, &page)
            }
            None => Extraction::default(),
        };
        if extraction.skipped_rows > 0 {
            warn!(
                source = %self.source.name,
                skipped = extraction.skipped_rows,
                "some rows could not be read"
            );
        }

        Snapshot {
            source: self.source.name.clone(),
            columns: self.source.columns.clone(),
            records: normalizer::normalize(&extraction.rows, &self.source.columns),
            period: extraction.metadata.period,
            captured_at: Local::now(),
            source_url: response
                .map(|r| r.url_final.clone())
                .unwrap_or_else(|| self.source.url.clone()),
        }
    }
}

#[async_trait]
impl JobHandler for SourcePipeline {
    #[instrument(skip(self), fields(source = %self.source.name))]
    async fn run(&self) -> anyhow::Result<JobOutcome> {
        info!("Fetching {}", self.source.url);

        let response = match self.loader.load(&self.source.url, &self.source.fetch).await {
            Ok(response) => Some(response),
            Err(e) if e.is_transient() => {
                warn!(error = %e, "transient fetch failure, treating page as empty");
                None
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to fetch {}", self.source.url));
            }
        };

        let snapshot = self.build_snapshot(response.as_ref());
        let layout = SnapshotLayout::from(&self.source);

        match self
            .writer
            .write(&snapshot, &layout)
            .with_context(|| format!("failed to write snapshot for {}", self.source.name))?
        {
            WriteOutcome::Written(paths) => {
                info!(
                    records = snapshot.record_count(),
                    latest = %paths.latest.display(),
                    "snapshot written"
                );
                Ok(JobOutcome::Written {
                    records: snapshot.record_count(),
                    paths,
                })
            }
            WriteOutcome::SkippedEmpty => Ok(JobOutcome::Empty),
        }
    }

    fn name(&self) -> &str {
        &self.source.name
    }
}
