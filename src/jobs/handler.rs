use async_trait::async_trait;

use crate::snapshot::WrittenPaths;

/// What a finished run left on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Written { records: usize, paths: WrittenPaths },
    /// Nothing was extracted; the previous snapshot stays current.
    Empty,
}

/// A unit of work the scheduler can fire.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    /// Execute one full pass
    async fn run(&self) -> anyhow::Result<JobOutcome>;

    /// Name of the source this handler serves
    fn name(&self) -> &str;
}
