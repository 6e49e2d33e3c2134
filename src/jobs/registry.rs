use anyhow::{Result, anyhow};
use std::{collections::HashMap, sync::Arc};

use crate::{
    fetcher::PageLoader,
    jobs::{JobHandler, handlers::SourcePipeline},
    snapshot::SnapshotWriter,
    sources::SourceCatalog,
};

/// Registry of job handlers by source name
#[derive(Default)]
pub struct JobRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// One extraction pipeline per source in `catalog`, all sharing `loader`
    /// and `writer`.
    pub fn for_catalog(
        catalog: &SourceCatalog,
        loader: Arc<dyn PageLoader>,
        writer: SnapshotWriter,
    ) -> Self {
        let mut registry = Self::new();
        for source in catalog.iter() {
            registry.register(SourcePipeline::new(
                source.clone(),
                loader.clone(),
                writer.clone(),
            ));
        }
        registry
    }

    /// Register a handler under its own name, replacing any previous one
    pub fn register<H: JobHandler>(&mut self, handler: H) {
        self.handlers
            .insert(handler.name().to_string(), Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn JobHandler>> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("No handler registered for source: {}", name))
    }

    /// All registered source names, sorted
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::MockPageLoader;
    use crate::jobs::JobOutcome;
    use async_trait::async_trait;

    struct NoopHandler;

    #[async_trait]
    impl JobHandler for NoopHandler {
        async fn run(&self) -> anyhow::Result<JobOutcome> {
            Ok(JobOutcome::Empty)
        }

        fn name(&self) -> &str {
            "noop"
        }
    }

    #[test]
    fn test_registry_registration() {
        let mut registry = JobRegistry::new();
        registry.register(NoopHandler);

        assert_eq!(registry.registered_names(), vec!["noop"]);
        assert!(registry.get("noop").is_ok());
        assert!(registry.get("unknown").is_err());
    }

    #[test]
    fn test_registry_for_catalog() {
        let registry = JobRegistry::for_catalog(
            &SourceCatalog::builtin(),
            Arc::new(MockPageLoader::new()),
            SnapshotWriter::new("./data"),
        );

        assert_eq!(
            registry.registered_names(),
            vec!["google_finance", "investing", "marketwatch"]
        );
    }
}
