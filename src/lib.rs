pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod jobs;
pub mod normalizer;
pub mod page;
pub mod report;
pub mod snapshot;
pub mod sources;
pub mod telemetry;
pub mod validator;
