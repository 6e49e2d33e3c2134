pub mod extract_source;

pub use extract_source::SourcePipeline;
