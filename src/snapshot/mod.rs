//! On-disk snapshot format: a timestamped CSV per run, a "latest" CSV that is
//! replaced wholesale, and a JSON metadata sidecar per run.

pub mod model;
pub mod reader;
pub mod writer;

pub use model::{Sidecar, Snapshot};
pub use reader::{Table, read_table};
pub use writer::{SnapshotError, SnapshotLayout, SnapshotWriter, WriteOutcome, WrittenPaths};
