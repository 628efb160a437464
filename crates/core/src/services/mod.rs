//! Workflows that combine views, parsers and the project database.

pub mod ingest;

pub use ingest::{load_persisted, DebugInfoRunner, IngestError, IngestOutcome, IngestRequest};
