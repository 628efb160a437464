//! Debug-info parsers and the collectors they populate.
//!
//! The intended workflow for a parser:
//! - implement [`CustomDebugInfoParser`] and register it under a unique name,
//!   either in a [`ParserRegistry`] or process-wide via
//!   [`DebugInfoParser::register`];
//! - in `is_valid`, cheaply decide whether the view carries data this parser
//!   understands (a section, a magic value, a sidecar file);
//! - in `parse_info`, add named types first, then [`DebugFunctionInfo`]
//!   records whose return and parameter types refer to them.
//!
//! Collected results are merged and persisted by [`crate::services::ingest`].

mod function;
mod info;
mod parser;
pub mod registry;

pub use function::DebugFunctionInfo;
pub use info::{DebugFunction, DebugInfo, DebugType, MergeStats};
pub use parser::{CustomDebugInfoParser, DebugInfoParser};
pub use registry::{
    global_snapshot, run_parsers, run_parsers_with, ParserOutcome, ParserRegistry, ParserRun,
};
