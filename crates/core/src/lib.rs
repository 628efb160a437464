//! debuginfo-core
//!
//! Core library for registering debug-info parsers, running them over
//! binaries, and recording what they find.
//!
//! The crate defines the binary view parsers inspect, the parser registry
//! and callback trait, the value types parsers report (types and function
//! records), the collector those values are added to, and the SQLite
//! project database parsed results are forwarded into.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends.

pub mod db;
pub mod debuginfo;
pub mod error;
pub mod parsers;
pub mod services;
pub mod types;
pub mod view;

pub use debuginfo::{
    CustomDebugInfoParser, DebugFunctionInfo, DebugInfo, DebugInfoParser, ParserRegistry,
};
pub use error::{DebugInfoError, DebugInfoResult, ParseError};
pub use types::Type;
pub use view::BinaryView;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
