//! Built-in debug-info parsers.
//!
//! Real debug formats are left to plugins. The built-ins here cover data every
//! container already has, so a fresh registry can do something useful.

#[cfg(feature = "symtab-parser")]
pub mod symtab;

#[cfg(feature = "symtab-parser")]
pub use symtab::SymbolTableParser;

use crate::debuginfo::ParserRegistry;

/// Registry populated with the built-in parsers enabled at compile time.
pub fn default_parser_registry() -> ParserRegistry {
    #[allow(unused_mut)]
    let mut registry = ParserRegistry::new();
    #[cfg(feature = "symtab-parser")]
    {
        if let Err(err) = registry.register(symtab::PARSER_NAME, SymbolTableParser) {
            tracing::warn!(error = %err, "failed to register built-in symbol-table parser");
        }
    }
    registry
}
