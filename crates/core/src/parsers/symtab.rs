//! Function records recovered from the container's symbol table.
//!
//! Symbol tables carry names and addresses but no types, so every record has
//! a `void` return type and no parameters. Other parsers registered after this
//! one cannot override it for the same addresses, so register richer parsers
//! first when both apply.

use rustc_demangle::try_demangle;

use crate::debuginfo::{CustomDebugInfoParser, DebugFunctionInfo, DebugInfo};
use crate::error::ParseError;
use crate::view::BinaryView;

pub const PARSER_NAME: &str = "symbols";

pub struct SymbolTableParser;

impl CustomDebugInfoParser for SymbolTableParser {
    fn is_valid(&self, view: &BinaryView) -> bool {
        view.function_symbols().next().is_some()
    }

    fn parse_info(&self, debug_info: &mut DebugInfo, view: &BinaryView) -> Result<(), ParseError> {
        for sym in view.function_symbols() {
            let full_name = demangle(&sym.name);
            let short_name = last_path_segment(&full_name).to_string();
            debug_info.add_function(DebugFunctionInfo::new(
                short_name,
                full_name,
                sym.name.clone(),
                sym.address,
                None,
                Vec::new(),
            ));
        }
        Ok(())
    }
}

/// Demangled name without the trailing hash, or the input when it is not mangled.
fn demangle(raw: &str) -> String {
    match try_demangle(raw) {
        Ok(demangled) => format!("{demangled:#}"),
        Err(_) => raw.to_string(),
    }
}

/// Final `::`-separated component, ignoring separators nested in generics.
fn last_path_segment(name: &str) -> &str {
    let bytes = name.as_bytes();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'(' | b'[' => depth += 1,
            b'>' | b')' | b']' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                start = i + 2;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    &name[start..]
}
