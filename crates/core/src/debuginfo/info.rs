use std::collections::HashMap;

use serde::Serialize;

use crate::debuginfo::DebugFunctionInfo;
use crate::types::Type;

/// A named type recorded in a [`DebugInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugType {
    pub name: String,
    pub ty: Type,
    /// Parser that contributed the entry, when added during a parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A function recorded in a [`DebugInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugFunction {
    #[serde(flatten)]
    pub info: DebugFunctionInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Counts reported by [`DebugInfo::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub types_added: usize,
    pub types_skipped: usize,
    pub functions_added: usize,
    pub functions_skipped: usize,
}

/// Accumulator that parsers populate with discovered types and functions.
///
/// Entries are keyed by type name and function address. The first entry for
/// a key wins; later additions for the same key are rejected, never merged
/// field by field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DebugInfo {
    types: Vec<DebugType>,
    functions: Vec<DebugFunction>,
    #[serde(skip)]
    type_index: HashMap<String, usize>,
    #[serde(skip)]
    function_index: HashMap<u64, usize>,
    #[serde(skip)]
    current_source: Option<String>,
}

impl DebugInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a named type. Returns `false` if the name is empty or already taken.
    pub fn add_type(&mut self, name: impl Into<String>, new_type: Type) -> bool {
        let name = name.into();
        if name.is_empty() {
            tracing::warn!(source = ?self.current_source, "rejected debug type with empty name");
            return false;
        }
        if self.type_index.contains_key(&name) {
            tracing::debug!(name = %name, source = ?self.current_source, "debug type already present");
            return false;
        }
        self.type_index.insert(name.clone(), self.types.len());
        self.types.push(DebugType { name, ty: new_type, source: self.current_source.clone() });
        true
    }

    /// Record a function. Returns `false` for nameless records and for
    /// addresses that already have a function.
    pub fn add_function(&mut self, new_func: DebugFunctionInfo) -> bool {
        if new_func.is_anonymous() {
            tracing::warn!(
                address = new_func.address(),
                source = ?self.current_source,
                "rejected debug function without any name"
            );
            return false;
        }
        let address = new_func.address();
        if self.function_index.contains_key(&address) {
            tracing::debug!(
                address,
                name = new_func.display_name(),
                source = ?self.current_source,
                "debug function already present at address"
            );
            return false;
        }
        self.function_index.insert(address, self.functions.len());
        self.functions.push(DebugFunction { info: new_func, source: self.current_source.clone() });
        true
    }

    pub fn types(&self) -> &[DebugType] {
        &self.types
    }

    pub fn get_type(&self, name: &str) -> Option<&Type> {
        self.type_index.get(name).map(|&idx| &self.types[idx].ty)
    }

    pub fn type_source(&self, name: &str) -> Option<&str> {
        self.type_index.get(name).and_then(|&idx| self.types[idx].source.as_deref())
    }

    pub fn functions(&self) -> &[DebugFunction] {
        &self.functions
    }

    pub fn function_at(&self, address: u64) -> Option<&DebugFunctionInfo> {
        self.function_index.get(&address).map(|&idx| &self.functions[idx].info)
    }

    pub fn function_source(&self, address: u64) -> Option<&str> {
        self.function_index.get(&address).and_then(|&idx| self.functions[idx].source.as_deref())
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.functions.is_empty()
    }

    /// Fold `other` into `self` with the usual first-wins rules.
    ///
    /// Entries keep the source attribution they had in `other`.
    pub fn merge(&mut self, other: DebugInfo) -> MergeStats {
        let mut stats = MergeStats::default();
        let previous = self.current_source.take();

        for entry in other.types {
            self.current_source = entry.source;
            if self.add_type(entry.name, entry.ty) {
                stats.types_added += 1;
            } else {
                stats.types_skipped += 1;
            }
        }
        for entry in other.functions {
            self.current_source = entry.source;
            if self.add_function(entry.info) {
                stats.functions_added += 1;
            } else {
                stats.functions_skipped += 1;
            }
        }

        self.current_source = previous;
        stats
    }

    /// Attribute subsequent additions to `source`, returning the previous attribution.
    pub(crate) fn set_source(&mut self, source: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.current_source, source)
    }
}
