use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::debuginfo::{CustomDebugInfoParser, DebugInfo, DebugInfoParser};
use crate::error::{DebugInfoError, DebugInfoResult};
use crate::view::BinaryView;

/// Result of running one parser as part of [`ParserRegistry::parse_view`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserOutcome {
    pub parser: String,
    /// Entries the parser produced on its own.
    pub types_found: usize,
    pub functions_found: usize,
    /// Entries that survived merging with earlier parsers.
    pub types_added: usize,
    pub functions_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParserOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Registry of debug-info parsers; callers select by name.
///
/// Cloning a registry clones handles, so parsers keep their identity.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: Vec<DebugInfoParser>,
    by_name: HashMap<String, usize>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self { parsers: Vec::new(), by_name: HashMap::new() }
    }

    /// Register `parser_callbacks` under `name` and return its handle.
    pub fn register<C>(&mut self, name: &str, parser_callbacks: C) -> DebugInfoResult<DebugInfoParser>
    where
        C: CustomDebugInfoParser,
    {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed != name {
            return Err(DebugInfoError::InvalidName(name.to_string()));
        }
        if self.by_name.contains_key(name) {
            return Err(DebugInfoError::DuplicateParser(name.to_string()));
        }

        let parser = DebugInfoParser::new(name.to_string(), Box::new(parser_callbacks));
        self.by_name.insert(name.to_string(), self.parsers.len());
        self.parsers.push(parser.clone());
        tracing::debug!(parser = name, "registered debug-info parser");
        Ok(parser)
    }

    /// Registered parsers in registration order.
    pub fn list(&self) -> Vec<DebugInfoParser> {
        self.parsers.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DebugInfoParser> {
        self.parsers.iter()
    }

    pub fn get(&self, name: &str) -> Option<DebugInfoParser> {
        self.by_name.get(name).map(|&idx| self.parsers[idx].clone())
    }

    pub fn parser(&self, name: &str) -> DebugInfoResult<DebugInfoParser> {
        self.get(name).ok_or_else(|| DebugInfoError::UnknownParser(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered parser names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.parsers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    pub fn parsers_for_view(&self, view: &BinaryView) -> Vec<DebugInfoParser> {
        self.parsers.iter().filter(|p| p.is_valid_for_view(view)).cloned().collect()
    }

    /// Run every parser valid for `view`, merging results in registration order.
    pub fn parse_view(&self, view: &BinaryView) -> (DebugInfo, Vec<ParserOutcome>) {
        run_parsers(&self.parsers_for_view(view), view)
    }
}

/// One parser's pass over a view, as seen by the hook of [`run_parsers_with`].
pub struct ParserRun<'a> {
    pub parser: &'a DebugInfoParser,
    /// What this parser produced on its own, before merging.
    pub info: &'a DebugInfo,
    pub error: Option<&'a str>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Run `parsers` over `view` one by one and merge their collectors.
///
/// A failing parser does not stop the others; whatever it added before
/// failing is still merged.
pub fn run_parsers(parsers: &[DebugInfoParser], view: &BinaryView) -> (DebugInfo, Vec<ParserOutcome>) {
    run_parsers_with(parsers, view, |_| Ok::<(), Infallible>(())).unwrap_or_else(|never| match never {})
}

/// [`run_parsers`] with `after_parse` called for each parser before its
/// results are merged.
///
/// An error from the hook stops the run and is returned.
pub fn run_parsers_with<E>(
    parsers: &[DebugInfoParser],
    view: &BinaryView,
    mut after_parse: impl FnMut(ParserRun<'_>) -> Result<(), E>,
) -> Result<(DebugInfo, Vec<ParserOutcome>), E> {
    let mut merged = DebugInfo::new();
    let mut outcomes = Vec::with_capacity(parsers.len());

    for parser in parsers {
        let started_at = Utc::now();
        let mut own = DebugInfo::new();
        let error = parser.parse_into(&mut own, view).err().map(|e| e.to_string());
        after_parse(ParserRun {
            parser,
            info: &own,
            error: error.as_deref(),
            started_at,
            finished_at: Utc::now(),
        })?;

        let types_found = own.type_count();
        let functions_found = own.function_count();
        let stats = merged.merge(own);
        outcomes.push(ParserOutcome {
            parser: parser.name().to_string(),
            types_found,
            functions_found,
            types_added: stats.types_added,
            functions_added: stats.functions_added,
            error,
        });
    }

    Ok((merged, outcomes))
}

static GLOBAL_REGISTRY: Lazy<RwLock<ParserRegistry>> =
    Lazy::new(|| RwLock::new(crate::parsers::default_parser_registry()));

/// Copy of the process-wide registry, including the built-in parsers.
///
/// Later registrations are not reflected in the copy.
pub fn global_snapshot() -> ParserRegistry {
    with_global(|r| r.clone())
}

/// Read access to the process-wide registry.
///
/// Parser callbacks must not run inside `f`; callers clone handles out first.
pub(crate) fn with_global<T>(f: impl FnOnce(&ParserRegistry) -> T) -> T {
    let guard = GLOBAL_REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    f(&guard)
}

pub(crate) fn with_global_mut<T>(f: impl FnOnce(&mut ParserRegistry) -> T) -> T {
    let mut guard = GLOBAL_REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}
