use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::debuginfo::{registry, DebugInfo};
use crate::error::{DebugInfoError, DebugInfoResult, ParseError};
use crate::view::BinaryView;

/// Callbacks a debug-info plugin supplies when it registers.
pub trait CustomDebugInfoParser: Send + Sync + 'static {
    /// Whether this parser has anything to contribute for `view`.
    fn is_valid(&self, view: &BinaryView) -> bool;

    /// Populate `debug_info` with whatever can be recovered from `view`.
    fn parse_info(&self, debug_info: &mut DebugInfo, view: &BinaryView) -> Result<(), ParseError>;
}

struct Registration {
    name: String,
    callbacks: Box<dyn CustomDebugInfoParser>,
}

/// Handle to a registered debug-info parser.
///
/// Handles are cheap to clone. Two handles are equal only when they refer to
/// the same registration; a second parser registered under a different
/// registry with the same name is a different parser.
#[derive(Clone)]
pub struct DebugInfoParser {
    inner: Arc<Registration>,
}

impl DebugInfoParser {
    pub(crate) fn new(name: String, callbacks: Box<dyn CustomDebugInfoParser>) -> Self {
        Self { inner: Arc::new(Registration { name, callbacks }) }
    }

    /// All parsers in the process-wide registry, in registration order.
    pub fn list() -> Vec<DebugInfoParser> {
        registry::with_global(|r| r.list())
    }

    /// Look up a parser in the process-wide registry.
    pub fn by_name(name: &str) -> Option<DebugInfoParser> {
        registry::with_global(|r| r.get(name))
    }

    /// Like [`by_name`](Self::by_name), but unknown names are an error.
    pub fn lookup(name: &str) -> DebugInfoResult<DebugInfoParser> {
        registry::with_global(|r| r.parser(name))
    }

    /// Register a parser in the process-wide registry.
    pub fn register<C>(name: &str, parser_callbacks: C) -> DebugInfoResult<DebugInfoParser>
    where
        C: CustomDebugInfoParser,
    {
        registry::with_global_mut(|r| r.register(name, parser_callbacks))
    }

    /// Parsers in the process-wide registry that accept `view`.
    pub fn valid_for_view(view: &BinaryView) -> Vec<DebugInfoParser> {
        registry::with_global(|r| r.list()).into_iter().filter(|p| p.is_valid_for_view(view)).collect()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Run the parser's validity callback. A panicking callback counts as `false`.
    pub fn is_valid_for_view(&self, view: &BinaryView) -> bool {
        let result =
            panic::catch_unwind(AssertUnwindSafe(|| self.inner.callbacks.is_valid(view)));
        match result {
            Ok(valid) => valid,
            Err(payload) => {
                tracing::error!(
                    parser = %self.inner.name,
                    view = view.name(),
                    panic = %panic_message(payload.as_ref()),
                    "debug-info parser validity check panicked"
                );
                false
            }
        }
    }

    /// Parse `view` into a fresh [`DebugInfo`].
    pub fn parse_debug_info(&self, view: &BinaryView) -> DebugInfoResult<DebugInfo> {
        let mut debug_info = DebugInfo::new();
        self.parse_into(&mut debug_info, view)?;
        Ok(debug_info)
    }

    /// Parse `view` into an existing collector.
    ///
    /// Entries added before a failure stay in `debug_info`.
    pub fn parse_into(&self, debug_info: &mut DebugInfo, view: &BinaryView) -> DebugInfoResult<()> {
        let name = &self.inner.name;
        tracing::info!(parser = %name, view = view.name(), "parsing debug info");
        let types_before = debug_info.type_count();
        let functions_before = debug_info.function_count();

        let previous = debug_info.set_source(Some(name.clone()));
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.inner.callbacks.parse_info(debug_info, view)
        }));
        debug_info.set_source(previous);

        match result {
            Ok(Ok(())) => {
                tracing::info!(
                    parser = %name,
                    view = view.name(),
                    types_added = debug_info.type_count() - types_before,
                    functions_added = debug_info.function_count() - functions_before,
                    "finished parsing debug info"
                );
                Ok(())
            }
            Ok(Err(err)) => {
                tracing::error!(parser = %name, view = view.name(), error = %err, "debug-info parser failed");
                Err(DebugInfoError::ParserFailed { parser: name.clone(), message: err.to_string() })
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(parser = %name, view = view.name(), panic = %message, "debug-info parser panicked");
                Err(DebugInfoError::ParserPanicked { parser: name.clone(), message })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl PartialEq for DebugInfoParser {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for DebugInfoParser {}

impl Hash for DebugInfoParser {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.inner) as usize).hash(state);
    }
}

impl fmt::Display for DebugInfoParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<debug-info parser: '{}'>", self.inner.name)
    }
}

impl fmt::Debug for DebugInfoParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugInfoParser").field("name", &self.inner.name).finish()
    }
}
