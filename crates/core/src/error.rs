use thiserror::Error;

use crate::view::ViewError;

/// Error raised by parser callbacks.
///
/// Plugins may return any error type; it is boxed at the callback boundary.
pub type ParseError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for the parser registry and parser dispatch.
#[derive(Debug, Error)]
pub enum DebugInfoError {
    /// Lookup of a parser name nothing was registered under.
    #[error("'{0}' is not a valid debug-info parser")]
    UnknownParser(String),

    #[error("A debug-info parser named '{0}' is already registered")]
    DuplicateParser(String),

    #[error("Invalid debug-info parser name: {0:?}")]
    InvalidName(String),

    /// The parser exists but rejected the view.
    #[error("Debug-info parser '{parser}' is not valid for view '{view}'")]
    NotValidForView { parser: String, view: String },

    #[error("Debug-info parser '{parser}' failed: {message}")]
    ParserFailed { parser: String, message: String },

    #[error("Debug-info parser '{parser}' panicked: {message}")]
    ParserPanicked { parser: String, message: String },

    #[error(transparent)]
    View(#[from] ViewError),
}

/// Convenience result type for registry and parser operations.
pub type DebugInfoResult<T> = Result<T, DebugInfoError>;
