use serde::{Deserialize, Serialize};

use crate::view::BinaryView;

/// Record describing a binary known to the project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinaryRecord {
    /// Human-friendly name (usually the file name).
    pub name: String,
    /// Path to the binary, relative to the project root if possible.
    pub path: String,
    pub arch: Option<String>,
    /// Container format as detected when the binary was recorded.
    pub format: Option<String>,
    /// SHA-256 of the file contents.
    pub hash: Option<String>,
}

impl BinaryRecord {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self { name: name.into(), path: path.into(), arch: None, format: None, hash: None }
    }

    /// Record for a loaded view, stored under `path`.
    pub fn from_view(view: &BinaryView, path: impl Into<String>) -> Self {
        Self {
            name: view.name().to_string(),
            path: path.into(),
            arch: view.arch().map(str::to_string),
            format: Some(view.format().as_str().to_string()),
            hash: Some(view.sha256()),
        }
    }
}

/// Allowed status values for parse runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParseRunStatus {
    Succeeded,
    Failed,
}

impl ParseRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseRunStatus::Succeeded => "succeeded",
            ParseRunStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ParseRunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "succeeded" => Ok(ParseRunStatus::Succeeded),
            "failed" => Ok(ParseRunStatus::Failed),
            other => Err(format!("Invalid parse run status '{other}'")),
        }
    }
}

/// Bookkeeping for one parser run over one binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseRunRecord {
    pub binary: String,
    pub parser: String,
    pub status: ParseRunStatus,
    pub types_added: u64,
    pub functions_added: u64,
    /// Error text for failed runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub started_at: String,
    pub finished_at: String,
}
