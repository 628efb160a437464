use serde::{Deserialize, Serialize};

/// Location of the project database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the project database file (typically relative to project root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Serializable configuration describing a debug-info project.
///
/// This lives at `.debuginfo/project.json` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Config format version, not a binary version.
    pub config_version: String,
    pub db: DbConfig,
    /// Parsers to run when a parse request names none.
    ///
    /// Empty means "every parser valid for the view".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_parsers: Vec<String>,
}

impl ProjectConfig {
    /// Create a new project configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            default_parsers: Vec::new(),
        }
    }
}
