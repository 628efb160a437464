use std::path::Path;

use anyhow::Result;

use debuginfo_core::db::ProjectContext;

use crate::canonicalize_or_current;

/// Open the project rooted at `root` (config plus database).
pub fn open_context(root: &str) -> Result<ProjectContext> {
    let root_path = canonicalize_or_current(root)?;
    ProjectContext::from_root(&root_path)
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Format an address the way listings print it.
pub fn format_address(address: u64) -> String {
    format!("{address:#010x}")
}
