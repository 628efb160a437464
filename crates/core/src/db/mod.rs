//! Project database integration and project layout definitions.
//!
//! The project database is where parsed debug info ends up: binaries, one
//! run record per parser invocation, and the types and functions each run
//! contributed.

mod config;
mod context;
mod layout;
mod models;
mod project_db;
mod util;

pub use config::{DbConfig, ProjectConfig};
pub use context::ProjectContext;
pub use layout::ProjectLayout;
pub use models::{BinaryRecord, ParseRunRecord, ParseRunStatus};
pub use project_db::{DbError, DbResult, ProjectDb, CURRENT_SCHEMA_VERSION};
pub use util::{load_project_config, open_project_db, save_project_config};
