use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::db::{BinaryRecord, DbError, ParseRunRecord, ParseRunStatus, ProjectContext};
use crate::debuginfo::{run_parsers_with, DebugInfo, DebugInfoParser, ParserOutcome, ParserRegistry};
use crate::error::DebugInfoError;
use crate::view::{BinaryView, ViewError};

/// Request to run debug-info parsers over one binary.
#[derive(Debug, Clone, Serialize)]
pub struct IngestRequest {
    pub binary_path: PathBuf,
    /// Name to record the binary under; defaults to the file name.
    pub binary_name: Option<String>,
    /// Parsers to run, in order. Empty defers to the project defaults.
    pub parsers: Vec<String>,
}

impl IngestRequest {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self { binary_path: binary_path.into(), binary_name: None, parsers: Vec::new() }
    }

    pub fn with_parsers(mut self, parsers: Vec<String>) -> Self {
        self.parsers = parsers;
        self
    }
}

/// Everything one ingest produced.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub binary: BinaryRecord,
    /// Merged results of every parser that ran.
    pub debug_info: DebugInfo,
    pub parsers: Vec<ParserOutcome>,
    /// Parse run ids, one per parser, when results were persisted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_ids: Vec<i64>,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Binary not found at {0}")]
    MissingBinary(PathBuf),
    #[error("No debug-info parser is valid for view '{0}'")]
    NoParsers(String),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    DebugInfo(#[from] DebugInfoError),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Coordinator that ties a parser registry to an optional project database.
///
/// Without a project context results are returned but not persisted.
pub struct DebugInfoRunner<'a> {
    pub registry: &'a ParserRegistry,
    pub ctx: Option<&'a ProjectContext>,
}

impl<'a> DebugInfoRunner<'a> {
    pub fn new(registry: &'a ParserRegistry, ctx: Option<&'a ProjectContext>) -> Self {
        Self { registry, ctx }
    }

    /// Decide which parsers run for `view`.
    ///
    /// Explicitly requested parsers must exist and accept the view. Project
    /// defaults must exist but are skipped when they reject the view. With
    /// neither, every registered parser that accepts the view runs.
    pub fn select_parsers(
        &self,
        view: &BinaryView,
        requested: &[String],
    ) -> Result<Vec<DebugInfoParser>, IngestError> {
        let selected = if !requested.is_empty() {
            let mut parsers = Vec::with_capacity(requested.len());
            for name in requested {
                let parser = self.registry.parser(name)?;
                if !parser.is_valid_for_view(view) {
                    return Err(DebugInfoError::NotValidForView {
                        parser: name.clone(),
                        view: view.name().to_string(),
                    }
                    .into());
                }
                parsers.push(parser);
            }
            parsers
        } else if let Some(defaults) =
            self.ctx.map(|ctx| &ctx.config.default_parsers).filter(|d| !d.is_empty())
        {
            let mut parsers = Vec::with_capacity(defaults.len());
            for name in defaults {
                let parser = self.registry.parser(name)?;
                if parser.is_valid_for_view(view) {
                    parsers.push(parser);
                } else {
                    tracing::info!(parser = %name, view = view.name(), "default parser not valid for view; skipping");
                }
            }
            parsers
        } else {
            self.registry.parsers_for_view(view)
        };

        if selected.is_empty() {
            return Err(IngestError::NoParsers(view.name().to_string()));
        }
        Ok(selected)
    }

    pub fn run(&self, request: &IngestRequest) -> Result<IngestOutcome, IngestError> {
        if !request.binary_path.is_file() {
            return Err(IngestError::MissingBinary(request.binary_path.clone()));
        }
        let view = BinaryView::open(&request.binary_path)?;
        let parsers = self.select_parsers(&view, &request.parsers)?;
        let binary_name = request.binary_name.clone().unwrap_or_else(|| view.name().to_string());

        let mut binary = BinaryRecord::from_view(&view, self.stored_path(&request.binary_path));
        binary.name = binary_name.clone();
        if let Some(ctx) = self.ctx {
            match ctx.db.find_binary(&binary_name)? {
                Some(existing) => {
                    if existing.hash != binary.hash {
                        tracing::warn!(
                            binary = %binary_name,
                            "binary contents changed since it was first recorded"
                        );
                    }
                    binary = existing;
                }
                None => {
                    ctx.db.insert_binary(&binary)?;
                }
            }
        }

        let mut run_ids = Vec::new();
        let (merged, outcomes) = run_parsers_with(&parsers, &view, |run| {
            let Some(ctx) = self.ctx else {
                return Ok::<(), DbError>(());
            };
            let record = ParseRunRecord {
                binary: binary_name.clone(),
                parser: run.parser.name().to_string(),
                status: if run.error.is_some() {
                    ParseRunStatus::Failed
                } else {
                    ParseRunStatus::Succeeded
                },
                types_added: run.info.type_count() as u64,
                functions_added: run.info.function_count() as u64,
                message: run.error.map(str::to_string),
                started_at: run.started_at.to_rfc3339(),
                finished_at: run.finished_at.to_rfc3339(),
            };
            run_ids.push(ctx.db.record_run(&record, run.info)?);
            Ok(())
        })?;

        tracing::info!(
            binary = %binary_name,
            parsers = outcomes.len(),
            types = merged.type_count(),
            functions = merged.function_count(),
            "ingested debug info"
        );

        Ok(IngestOutcome { binary, debug_info: merged, parsers: outcomes, run_ids })
    }

    /// Path to store for the binary: relative to the project root when possible.
    fn stored_path(&self, path: &Path) -> String {
        let Some(ctx) = self.ctx else {
            return path.display().to_string();
        };
        let root = &ctx.layout.root;
        path.canonicalize()
            .ok()
            .and_then(|abs| {
                root.canonicalize()
                    .ok()
                    .and_then(|root| abs.strip_prefix(&root).ok().map(|p| p.to_path_buf()))
            })
            .or_else(|| path.strip_prefix(root).ok().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| path.to_path_buf())
            .to_string_lossy()
            .to_string()
    }
}

/// Load the latest persisted debug info for `binary`, merged across parsers.
///
/// With `parser` set, only that parser's latest run is loaded.
pub fn load_persisted(
    ctx: &ProjectContext,
    binary: &str,
    parser: Option<&str>,
) -> Result<DebugInfo, IngestError> {
    let run_ids: Vec<i64> = match parser {
        Some(name) => ctx.db.latest_run_id(binary, name)?.into_iter().collect(),
        None => ctx.db.latest_runs_for_binary(binary)?.into_iter().map(|(id, _)| id).collect(),
    };

    let mut merged = DebugInfo::new();
    for run_id in run_ids {
        merged.merge(ctx.db.load_debug_info(run_id)?);
    }
    Ok(merged)
}
