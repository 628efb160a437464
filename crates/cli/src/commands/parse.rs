use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;

use debuginfo_core::db::{ProjectContext, ProjectLayout};
use debuginfo_core::debuginfo::global_snapshot;
use debuginfo_core::services::ingest::{DebugInfoRunner, IngestOutcome, IngestRequest};

use crate::canonicalize_or_current;
use crate::commands::open_context;

/// Serialization used for `--report` files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Json,
    Yaml,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Yaml => "yaml",
        }
    }

    pub fn render(&self, outcome: &IngestOutcome) -> Result<String> {
        Ok(match self {
            ReportFormat::Json => serde_json::to_string_pretty(outcome)?,
            ReportFormat::Yaml => serde_yaml::to_string(outcome)?,
        })
    }
}

/// Options for [`parse_command`].
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub root: String,
    pub binary: String,
    pub name: Option<String>,
    pub parsers: Vec<String>,
    pub persist: bool,
    pub report: Option<ReportFormat>,
    pub json: bool,
}

/// Run debug-info parsers over a binary and return what they found.
///
/// Results are written to the project database unless `persist` is off.
pub fn run_parse(opts: &ParseOptions) -> Result<(IngestOutcome, Option<PathBuf>)> {
    if let Some(name) = &opts.name {
        validate_binary_name(name)?;
    }
    let ctx: Option<ProjectContext> = if opts.persist { Some(open_context(&opts.root)?) } else { None };
    let registry = global_snapshot();
    let runner = DebugInfoRunner::new(&registry, ctx.as_ref());

    let mut request = IngestRequest::new(PathBuf::from(&opts.binary)).with_parsers(opts.parsers.clone());
    request.binary_name = opts.name.clone();
    let outcome = runner
        .run(&request)
        .with_context(|| format!("Failed to parse debug info for {}", opts.binary))?;

    let report_path = match opts.report {
        Some(format) => {
            let layout = match &ctx {
                Some(ctx) => ctx.layout.clone(),
                None => ProjectLayout::new(canonicalize_or_current(&opts.root)?),
            };
            fs::create_dir_all(&layout.reports_dir).with_context(|| {
                format!("Failed to create reports dir: {}", layout.reports_dir.display())
            })?;
            let path = layout.report_path(&outcome.binary.name, format.extension());
            fs::write(&path, format.render(&outcome)?)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote parse report");
            Some(path)
        }
        None => None,
    };

    Ok((outcome, report_path))
}

/// Binary names become report file names, so they must be a single plain path component.
fn validate_binary_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        bail!("Invalid binary name '{name}': expected a plain file name without path separators");
    }
    Ok(())
}

/// CLI entry point for `parse`.
pub fn parse_command(opts: &ParseOptions) -> Result<()> {
    let (outcome, report_path) = run_parse(opts)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("Parsed {}:", outcome.binary.name);
    for parser in &outcome.parsers {
        match &parser.error {
            None => println!(
                "- {}: {} types, {} functions ({} types, {} functions new)",
                parser.parser,
                parser.types_found,
                parser.functions_found,
                parser.types_added,
                parser.functions_added
            ),
            Some(message) => println!(
                "- {}: FAILED ({message}); kept {} types, {} functions",
                parser.parser, parser.types_added, parser.functions_added
            ),
        }
    }
    println!(
        "Total: {} types, {} functions",
        outcome.debug_info.type_count(),
        outcome.debug_info.function_count()
    );
    if outcome.run_ids.is_empty() {
        println!("Results not persisted.");
    } else {
        println!("Recorded {} parse run(s).", outcome.run_ids.len());
    }
    if let Some(path) = report_path {
        println!("Report: {}", path.display());
    }
    Ok(())
}
