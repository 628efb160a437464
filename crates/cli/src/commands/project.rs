use std::fs;

use anyhow::{Context, Result};
use serde::Serialize;

use debuginfo_core::db::{save_project_config, BinaryRecord, ProjectConfig, ProjectDb, ProjectLayout};
use debuginfo_core::DebugInfoParser;

use crate::commands::{open_context, print_dir_status};
use crate::{canonicalize_or_current, infer_project_name};

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub db_path: String,
    pub schema_version: i32,
    pub default_parsers: Vec<String>,
    pub available_parsers: Vec<String>,
    pub reports_dir: String,
    pub binaries: Vec<BinaryRecord>,
    pub parse_runs: usize,
}

/// Initialize a new project at `root`.
pub fn init_project_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    fs::create_dir_all(&layout.reports_dir).with_context(|| {
        format!("Failed to create reports dir: {}", layout.reports_dir.display())
    })?;

    let config = ProjectConfig::new(&project_name, layout.db_path_relative_string());
    save_project_config(&layout, &config)?;

    // Create the database now so later commands can rely on it.
    ProjectDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize project database at {}", layout.db_path.display())
    })?;

    println!("Initialized debug-info project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Reports dir: {}", layout.reports_dir.display());

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let binaries = ctx.db.list_binaries().context("Failed to list binaries")?;
    let parse_runs = ctx.db.list_parse_runs(None).context("Failed to list parse runs")?;
    let schema_version = ctx.db.schema_version().context("Failed to read schema version")?;
    let available_parsers: Vec<String> =
        DebugInfoParser::list().iter().map(|p| p.name().to_string()).collect();

    if json {
        let snapshot = ProjectInfoSnapshot {
            name: ctx.config.name.clone(),
            root: ctx.layout.root.display().to_string(),
            config_file: ctx.layout.project_config_path.display().to_string(),
            config_version: ctx.config.config_version.clone(),
            db_path: ctx.config.db.path.clone(),
            schema_version,
            default_parsers: ctx.config.default_parsers.clone(),
            available_parsers,
            reports_dir: ctx.layout.reports_dir.display().to_string(),
            binaries,
            parse_runs: parse_runs.len(),
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Project: {}", ctx.config.name);
    if let Some(description) = &ctx.config.description {
        println!("  Description: {description}");
    }
    println!("  Root: {}", ctx.layout.root.display());
    println!("  Config version: {}", ctx.config.config_version);
    println!("  DB: {} (schema v{schema_version})", ctx.db_path.display());
    if ctx.config.default_parsers.is_empty() {
        println!("  Default parsers: (all valid)");
    } else {
        println!("  Default parsers: {}", ctx.config.default_parsers.join(", "));
    }
    println!("  Available parsers: {}", available_parsers.join(", "));
    println!("Layout:");
    print_dir_status("Meta", &ctx.layout.meta_dir);
    print_dir_status("Reports", &ctx.layout.reports_dir);
    println!("Binaries: {}", binaries.len());
    for binary in &binaries {
        println!(
            "- {} ({}, {})",
            binary.name,
            binary.format.as_deref().unwrap_or("unknown"),
            binary.path
        );
    }
    println!("Parse runs: {}", parse_runs.len());
    Ok(())
}
