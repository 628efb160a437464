use anyhow::{Context, Result};
use serde::Serialize;

use debuginfo_core::db::ParseRunRecord;
use debuginfo_core::services::ingest::load_persisted;
use debuginfo_core::DebugInfo;

use crate::commands::{format_address, open_context};

#[derive(Debug, Serialize)]
pub struct FunctionRow {
    pub address: u64,
    pub name: String,
    pub full_name: String,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TypeRow {
    pub name: String,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
}

/// Load persisted results for `binary`, failing if nothing was ever recorded.
fn load_binary_info(root: &str, binary: &str, parser: Option<&str>) -> Result<DebugInfo> {
    let ctx = open_context(root)?;
    if ctx.db.find_binary(binary)?.is_none() {
        anyhow::bail!("Binary '{binary}' is not recorded in this project");
    }
    load_persisted(&ctx, binary, parser)
        .with_context(|| format!("Failed to load debug info for {binary}"))
}

pub fn function_rows(info: &DebugInfo) -> Vec<FunctionRow> {
    let mut rows: Vec<FunctionRow> = info
        .functions()
        .iter()
        .map(|f| FunctionRow {
            address: f.info.address(),
            name: f.info.display_name().to_string(),
            full_name: f.info.full_name().to_string(),
            signature: f.info.signature().to_string(),
            parser: f.source.clone(),
        })
        .collect();
    rows.sort_by_key(|r| r.address);
    rows
}

pub fn type_rows(info: &DebugInfo) -> Vec<TypeRow> {
    info.types()
        .iter()
        .map(|t| TypeRow { name: t.name.clone(), definition: t.ty.to_string(), parser: t.source.clone() })
        .collect()
}

/// List persisted functions for a binary, sorted by address.
pub fn functions_command(root: &str, binary: &str, parser: Option<&str>, json: bool) -> Result<()> {
    let info = load_binary_info(root, binary, parser)?;
    let rows = function_rows(&info);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("Functions: (none)");
        return Ok(());
    }
    println!("Functions:");
    for row in rows {
        println!(
            "- {} {} [{}]",
            format_address(row.address),
            row.full_name,
            row.parser.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}

/// List persisted types for a binary.
pub fn types_command(root: &str, binary: &str, parser: Option<&str>, json: bool) -> Result<()> {
    let info = load_binary_info(root, binary, parser)?;
    let rows = type_rows(&info);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("Types: (none)");
        return Ok(());
    }
    println!("Types:");
    for row in rows {
        println!("- {} = {} [{}]", row.name, row.definition, row.parser.as_deref().unwrap_or("?"));
    }
    Ok(())
}

/// List parse runs, optionally for one binary.
pub fn runs_command(root: &str, binary: Option<&str>, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let runs: Vec<ParseRunRecord> =
        ctx.db.list_parse_runs(binary).context("Failed to list parse runs")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }
    if runs.is_empty() {
        println!("Parse runs: (none)");
        return Ok(());
    }
    println!("Parse runs:");
    for run in runs {
        print!(
            "- {} / {}: {} ({} types, {} functions) at {}",
            run.binary,
            run.parser,
            run.status.as_str(),
            run.types_added,
            run.functions_added,
            run.finished_at
        );
        match run.message {
            Some(message) => println!(" [{message}]"),
            None => println!(),
        }
    }
    Ok(())
}
