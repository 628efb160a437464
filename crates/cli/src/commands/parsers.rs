use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use debuginfo_core::{BinaryView, DebugInfoParser};

#[derive(Debug, Serialize)]
pub struct ParserInfo {
    pub name: String,
    /// Whether the parser accepts the requested view; absent without `--binary`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}

/// Collect parser entries from the process-wide registry, in registration order.
pub fn collect_parser_infos(binary: Option<&str>) -> Result<Vec<ParserInfo>> {
    let view = match binary {
        Some(path) => Some(
            BinaryView::open(Path::new(path))
                .with_context(|| format!("Failed to open binary {path}"))?,
        ),
        None => None,
    };

    Ok(DebugInfoParser::list()
        .into_iter()
        .map(|parser| ParserInfo {
            name: parser.name().to_string(),
            valid: view.as_ref().map(|v| parser.is_valid_for_view(v)),
        })
        .collect())
}

/// List registered debug-info parsers, optionally checking them against a binary.
pub fn list_parsers_command(binary: Option<&str>, json: bool) -> Result<()> {
    let entries = collect_parser_infos(binary)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Parsers: (none)");
        return Ok(());
    }

    println!("Parsers:");
    for entry in entries {
        match entry.valid {
            Some(true) => println!("- {} (valid)", entry.name),
            Some(false) => println!("- {} (not valid for this binary)", entry.name),
            None => println!("- {}", entry.name),
        }
    }
    Ok(())
}
