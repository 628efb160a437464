use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use debuginfo_core::view::SymbolKind;
use debuginfo_core::BinaryView;

use crate::commands::format_address;

#[derive(Debug, Serialize)]
pub struct SectionInfo {
    pub name: String,
    pub start: u64,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct ViewSnapshot {
    pub name: String,
    pub format: String,
    pub arch: Option<String>,
    pub is_64bit: bool,
    pub entry_point: Option<u64>,
    pub image_base: u64,
    pub size: usize,
    pub sha256: String,
    pub sections: Vec<SectionInfo>,
    pub function_symbols: usize,
    pub data_symbols: usize,
}

impl ViewSnapshot {
    pub fn from_view(view: &BinaryView) -> Self {
        let function_symbols = view.function_symbols().count();
        let data_symbols =
            view.symbols().iter().filter(|s| s.kind == SymbolKind::Data).count();
        Self {
            name: view.name().to_string(),
            format: view.format().as_str().to_string(),
            arch: view.arch().map(str::to_string),
            is_64bit: view.is_64bit(),
            entry_point: view.entry_point(),
            image_base: view.image_base(),
            size: view.len(),
            sha256: view.sha256(),
            sections: view
                .sections()
                .iter()
                .map(|s| SectionInfo { name: s.name.clone(), start: s.start, size: s.size })
                .collect(),
            function_symbols,
            data_symbols,
        }
    }
}

/// Describe what the binary view sees in a file.
pub fn view_info_command(binary: &str, json: bool) -> Result<()> {
    let view = BinaryView::open(Path::new(binary))
        .with_context(|| format!("Failed to open binary {binary}"))?;
    let snapshot = ViewSnapshot::from_view(&view);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Binary: {}", snapshot.name);
    println!("  Format: {}", snapshot.format);
    println!("  Arch: {}", snapshot.arch.as_deref().unwrap_or("unknown"));
    println!("  64-bit: {}", snapshot.is_64bit);
    match snapshot.entry_point {
        Some(entry) => println!("  Entry: {}", format_address(entry)),
        None => println!("  Entry: (none)"),
    }
    println!("  Size: {} bytes", snapshot.size);
    println!("  SHA-256: {}", snapshot.sha256);
    println!("  Function symbols: {}", snapshot.function_symbols);
    println!("  Data symbols: {}", snapshot.data_symbols);
    if snapshot.sections.is_empty() {
        println!("  Sections: (none)");
    } else {
        println!("  Sections:");
        for section in &snapshot.sections {
            println!(
                "    - {} @ {} ({} bytes)",
                section.name,
                format_address(section.start),
                section.size
            );
        }
    }
    Ok(())
}
