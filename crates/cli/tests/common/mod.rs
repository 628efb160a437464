#![allow(dead_code)]

use std::path::{Path, PathBuf};

use object::write::{Object, StandardSection, Symbol, SymbolSection};
use object::{Architecture, BinaryFormat, Endianness, SymbolFlags, SymbolKind, SymbolScope};

/// Write a small x86-64 ELF object with two function symbols under `dir`.
pub fn write_elf(dir: &Path, name: &str) -> PathBuf {
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let text_id = obj.section_id(StandardSection::Text);
    obj.section_mut(text_id).set_data(vec![0xC3u8; 0x30], 16);

    for (symbol, value) in [("cli_start", 0x10u64), ("cli_stop", 0x20)] {
        obj.add_symbol(Symbol {
            name: symbol.as_bytes().to_vec(),
            value,
            size: 1,
            kind: SymbolKind::Text,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Section(text_id),
            flags: SymbolFlags::None,
        });
    }

    let path = dir.join(name);
    std::fs::write(&path, obj.write().expect("write object")).expect("write fixture");
    path
}
