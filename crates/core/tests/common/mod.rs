//! Object-file fixtures built with the `object` writer.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use object::write::{Object, StandardSection, Symbol, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, SymbolFlags, SymbolKind, SymbolScope,
};

/// Function symbols emitted by [`build_object`], as (name, offset in `.text`).
pub const FUNCTIONS: &[(&str, u64)] = &[
    ("fixture_init", 0x10),
    ("_ZN7fixture6render17h0123456789abcdefE", 0x20),
];

/// Data symbol emitted by [`build_object`].
pub const DATA_SYMBOL: &str = "fixture_table";

/// Relocatable object with two functions in text and one data object.
///
/// Functions start at 0x10 so every symbol value is non-zero in every format.
pub fn build_object(format: BinaryFormat) -> Vec<u8> {
    let mut obj = Object::new(format, Architecture::X86_64, Endianness::Little);

    let text_id = obj.section_id(StandardSection::Text);
    obj.section_mut(text_id).set_data(vec![0xC3u8; 0x30], 16);

    let data_id = obj.section_id(StandardSection::Data);
    obj.section_mut(data_id).set_data(vec![0u8; 0x20], 8);

    for (name, offset) in FUNCTIONS {
        obj.add_symbol(Symbol {
            name: name.as_bytes().to_vec(),
            value: *offset,
            size: 1,
            kind: SymbolKind::Text,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Section(text_id),
            flags: SymbolFlags::None,
        });
    }

    obj.add_symbol(Symbol {
        name: DATA_SYMBOL.as_bytes().to_vec(),
        value: 0x8,
        size: 8,
        kind: SymbolKind::Data,
        scope: SymbolScope::Linkage,
        weak: false,
        section: SymbolSection::Section(data_id),
        flags: SymbolFlags::None,
    });

    obj.write().expect("write object fixture")
}

/// Write an ELF fixture named `name` under `dir`.
pub fn write_elf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_object(BinaryFormat::Elf)).expect("write fixture");
    path
}

/// Relocatable ELF with `count` four-byte functions `fn_0..` laid out back to back.
pub fn build_elf_with_functions(count: usize) -> Vec<u8> {
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let text_id = obj.section_id(StandardSection::Text);
    obj.section_mut(text_id).set_data(vec![0xC3u8; count * 4], 16);

    for idx in 0..count {
        obj.add_symbol(Symbol {
            name: format!("fn_{idx}").into_bytes(),
            value: idx as u64 * 4,
            size: 4,
            kind: SymbolKind::Text,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Section(text_id),
            flags: SymbolFlags::None,
        });
    }

    obj.write().expect("write object fixture")
}

/// Exports emitted by [`build_pe64`], as (name, RVA).
pub const PE_EXPORTS: &[(&str, u64)] = &[("fixture_entry", 0x1010), ("fixture_table", 0x2080)];

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

/// Minimal x86-64 PE32+ DLL.
///
/// `.text` at RVA 0x1000 (executable) and `.rdata` at RVA 0x2000 holding an
/// export directory with one function export and one data export.
pub fn build_pe64(image_base: u64, entry_rva: u32) -> Vec<u8> {
    const PE_OFFSET: usize = 0x80;
    const OPT: usize = PE_OFFSET + 4 + 20;
    const SECTIONS: usize = OPT + 240;
    const TEXT_FILE: usize = 0x200;
    const RDATA_FILE: usize = 0x400;

    let mut buf = vec![0u8; 0x600];

    // DOS header.
    buf[0..2].copy_from_slice(b"MZ");
    put_u32(&mut buf, 0x3C, PE_OFFSET as u32);

    // PE signature and COFF header.
    buf[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");
    let coff = PE_OFFSET + 4;
    put_u16(&mut buf, coff, 0x8664);
    put_u16(&mut buf, coff + 2, 2);
    put_u16(&mut buf, coff + 16, 240);
    put_u16(&mut buf, coff + 18, 0x2022);

    // Optional header (PE32+).
    put_u16(&mut buf, OPT, 0x20B);
    put_u32(&mut buf, OPT + 4, 0x200);
    put_u32(&mut buf, OPT + 8, 0x200);
    put_u32(&mut buf, OPT + 16, entry_rva);
    put_u32(&mut buf, OPT + 20, 0x1000);
    put_u64(&mut buf, OPT + 24, image_base);
    put_u32(&mut buf, OPT + 32, 0x1000);
    put_u32(&mut buf, OPT + 36, 0x200);
    put_u16(&mut buf, OPT + 40, 6);
    put_u16(&mut buf, OPT + 48, 6);
    put_u32(&mut buf, OPT + 56, 0x3000);
    put_u32(&mut buf, OPT + 60, 0x200);
    put_u16(&mut buf, OPT + 68, 3);
    put_u64(&mut buf, OPT + 72, 0x10_0000);
    put_u64(&mut buf, OPT + 80, 0x1000);
    put_u64(&mut buf, OPT + 88, 0x10_0000);
    put_u64(&mut buf, OPT + 96, 0x1000);
    put_u32(&mut buf, OPT + 108, 16);
    // Export directory: RVA 0x2000, 0x70 bytes.
    put_u32(&mut buf, OPT + 112, 0x2000);
    put_u32(&mut buf, OPT + 116, 0x70);

    // Section table.
    let sections: [(&[u8], u32, u32, u32); 2] = [
        (b".text", 0x1000, TEXT_FILE as u32, 0x6000_0020),
        (b".rdata", 0x2000, RDATA_FILE as u32, 0x4000_0040),
    ];
    for (idx, (name, rva, file_offset, characteristics)) in sections.iter().enumerate() {
        let header = SECTIONS + idx * 40;
        buf[header..header + name.len()].copy_from_slice(name);
        put_u32(&mut buf, header + 8, 0x100);
        put_u32(&mut buf, header + 12, *rva);
        put_u32(&mut buf, header + 16, 0x200);
        put_u32(&mut buf, header + 20, *file_offset);
        put_u32(&mut buf, header + 36, *characteristics);
    }

    // .text body.
    buf[TEXT_FILE..TEXT_FILE + 0x100].fill(0xC3);

    // Export directory table at RVA 0x2000.
    let export = RDATA_FILE;
    put_u32(&mut buf, export + 12, 0x2040);
    put_u32(&mut buf, export + 16, 1);
    put_u32(&mut buf, export + 20, PE_EXPORTS.len() as u32);
    put_u32(&mut buf, export + 24, PE_EXPORTS.len() as u32);
    put_u32(&mut buf, export + 28, 0x2028);
    put_u32(&mut buf, export + 32, 0x2030);
    put_u32(&mut buf, export + 36, 0x2038);

    let rdata = |rva: usize| RDATA_FILE + rva - 0x2000;
    let name_rvas = [0x2050u32, 0x2060];
    for (idx, ((name, rva), name_rva)) in PE_EXPORTS.iter().zip(name_rvas).enumerate() {
        put_u32(&mut buf, rdata(0x2028) + idx * 4, *rva as u32);
        put_u32(&mut buf, rdata(0x2030) + idx * 4, name_rva);
        put_u16(&mut buf, rdata(0x2038) + idx * 2, idx as u16);
        let start = rdata(name_rva as usize);
        buf[start..start + name.len()].copy_from_slice(name.as_bytes());
    }
    let dll = rdata(0x2040);
    buf[dll..dll + 11].copy_from_slice(b"fixture.dll");

    buf
}
