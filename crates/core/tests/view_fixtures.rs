mod common;

use debuginfo_core::view::{SymbolKind, ViewError, ViewFormat};
use debuginfo_core::BinaryView;
use object::BinaryFormat;

#[test]
fn elf_object_exposes_sections_and_symbols() {
    let view = BinaryView::from_bytes("fixture.o", common::build_object(BinaryFormat::Elf));

    assert_eq!(view.format(), ViewFormat::Elf);
    assert_eq!(view.arch(), Some("x86_64"));
    assert!(view.is_64bit());
    assert_eq!(view.entry_point(), None, "relocatable objects have no entry");
    assert!(view.has_section(".text"));
    assert!(view.has_section(".data"));
    assert_eq!(view.section_data(".text").map(|d| d.len()), Some(0x30));

    let functions: Vec<&str> = view.function_symbols().map(|s| s.name.as_str()).collect();
    for (name, _) in common::FUNCTIONS {
        assert!(functions.contains(name), "missing function symbol {name}: {functions:?}");
    }

    let data = view.symbols().iter().find(|s| s.name == common::DATA_SYMBOL).expect("data symbol");
    assert_eq!(data.kind, SymbolKind::Data);
    assert_eq!(data.size, Some(8));

    let init = view.symbol_at(0x10).expect("symbol at 0x10");
    assert_eq!(init.name, "fixture_init");
    assert_eq!(init.kind, SymbolKind::Function);
}

#[test]
fn macho_object_strips_leading_underscore() {
    let view = BinaryView::from_bytes("fixture.o", common::build_object(BinaryFormat::MachO));

    assert_eq!(view.format(), ViewFormat::MachO);
    assert_eq!(view.arch(), Some("x86_64"));
    assert!(view.has_section("__text"));

    let init = view.symbols().iter().find(|s| s.name == "fixture_init").expect("fixture_init");
    assert_eq!(init.kind, SymbolKind::Function);
    assert_eq!(init.address, 0x10);

    let data = view.symbols().iter().find(|s| s.name == common::DATA_SYMBOL).expect("data symbol");
    assert_eq!(data.kind, SymbolKind::Data);
}

#[test]
fn pe64_dll_maps_sections_entry_and_exports() {
    let image_base = 0x1_4000_0000;
    let view = BinaryView::from_bytes("fixture.dll", common::build_pe64(image_base, 0x1000));

    assert_eq!(view.format(), ViewFormat::Pe);
    assert_eq!(view.arch(), Some("x86_64"));
    assert!(view.is_64bit());
    assert_eq!(view.image_base(), image_base);
    assert_eq!(view.entry_point(), Some(image_base + 0x1000));

    let text = view.section(".text").expect(".text section");
    assert_eq!(text.start, image_base + 0x1000);
    assert_eq!(text.size, 0x100);
    assert_eq!(text.file_offset, Some(0x200));
    let rdata = view.section(".rdata").expect(".rdata section");
    assert_eq!(rdata.start, image_base + 0x2000);

    let code = view.section_data(".text").expect(".text bytes");
    assert_eq!(code.len(), 0x100);
    assert!(code.iter().all(|b| *b == 0xC3));

    let entry = view.symbols().iter().find(|s| s.name == "fixture_entry").expect("fixture_entry");
    assert_eq!(entry.address, image_base + 0x1010);
    assert_eq!(entry.kind, SymbolKind::Function);

    let table = view.symbols().iter().find(|s| s.name == "fixture_table").expect("fixture_table");
    assert_eq!(table.address, image_base + 0x2080);
    assert_eq!(table.kind, SymbolKind::Data);

    assert_eq!(view.symbols().len(), common::PE_EXPORTS.len());
}

#[test]
fn pe64_near_top_image_base_wraps_addresses() {
    let image_base = 0xFFFF_FFFF_FFFF_F000u64;
    let view = BinaryView::from_bytes("hostile.dll", common::build_pe64(image_base, 0x2000));

    assert_eq!(view.format(), ViewFormat::Pe);
    assert_eq!(view.image_base(), image_base);
    assert_eq!(view.entry_point(), Some(image_base.wrapping_add(0x2000)));

    let text = view.section(".text").expect(".text section");
    assert_eq!(text.start, image_base.wrapping_add(0x1000));

    // Wrapped .text still classifies its export as code.
    let entry = view.symbols().iter().find(|s| s.name == "fixture_entry").expect("fixture_entry");
    assert_eq!(entry.address, image_base.wrapping_add(0x1010));
    assert_eq!(entry.kind, SymbolKind::Function);
}

#[test]
fn elf_symbol_tables_with_many_entries_keep_every_symbol() {
    let count = 20_000;
    let view = BinaryView::from_bytes("many.o", common::build_elf_with_functions(count));

    assert_eq!(view.format(), ViewFormat::Elf);
    assert_eq!(view.function_symbols().count(), count);
    assert_eq!(view.symbol_at(0).map(|s| s.name.as_str()), Some("fn_0"));
    let last = (count as u64 - 1) * 4;
    assert_eq!(view.symbol_at(last).map(|s| s.name.clone()), Some(format!("fn_{}", count - 1)));
}

#[test]
fn open_reads_name_and_path_from_disk() {
    let temp = tempfile::tempdir().unwrap();
    let path = common::write_elf(temp.path(), "libfixture.so");

    let view = BinaryView::open(&path).expect("open view");
    assert_eq!(view.name(), "libfixture.so");
    assert_eq!(view.path(), Some(path.as_path()));
    assert_eq!(view.len() as u64, std::fs::metadata(&path).unwrap().len());
    assert_eq!(view.sha256().len(), 64);
}

#[test]
fn open_missing_file_reports_path() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("nope.bin");
    match BinaryView::open(&missing) {
        Err(ViewError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn clones_are_the_same_view_but_reloads_are_not() {
    let bytes = common::build_object(BinaryFormat::Elf);
    let a = BinaryView::from_bytes("a", bytes.clone());
    let b = a.clone();
    let c = BinaryView::from_bytes("a", bytes);
    assert_eq!(a, b);
    assert_ne!(a, c);
}
