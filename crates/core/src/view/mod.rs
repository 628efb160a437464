//! Loaded binaries handed to debug-info parsers.
//!
//! A [`BinaryView`] is built once from a file (or an in-memory buffer) and is
//! immutable afterwards. Header, section and symbol information is decoded
//! with goblin up front so parsers can make cheap validity decisions.
//! Formats goblin does not recognise still produce a view, with
//! [`ViewFormat::Raw`] and no sections or symbols.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use goblin::{elf, mach, pe, Object};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Failed to read binary at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Container format of the loaded binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewFormat {
    Elf,
    Pe,
    MachO,
    Raw,
}

impl ViewFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewFormat::Elf => "elf",
            ViewFormat::Pe => "pe",
            ViewFormat::MachO => "macho",
            ViewFormat::Raw => "raw",
        }
    }
}

impl fmt::Display for ViewFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    /// Virtual address of the first byte.
    pub start: u64,
    pub size: u64,
    pub file_offset: Option<u64>,
}

impl Section {
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.start && address < self.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub address: u64,
    pub size: Option<u64>,
    pub kind: SymbolKind,
}

#[derive(Debug)]
struct ViewInner {
    name: String,
    path: Option<PathBuf>,
    bytes: Vec<u8>,
    format: ViewFormat,
    arch: Option<String>,
    is_64bit: bool,
    entry_point: Option<u64>,
    image_base: u64,
    sections: Vec<Section>,
    symbols: Vec<Symbol>,
}

/// Immutable, cheaply cloneable view of a binary under analysis.
#[derive(Debug, Clone)]
pub struct BinaryView {
    inner: Arc<ViewInner>,
}

impl BinaryView {
    /// Read and decode the binary at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ViewError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|source| ViewError::Io { path: path.to_path_buf(), source })?;
        let name = path
            .file_name()
            .and_then(|os| os.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::build(name, Some(path.to_path_buf()), bytes))
    }

    /// Decode an in-memory binary.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::build(name.into(), None, bytes)
    }

    fn build(name: String, path: Option<PathBuf>, bytes: Vec<u8>) -> Self {
        let mut inner = ViewInner {
            name,
            path,
            bytes: Vec::new(),
            format: ViewFormat::Raw,
            arch: None,
            is_64bit: false,
            entry_point: None,
            image_base: 0,
            sections: Vec::new(),
            symbols: Vec::new(),
        };

        match Object::parse(&bytes) {
            Ok(Object::Elf(elf)) => load_elf(&mut inner, &elf),
            Ok(Object::PE(pe)) => load_pe(&mut inner, &pe),
            Ok(Object::Mach(mach::Mach::Binary(bin))) => load_macho(&mut inner, &bin),
            Ok(_) => {
                tracing::debug!(view = %inner.name, "unsupported container; using raw view");
            }
            Err(err) => {
                tracing::debug!(view = %inner.name, error = %err, "header parse failed; using raw view");
            }
        }

        inner.bytes = bytes;
        tracing::debug!(
            view = %inner.name,
            format = %inner.format,
            sections = inner.sections.len(),
            symbols = inner.symbols.len(),
            "loaded binary view"
        );
        Self { inner: Arc::new(inner) }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn format(&self) -> ViewFormat {
        self.inner.format
    }

    pub fn arch(&self) -> Option<&str> {
        self.inner.arch.as_deref()
    }

    pub fn is_64bit(&self) -> bool {
        self.inner.is_64bit
    }

    pub fn entry_point(&self) -> Option<u64> {
        self.inner.entry_point
    }

    pub fn image_base(&self) -> u64 {
        self.inner.image_base
    }

    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    pub fn len(&self) -> usize {
        self.inner.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.bytes.is_empty()
    }

    pub fn sections(&self) -> &[Section] {
        &self.inner.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.inner.sections.iter().find(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// File bytes backing a section, clamped to the file size.
    ///
    /// `None` for unknown sections and sections without file contents.
    pub fn section_data(&self, name: &str) -> Option<&[u8]> {
        let section = self.section(name)?;
        let start = usize::try_from(section.file_offset?).ok()?;
        if start >= self.inner.bytes.len() {
            return None;
        }
        let len = usize::try_from(section.size).unwrap_or(usize::MAX);
        let end = start.saturating_add(len).min(self.inner.bytes.len());
        Some(&self.inner.bytes[start..end])
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.inner.symbols
    }

    pub fn function_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.inner.symbols.iter().filter(|s| s.kind == SymbolKind::Function)
    }

    pub fn symbol_at(&self, address: u64) -> Option<&Symbol> {
        self.inner.symbols.iter().find(|s| s.address == address)
    }

    /// SHA-256 of the raw file contents as lowercase hex.
    pub fn sha256(&self) -> String {
        let digest = Sha256::digest(&self.inner.bytes);
        format!("{:x}", digest)
    }
}

/// Two views are the same view when they share the same loaded buffer.
impl PartialEq for BinaryView {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for BinaryView {}

fn elf_arch(machine: u16) -> Option<String> {
    match machine {
        elf::header::EM_X86_64 => Some("x86_64".into()),
        elf::header::EM_386 => Some("x86".into()),
        elf::header::EM_AARCH64 => Some("arm64".into()),
        elf::header::EM_ARM => Some("arm".into()),
        elf::header::EM_RISCV => Some("riscv".into()),
        elf::header::EM_PPC64 => Some("ppc64".into()),
        elf::header::EM_MIPS => Some("mips".into()),
        _ => None,
    }
}

fn load_elf(inner: &mut ViewInner, elf: &elf::Elf) {
    inner.format = ViewFormat::Elf;
    inner.arch = elf_arch(elf.header.e_machine);
    inner.is_64bit = elf.is_64;
    inner.entry_point = if elf.entry == 0 { None } else { Some(elf.entry) };

    inner.sections = elf
        .section_headers
        .iter()
        .filter(|sh| sh.sh_type != elf::section_header::SHT_NULL)
        .map(|sh| Section {
            name: elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("").to_string(),
            start: sh.sh_addr,
            size: sh.sh_size,
            file_offset: if sh.sh_type == elf::section_header::SHT_NOBITS {
                None
            } else {
                Some(sh.sh_offset)
            },
        })
        .collect();

    let mut symbols = Vec::new();
    let mut seen: HashSet<(String, u64)> = HashSet::new();
    let tables = [(&elf.syms, &elf.strtab), (&elf.dynsyms, &elf.dynstrtab)];
    for (syms, strtab) in tables {
        for sym in syms.iter() {
            if sym.st_shndx == elf::section_header::SHN_UNDEF as usize {
                continue;
            }
            let kind = if sym.is_function() {
                SymbolKind::Function
            } else if sym.st_type() == elf::sym::STT_OBJECT {
                SymbolKind::Data
            } else {
                continue;
            };
            let name = strtab.get_at(sym.st_name).unwrap_or("");
            if name.is_empty() {
                continue;
            }
            // Static and dynamic tables usually repeat exported symbols.
            if !seen.insert((name.to_string(), sym.st_value)) {
                continue;
            }
            symbols.push(Symbol {
                name: name.to_string(),
                address: sym.st_value,
                size: if sym.st_size > 0 { Some(sym.st_size) } else { None },
                kind,
            });
        }
    }
    inner.symbols = symbols;
}

fn load_pe(inner: &mut ViewInner, pe: &pe::PE) {
    inner.format = ViewFormat::Pe;
    inner.arch = match pe.header.coff_header.machine {
        pe::header::COFF_MACHINE_X86 => Some("x86".into()),
        pe::header::COFF_MACHINE_X86_64 => Some("x86_64".into()),
        pe::header::COFF_MACHINE_ARM => Some("arm".into()),
        pe::header::COFF_MACHINE_ARM64 => Some("arm64".into()),
        _ => None,
    };
    inner.is_64bit = pe.is_64;
    inner.image_base = pe.image_base as u64;
    // Addresses wrap like the loader's 64-bit arithmetic.
    inner.entry_point = if pe.entry == 0 {
        None
    } else {
        Some(inner.image_base.wrapping_add(pe.entry as u64))
    };

    inner.sections = pe
        .sections
        .iter()
        .map(|sec| Section {
            name: sec.name().unwrap_or_default().to_string(),
            start: inner.image_base.wrapping_add(sec.virtual_address as u64),
            size: if sec.virtual_size == 0 {
                sec.size_of_raw_data as u64
            } else {
                sec.virtual_size as u64
            },
            file_offset: if sec.size_of_raw_data == 0 {
                None
            } else {
                Some(sec.pointer_to_raw_data as u64)
            },
        })
        .collect();

    let image_base = inner.image_base;
    let text_ranges: Vec<(u64, u64)> = pe
        .sections
        .iter()
        .filter(|sec| sec.characteristics & pe::section_table::IMAGE_SCN_MEM_EXECUTE != 0)
        .map(|sec| {
            let start = image_base.wrapping_add(sec.virtual_address as u64);
            (start, start.saturating_add(sec.virtual_size.max(sec.size_of_raw_data) as u64))
        })
        .collect();

    inner.symbols = pe
        .exports
        .iter()
        .filter(|exp| exp.rva != 0 && exp.reexport.is_none())
        .filter_map(|exp| {
            let name = exp.name?.to_string();
            if name.is_empty() {
                return None;
            }
            let address = image_base.wrapping_add(exp.rva as u64);
            let kind = if text_ranges.iter().any(|(s, e)| address >= *s && address < *e) {
                SymbolKind::Function
            } else {
                SymbolKind::Data
            };
            Some(Symbol { name, address, size: None, kind })
        })
        .collect();
}

fn load_macho(inner: &mut ViewInner, bin: &mach::MachO) {
    inner.format = ViewFormat::MachO;
    inner.arch = match bin.header.cputype() {
        mach::cputype::CPU_TYPE_X86 => Some("x86".into()),
        mach::cputype::CPU_TYPE_X86_64 => Some("x86_64".into()),
        mach::cputype::CPU_TYPE_ARM => Some("arm".into()),
        mach::cputype::CPU_TYPE_ARM64 => Some("arm64".into()),
        _ => None,
    };
    inner.is_64bit = bin.is_64;
    inner.entry_point = if bin.entry == 0 { None } else { Some(bin.entry) };

    // Section ordinals in nlist entries are 1-based over this flattened list.
    let mut segnames = Vec::new();
    for (sec, _) in bin.segments.sections().flatten().filter_map(Result::ok) {
        segnames.push(sec.segname().unwrap_or("").to_string());
        inner.sections.push(Section {
            name: sec.name().unwrap_or("").to_string(),
            start: sec.addr,
            size: sec.size,
            file_offset: if sec.offset == 0 { None } else { Some(sec.offset as u64) },
        });
    }

    for sym in bin.symbols() {
        let Ok((name, nlist)) = sym else { continue };
        if nlist.is_stab() || nlist.is_undefined() || nlist.n_value == 0 {
            continue;
        }
        let name = name.strip_prefix('_').unwrap_or(name);
        if name.is_empty() {
            continue;
        }
        let ordinal = nlist.n_sect;
        let in_text = ordinal > 0
            && inner.sections.get(ordinal - 1).is_some_and(|s| s.name == "__text")
            && segnames.get(ordinal - 1).is_some_and(|s| s == "__TEXT");
        inner.symbols.push(Symbol {
            name: name.to_string(),
            address: nlist.n_value,
            size: None,
            kind: if in_text { SymbolKind::Function } else { SymbolKind::Data },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bytes_produce_raw_view() {
        let view = BinaryView::from_bytes("blob", vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(view.format(), ViewFormat::Raw);
        assert_eq!(view.name(), "blob");
        assert!(view.sections().is_empty());
        assert!(view.symbols().is_empty());
        assert_eq!(view.len(), 4);
        assert_eq!(view.arch(), None);
    }

    #[test]
    fn sha256_matches_known_digest() {
        let view = BinaryView::from_bytes("empty", Vec::new());
        assert_eq!(
            view.sha256(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn clones_compare_equal_but_reloads_do_not() {
        let a = BinaryView::from_bytes("a", vec![1, 2, 3]);
        let b = a.clone();
        let c = BinaryView::from_bytes("a", vec![1, 2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn open_reports_missing_file() {
        let err = BinaryView::open("/definitely/not/here.bin").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.bin"));
    }
}
