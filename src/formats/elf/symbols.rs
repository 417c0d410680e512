//! Symbol table parsing and lookup

use crate::formats::elf::sections::SectionTable;
use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_cstring, EndianRead};
use std::collections::HashMap;
use std::fmt;

/// Broad classification of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Object,
    Tls,
    Other,
}

impl From<u8> for SymbolKind {
    fn from(st_type: u8) -> Self {
        match st_type {
            STT_FUNC => SymbolKind::Function,
            STT_OBJECT => SymbolKind::Object,
            STT_TLS => SymbolKind::Tls,
            _ => SymbolKind::Other,
        }
    }
}

/// Symbol binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolBinding {
    Local,
    Global,
    Weak,
    Other,
}

impl From<u8> for SymbolBinding {
    fn from(st_bind: u8) -> Self {
        match st_bind {
            STB_LOCAL => SymbolBinding::Local,
            STB_GLOBAL => SymbolBinding::Global,
            STB_WEAK => SymbolBinding::Weak,
            _ => SymbolBinding::Other,
        }
    }
}

/// A defined, named symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub name: String,
    /// Defining offset (`st_value`) relative to the image's load base.
    pub offset: u64,
    pub size: u64,
    pub kind: SymbolKind,
    pub binding: SymbolBinding,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.name, self.offset)
    }
}

/// Symbols of one image, indexed by name and by offset.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_name: HashMap<String, usize>,
    /// Indices into `symbols`, sorted by (offset, name).
    by_offset: Vec<usize>,
}

impl SymbolTable {
    /// Collect symbols from every `SHT_SYMTAB` then every `SHT_DYNSYM` section.
    pub fn from_sections(sections: &SectionTable<'_>, class: ElfClass, endian: ElfData) -> Result<Self> {
        let mut table = SymbolTable::default();

        for index in sections.symbol_table_indices() {
            let Some(header) = sections.header(index) else {
                continue;
            };
            let symbol_data = sections.contents(header)?;
            let strtab_header = sections.header(header.sh_link as usize).ok_or_else(|| {
                ElfError::MalformedSymbolTable(format!(
                    "section {} links to missing string table {}",
                    index, header.sh_link
                ))
            })?;
            let string_data = sections.contents(strtab_header)?;
            table.extend(symbol_data, string_data, class, endian)?;
        }

        table.index_offsets();
        Ok(table)
    }

    fn extend(&mut self, symbol_data: &[u8], string_data: &[u8], class: ElfClass, endian: ElfData) -> Result<()> {
        let entry_size = class.symbol_entry_size();
        if symbol_data.len() % entry_size != 0 {
            return Err(ElfError::MalformedSymbolTable(format!(
                "size {:#x} is not a multiple of entry size {}",
                symbol_data.len(),
                entry_size
            )));
        }

        for chunk in symbol_data.chunks_exact(entry_size) {
            let entry = parse_symbol(chunk, class, endian)?;
            if entry.st_name == 0 || entry.is_undefined() || entry.is_marker() {
                continue;
            }
            let name = read_cstring(string_data, entry.st_name as usize)?;
            if name.is_empty() {
                continue;
            }

            // The same symbol commonly appears in both .symtab and .dynsym.
            if let Some(&existing) = self.by_name.get(name) {
                if self.symbols[existing].offset == entry.st_value {
                    continue;
                }
            }

            let index = self.symbols.len();
            self.by_name.entry(name.to_string()).or_insert(index);
            self.symbols.push(Symbol {
                name: name.to_string(),
                offset: entry.st_value,
                size: entry.st_size,
                kind: SymbolKind::from(entry.st_type()),
                binding: SymbolBinding::from(entry.st_bind()),
            });
        }
        Ok(())
    }

    fn index_offsets(&mut self) {
        let symbols = &self.symbols;
        let mut order: Vec<usize> = (0..symbols.len()).collect();
        order.sort_by(|&a, &b| {
            symbols[a]
                .offset
                .cmp(&symbols[b].offset)
                .then_with(|| symbols[a].name.cmp(&symbols[b].name))
        });
        self.by_offset = order;
    }

    /// Get symbol by name
    pub fn by_name(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name).map(|&idx| &self.symbols[idx])
    }

    /// Symbol with the largest offset not above `offset`.
    ///
    /// When several symbols share that offset the lexicographically
    /// smallest name is returned, so repeated queries always agree.
    pub fn nearest_at_or_before(&self, offset: u64) -> Option<&Symbol> {
        let end = self
            .by_offset
            .partition_point(|&i| self.symbols[i].offset <= offset);
        if end == 0 {
            return None;
        }
        let best = self.symbols[self.by_offset[end - 1]].offset;
        let first = self.by_offset[..end].partition_point(|&i| self.symbols[i].offset < best);
        Some(&self.symbols[self.by_offset[first]])
    }

    /// All symbols in offset order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.by_offset.iter().map(move |&i| &self.symbols[i])
    }

    pub fn has_symbol(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Count total symbols
    pub fn count(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Parse a single symbol entry
fn parse_symbol(data: &[u8], class: ElfClass, endian: ElfData) -> Result<SymbolEntry> {
    match class {
        ElfClass::Elf32 => Ok(SymbolEntry {
            st_name: data.read_u32(0, endian)?,
            st_value: data.read_u32(4, endian)? as u64,
            st_size: data.read_u32(8, endian)? as u64,
            st_info: data[12],
            st_other: data[13],
            st_shndx: data.read_u16(14, endian)?,
        }),
        ElfClass::Elf64 => Ok(SymbolEntry {
            st_name: data.read_u32(0, endian)?,
            st_info: data[4],
            st_other: data[5],
            st_shndx: data.read_u16(6, endian)?,
            st_value: data.read_u64(8, endian)?,
            st_size: data.read_u64(16, endian)?,
        }),
    }
}
