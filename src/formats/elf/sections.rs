//! Section table management

use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_cstring, slice_at, EndianRead};
use std::collections::HashMap;

/// Section table for efficient section lookup
pub struct SectionTable<'a> {
    headers: Vec<SectionHeader>,
    strings: &'a [u8],
    data: &'a [u8],
    by_name: HashMap<String, usize>,
}

impl<'a> SectionTable<'a> {
    /// Parse section table from ELF data
    pub fn parse(data: &'a [u8], header: &ElfHeader) -> Result<Self> {
        let sh_num = header.e_shnum as usize;

        if sh_num == 0 || header.e_shoff == 0 {
            return Ok(Self {
                headers: Vec::new(),
                strings: &[],
                data,
                by_name: HashMap::new(),
            });
        }

        let sh_entsize = header.e_shentsize as usize;
        let table = slice_at(data, header.e_shoff, (sh_num * sh_entsize) as u64)?;

        let mut headers = Vec::with_capacity(sh_num);
        for i in 0..sh_num {
            headers.push(parse_section_header(
                table,
                i * sh_entsize,
                header.ident.class,
                header.ident.data,
            )?);
        }

        // Section names are cosmetic; a broken string table only loses them.
        let strings = headers
            .get(header.e_shstrndx as usize)
            .and_then(|sh| slice_at(data, sh.sh_offset, sh.sh_size).ok())
            .unwrap_or(&[]);

        let mut by_name = HashMap::new();
        for (i, sh) in headers.iter().enumerate() {
            if let Ok(name) = read_cstring(strings, sh.sh_name as usize) {
                by_name.entry(name.to_string()).or_insert(i);
            }
        }

        Ok(Self {
            headers,
            strings,
            data,
            by_name,
        })
    }

    /// Get section by name
    pub fn by_name(&self, name: &str) -> Option<Section<'a>> {
        self.by_name.get(name).and_then(|&idx| self.by_index(idx))
    }

    /// Get section by index. Sections whose contents fall outside the
    /// image come back with empty data.
    pub fn by_index(&self, index: usize) -> Option<Section<'a>> {
        self.headers.get(index).map(|header| Section {
            header: *header,
            name: read_cstring(self.strings, header.sh_name as usize).unwrap_or(""),
            data: self.contents(header).unwrap_or(&[]),
        })
    }

    /// Contents of a section, failing when they fall outside the image.
    pub fn contents(&self, header: &SectionHeader) -> Result<&'a [u8]> {
        if header.sh_type == SHT_NOBITS {
            return Ok(&[]);
        }
        slice_at(self.data, header.sh_offset, header.sh_size)
    }

    /// Get all sections
    pub fn sections(&self) -> impl Iterator<Item = Section<'a>> + '_ {
        (0..self.headers.len()).filter_map(move |i| self.by_index(i))
    }

    /// Indices of `SHT_SYMTAB` sections followed by `SHT_DYNSYM` sections.
    pub fn symbol_table_indices(&self) -> Vec<usize> {
        let of_type = |ty: u32| {
            self.headers
                .iter()
                .enumerate()
                .filter(move |(_, h)| h.sh_type == ty)
                .map(|(i, _)| i)
        };
        of_type(SHT_SYMTAB).chain(of_type(SHT_DYNSYM)).collect()
    }

    pub fn header(&self, index: usize) -> Option<&SectionHeader> {
        self.headers.get(index)
    }

    /// Count sections
    pub fn count(&self) -> usize {
        self.headers.len()
    }
}

/// Parse a single section header
fn parse_section_header(
    data: &[u8],
    offset: usize,
    class: ElfClass,
    endian: ElfData,
) -> Result<SectionHeader> {
    match class {
        ElfClass::Elf32 => Ok(SectionHeader {
            sh_name: data.read_u32(offset, endian)?,
            sh_type: data.read_u32(offset + 4, endian)?,
            sh_flags: data.read_u32(offset + 8, endian)? as u64,
            sh_addr: data.read_u32(offset + 12, endian)? as u64,
            sh_offset: data.read_u32(offset + 16, endian)? as u64,
            sh_size: data.read_u32(offset + 20, endian)? as u64,
            sh_link: data.read_u32(offset + 24, endian)?,
            sh_info: data.read_u32(offset + 28, endian)?,
            sh_addralign: data.read_u32(offset + 32, endian)? as u64,
            sh_entsize: data.read_u32(offset + 36, endian)? as u64,
        }),
        ElfClass::Elf64 => Ok(SectionHeader {
            sh_name: data.read_u32(offset, endian)?,
            sh_type: data.read_u32(offset + 4, endian)?,
            sh_flags: data.read_u64(offset + 8, endian)?,
            sh_addr: data.read_u64(offset + 16, endian)?,
            sh_offset: data.read_u64(offset + 24, endian)?,
            sh_size: data.read_u64(offset + 32, endian)?,
            sh_link: data.read_u32(offset + 40, endian)?,
            sh_info: data.read_u32(offset + 44, endian)?,
            sh_addralign: data.read_u64(offset + 48, endian)?,
            sh_entsize: data.read_u64(offset + 56, endian)?,
        }),
    }
}
