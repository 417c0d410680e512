//! ELF header parsing

use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_addr, EndianRead};

/// Parse ELF identification bytes
pub fn parse_ident(data: &[u8]) -> Result<ElfIdent> {
    if data.len() < 16 {
        return Err(ElfError::Truncated {
            offset: 0,
            needed: 16,
        });
    }

    // Check magic
    if &data[0..4] != ELF_MAGIC {
        return Err(ElfError::InvalidMagic);
    }

    let class = ElfClass::from_u8(data[4])?;
    let data_encoding = ElfData::from_u8(data[5])?;

    Ok(ElfIdent {
        class,
        data: data_encoding,
        version: data[6],
        osabi: data[7],
        abiversion: data[8],
    })
}

/// Parse ELF header
pub fn parse_header(data: &[u8]) -> Result<ElfHeader> {
    let ident = parse_ident(data)?;
    let class = ident.class;
    let endian = ident.data;

    let header_size = class.header_size();
    if data.len() < header_size {
        return Err(ElfError::Truncated {
            offset: 0,
            needed: header_size,
        });
    }

    let e_type = data.read_u16(16, endian)?;
    let e_machine = data.read_u16(18, endian)?;
    let e_version = data.read_u32(20, endian)?;

    // Address-sized fields shift everything after them on 64-bit.
    let word = usize::from(class.bits() / 8);
    let e_entry = read_addr(data, 24, class, endian)?;
    let e_phoff = read_addr(data, 24 + word, class, endian)?;
    let e_shoff = read_addr(data, 24 + 2 * word, class, endian)?;
    let rest = 24 + 3 * word;
    let e_flags = data.read_u32(rest, endian)?;
    let e_ehsize = data.read_u16(rest + 4, endian)?;
    let e_phentsize = data.read_u16(rest + 6, endian)?;
    let e_phnum = data.read_u16(rest + 8, endian)?;
    let e_shentsize = data.read_u16(rest + 10, endian)?;
    let e_shnum = data.read_u16(rest + 12, endian)?;
    let e_shstrndx = data.read_u16(rest + 14, endian)?;

    if e_ehsize as usize != header_size {
        return Err(ElfError::MalformedHeader(format!(
            "Invalid e_ehsize: expected {}, got {}",
            header_size, e_ehsize
        )));
    }

    let expected_phentsize = match class {
        ElfClass::Elf32 => 32,
        ElfClass::Elf64 => 56,
    };
    if e_phnum > 0 && e_phentsize as usize != expected_phentsize {
        return Err(ElfError::MalformedHeader(format!(
            "Invalid e_phentsize: expected {}, got {}",
            expected_phentsize, e_phentsize
        )));
    }

    let expected_shentsize = class.section_header_size();
    if e_shnum > 0 && e_shentsize as usize != expected_shentsize {
        return Err(ElfError::MalformedHeader(format!(
            "Invalid e_shentsize: expected {}, got {}",
            expected_shentsize, e_shentsize
        )));
    }

    Ok(ElfHeader {
        ident,
        e_type,
        e_machine,
        e_version,
        e_entry,
        e_phoff,
        e_shoff,
        e_flags,
        e_ehsize,
        e_phentsize,
        e_phnum,
        e_shentsize,
        e_shnum,
        e_shstrndx,
    })
}
