//! ELF (Executable and Linkable Format) parser
//!
//! Parses an image once into an immutable [`ElfImage`] holding the header
//! and the merged symbol table. Images can come from a file on disk or
//! from bytes read out of an inspected process.

pub mod headers;
pub mod sections;
pub mod symbols;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::io::{IOLimits, SafeReader};
use crate::target::Target;
use bytes::{Bytes, BytesMut};
use headers::parse_header;
use sections::SectionTable;
use std::path::{Path, PathBuf};
pub use symbols::{Symbol, SymbolBinding, SymbolKind, SymbolTable};
use tracing::debug;
pub use types::*;

/// Size of the `e_ident` block at the start of every ELF file.
const EI_NIDENT: u64 = 16;

/// Parsed, immutable binary image
pub struct ElfImage {
    data: Bytes,
    header: ElfHeader,
    symbols: SymbolTable,
}

impl ElfImage {
    /// Parse ELF from raw data
    pub fn parse(data: Bytes) -> Result<Self> {
        let header = parse_header(&data)?;
        let sections = SectionTable::parse(&data, &header)?;
        let symbols = SymbolTable::from_sections(&sections, header.ident.class, header.ident.data)?;

        debug!(
            file_type = %header.file_type(),
            bits = header.ident.class.bits(),
            sections = sections.count(),
            symbols = symbols.count(),
            "Parsed ELF image"
        );

        Ok(Self {
            data,
            header,
            symbols,
        })
    }

    /// Get ELF header
    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// Raw image bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn file_type(&self) -> ElfType {
        self.header.file_type()
    }

    /// True when the file type field is `ET_DYN`.
    pub fn is_shared_object(&self) -> bool {
        self.header.is_dynamic()
    }

    pub fn entry(&self) -> u64 {
        self.header.entry_point()
    }

    pub fn class(&self) -> ElfClass {
        self.header.ident.class
    }

    pub fn machine(&self) -> ElfMachine {
        self.header.machine()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn find_symbol_by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols.by_name(name)
    }

    /// Nearest symbol at or below `offset`.
    pub fn find_symbol_by_offset(&self, offset: u64) -> Option<&Symbol> {
        self.symbols.nearest_at_or_before(offset)
    }
}

impl std::fmt::Debug for ElfImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElfImage")
            .field("file_type", &self.file_type())
            .field("class", &self.class())
            .field("machine", &self.machine())
            .field("entry", &format_args!("{:#x}", self.entry()))
            .field("len", &self.data.len())
            .field("symbols", &self.symbols.count())
            .finish()
    }
}

/// Where the bytes of an image come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// The file mapped into the target, read from disk.
    File(PathBuf),
    /// `size` bytes of the target's address space starting at `base`.
    TargetMemory { base: u64, size: u64 },
}

impl ImageSource {
    /// Load and parse the image.
    pub fn load(&self, target: &Target, limits: &IOLimits) -> crate::error::Result<ElfImage> {
        match self {
            ImageSource::File(path) => ElfImage::open(path, limits),
            ImageSource::TargetMemory { base, size } => {
                ElfImage::from_target(target, *base, *size, limits)
            }
        }
    }
}

impl ElfImage {
    /// Parse an image from a file on disk.
    pub fn open<P: AsRef<Path>>(path: P, limits: &IOLimits) -> crate::error::Result<Self> {
        let mut reader = SafeReader::open(path.as_ref(), limits.clone())?;
        let size = reader.size();
        // Reject non-ELF files before reading the rest of them.
        let ident = reader.read_prefix(EI_NIDENT)?;
        headers::parse_ident(&ident)?;
        let ident_len = ident.len() as u64;
        let rest = reader.read_at(ident_len, size.saturating_sub(ident_len))?;

        let mut data = BytesMut::with_capacity(ident.len() + rest.len());
        data.extend_from_slice(&ident);
        data.extend_from_slice(&rest);
        Ok(Self::parse(data.freeze())?)
    }

    /// Parse an image out of the target's address space.
    pub fn from_target(
        target: &Target,
        base: u64,
        size: u64,
        limits: &IOLimits,
    ) -> crate::error::Result<Self> {
        if size > limits.max_file_size {
            return Err(crate::io::error::IoError::RegionTooLarge {
                base,
                limit: limits.max_file_size,
                found: size,
            }
            .into());
        }
        let data = target.read_bytes(base, size as usize)?;
        Ok(Self::parse(Bytes::from(data))?)
    }
}
