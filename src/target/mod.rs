//! Read-only access to the inspected process.
//!
//! [`TargetMemory`] is the seam to whatever provides the target's bytes: a
//! live process, a core file, or an in-memory snapshot. [`Target`] bundles a
//! reader with the target's pointer width and byte order and is what the
//! rest of the crate passes around. Nothing here ever writes to the target.

pub mod maps;
#[cfg(target_os = "linux")]
pub mod proc;
pub mod snapshot;

pub use maps::{parse_maps, read_proc_maps, MappedRegion};
#[cfg(target_os = "linux")]
pub use proc::ProcMemory;
pub use snapshot::SnapshotMemory;

use crate::core::address::{Address, AddressWidth};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Errors raised while reading target memory.
#[derive(Debug, Error)]
pub enum ProcessReadError {
    #[error("range {addr:#x}..+{len:#x} is not mapped in the target")]
    Unmapped { addr: u64, len: usize },

    #[error("read of {len:#x} bytes at {addr:#x} failed: {source}")]
    Os {
        addr: u64,
        len: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open memory of process {pid}: {source}")]
    Attach {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Byte order of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// Bounded reads from the target's address space.
pub trait TargetMemory: Send + Sync {
    /// Read exactly `len` bytes starting at `addr`.
    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>, ProcessReadError>;

    fn read_u32(&self, addr: u64, endian: Endianness) -> Result<u32, ProcessReadError> {
        let b = self.read_bytes(addr, 4)?;
        let bytes = [b[0], b[1], b[2], b[3]];
        Ok(match endian {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        })
    }

    fn read_u64(&self, addr: u64, endian: Endianness) -> Result<u64, ProcessReadError> {
        let b = self.read_bytes(addr, 8)?;
        let bytes = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
        Ok(match endian {
            Endianness::Little => u64::from_le_bytes(bytes),
            Endianness::Big => u64::from_be_bytes(bytes),
        })
    }
}

/// An attached target: a memory reader plus its data model.
#[derive(Clone)]
pub struct Target {
    memory: Arc<dyn TargetMemory>,
    width: AddressWidth,
    endian: Endianness,
}

impl Target {
    pub fn new(memory: Arc<dyn TargetMemory>, width: AddressWidth, endian: Endianness) -> Self {
        Self {
            memory,
            width,
            endian,
        }
    }

    /// A little-endian 64-bit target, the common case.
    pub fn lp64(memory: Arc<dyn TargetMemory>) -> Self {
        Self::new(memory, AddressWidth::Bits64, Endianness::Little)
    }

    pub fn width(&self) -> AddressWidth {
        self.width
    }

    pub fn endianness(&self) -> Endianness {
        self.endian
    }

    pub fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>, ProcessReadError> {
        trace!(addr = format_args!("{:#x}", addr), len, "Reading target memory");
        self.memory.read_bytes(addr, len)
    }

    /// Read a pointer-sized unsigned word.
    pub fn read_word(&self, addr: Address) -> Result<u64, ProcessReadError> {
        match self.width {
            AddressWidth::Bits32 => self
                .memory
                .read_u32(addr.value(), self.endian)
                .map(u64::from),
            AddressWidth::Bits64 => self.memory.read_u64(addr.value(), self.endian),
        }
    }

    /// Read a pointer field and return it as an address.
    pub fn read_address(&self, addr: Address) -> crate::error::Result<Address> {
        let raw = self.read_word(addr)?;
        self.width.new_address(raw)
    }

    /// Make an address of this target's width.
    pub fn address(&self, value: u64) -> crate::error::Result<Address> {
        self.width.new_address(value)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("width", &self.width)
            .field("endian", &self.endian)
            .finish_non_exhaustive()
    }
}
