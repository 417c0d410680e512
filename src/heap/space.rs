//! Contiguous allocation spaces inside a generation.

use crate::core::address::Address;
use crate::error::{InspectError, Result};
use crate::target::Target;
use crate::typedb::TypeDatabase;
use std::fmt;
use std::io::Write;

/// Field offsets of `MutableSpace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceLayout {
    bottom: u64,
    top: u64,
    end: u64,
}

impl SpaceLayout {
    pub fn resolve(db: &TypeDatabase) -> Result<Self> {
        Ok(Self {
            bottom: db.field_offset("MutableSpace", "_bottom")?,
            top: db.field_offset("MutableSpace", "_top")?,
            end: db.field_offset("MutableSpace", "_end")?,
        })
    }
}

/// Snapshot of a space's three boundary pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceBounds {
    pub bottom: Address,
    pub top: Address,
    pub end: Address,
}

impl SpaceBounds {
    pub fn capacity(&self) -> Result<u64> {
        self.end
            .offset_from(self.bottom)
            .ok_or_else(|| InspectError::Address(format!("space end {} below bottom {}", self.end, self.bottom)))
    }

    pub fn used(&self) -> Result<u64> {
        self.top
            .offset_from(self.bottom)
            .ok_or_else(|| InspectError::Address(format!("space top {} below bottom {}", self.top, self.bottom)))
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr.value() >= self.bottom.value() && addr.value() < self.end.value()
    }

    pub fn is_empty(&self) -> bool {
        self.bottom.value() >= self.end.value()
    }
}

impl fmt::Display for SpaceBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {})", self.bottom, self.top, self.end)
    }
}

/// View of a `MutableSpace` in the target. Every query re-reads the
/// space's fields, so results follow the live target.
#[derive(Debug, Clone)]
pub struct MutableSpace {
    target: Target,
    addr: Address,
    layout: SpaceLayout,
}

impl MutableSpace {
    pub fn new(target: Target, addr: Address, layout: SpaceLayout) -> Self {
        Self {
            target,
            addr,
            layout,
        }
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    fn read_field(&self, offset: u64) -> Result<Address> {
        self.target.read_address(self.addr.add(offset)?)
    }

    pub fn bottom(&self) -> Result<Address> {
        self.read_field(self.layout.bottom)
    }

    pub fn top(&self) -> Result<Address> {
        self.read_field(self.layout.top)
    }

    pub fn end(&self) -> Result<Address> {
        self.read_field(self.layout.end)
    }

    pub fn bounds(&self) -> Result<SpaceBounds> {
        Ok(SpaceBounds {
            bottom: self.bottom()?,
            top: self.top()?,
            end: self.end()?,
        })
    }

    pub fn capacity(&self) -> Result<u64> {
        self.bounds()?.capacity()
    }

    pub fn used(&self) -> Result<u64> {
        self.bounds()?.used()
    }

    pub fn free(&self) -> Result<u64> {
        let bounds = self.bounds()?;
        Ok(bounds.capacity()?.saturating_sub(bounds.used()?))
    }

    pub fn contains(&self, addr: Address) -> Result<bool> {
        Ok(self.bounds()?.contains(addr))
    }

    pub fn print_on(&self, out: &mut dyn Write) -> Result<()> {
        write!(out, "{}", self.bounds()?)?;
        Ok(())
    }
}
