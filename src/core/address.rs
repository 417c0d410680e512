//! Address values in the target's address space.
//!
//! An [`Address`] carries its bit width so that values computed for a
//! 32-bit target are checked against that width. [`AddressWidth`] is the
//! strategy that turns raw numbers into addresses for a given target.

use crate::error::{InspectError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pointer width of the inspected process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressWidth {
    Bits32,
    #[default]
    Bits64,
}

impl AddressWidth {
    pub fn bits(self) -> u8 {
        match self {
            AddressWidth::Bits32 => 32,
            AddressWidth::Bits64 => 64,
        }
    }

    /// Size of a pointer in the target, in bytes.
    pub fn pointer_size(self) -> usize {
        usize::from(self.bits() / 8)
    }

    pub fn max_value(self) -> u64 {
        match self {
            AddressWidth::Bits32 => u64::from(u32::MAX),
            AddressWidth::Bits64 => u64::MAX,
        }
    }

    /// Reinterpret a raw value as an absolute address of this width.
    pub fn new_address(self, value: u64) -> Result<Address> {
        if value > self.max_value() {
            return Err(InspectError::Address(format!(
                "value {:#x} exceeds maximum for {}-bit address",
                value,
                self.bits()
            )));
        }
        Ok(Address {
            value,
            bits: self.bits(),
        })
    }

    /// Numeric value of an address, as the width sees it.
    pub fn address_value(self, addr: Address) -> u64 {
        addr.value & self.max_value()
    }
}

/// An absolute address in the target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    value: u64,
    bits: u8,
}

impl Address {
    /// Shorthand for a 64-bit address.
    pub const fn new64(value: u64) -> Self {
        Address { value, bits: 64 }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn width(&self) -> AddressWidth {
        if self.bits == 32 {
            AddressWidth::Bits32
        } else {
            AddressWidth::Bits64
        }
    }

    /// Add an offset, failing on overflow of the address width.
    pub fn add(&self, offset: u64) -> Result<Self> {
        let value = self
            .value
            .checked_add(offset)
            .ok_or_else(|| InspectError::Address(format!("{} + {:#x} overflows", self, offset)))?;
        self.width().new_address(value)
    }

    /// Distance from `base` up to this address, if this address is not below it.
    pub fn offset_from(&self, base: Address) -> Option<u64> {
        self.value.checked_sub(base.value)
    }

    pub fn is_null(&self) -> bool {
        self.value == 0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = usize::from(self.bits / 4);
        write!(f, "{:#0width$x}", self.value, width = digits + 2)
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value
            .cmp(&other.value)
            .then_with(|| self.bits.cmp(&other.bits))
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
