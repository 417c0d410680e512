//! Generations of the Parallel Scavenge heap.
//!
//! A generation is a view over a `PSYoungGen`, `PSOldGen` or `PSPermGen`
//! object in the target. Views hold no cached state; each query reads the
//! target again.

use super::add_sizes;
use super::space::{MutableSpace, SpaceBounds, SpaceLayout};
use crate::core::address::Address;
use crate::error::Result;
use crate::target::Target;
use crate::typedb::TypeDatabase;
use std::io::Write;

/// Capacity, usage and containment for one generation.
pub trait Generation {
    /// Display label, e.g. `PSOldGen`.
    fn name(&self) -> &'static str;

    /// Address of the generation object in the target.
    fn address(&self) -> Address;

    fn capacity(&self) -> Result<u64>;

    fn used(&self) -> Result<u64>;

    fn free(&self) -> Result<u64> {
        Ok(self.capacity()?.saturating_sub(self.used()?))
    }

    fn is_in(&self, addr: Address) -> Result<bool>;

    /// Bounds of every space the generation reserves.
    fn spaces(&self) -> Result<Vec<SpaceBounds>>;

    /// One labeled line.
    fn print_on(&self, out: &mut dyn Write) -> Result<()>;
}

/// Field offsets of `PSYoungGen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YoungGenLayout {
    eden: u64,
    from: u64,
    to: u64,
    space: SpaceLayout,
}

impl YoungGenLayout {
    pub fn resolve(db: &TypeDatabase) -> Result<Self> {
        Ok(Self {
            eden: db.field_offset("PSYoungGen", "_eden_space")?,
            from: db.field_offset("PSYoungGen", "_from_space")?,
            to: db.field_offset("PSYoungGen", "_to_space")?,
            space: SpaceLayout::resolve(db)?,
        })
    }
}

/// Eden plus the two survivor spaces.
#[derive(Debug, Clone)]
pub struct YoungGen {
    target: Target,
    addr: Address,
    layout: YoungGenLayout,
}

impl YoungGen {
    pub fn new(target: Target, addr: Address, layout: YoungGenLayout) -> Self {
        Self {
            target,
            addr,
            layout,
        }
    }

    fn space_at(&self, offset: u64) -> Result<MutableSpace> {
        let space_addr = self.target.read_address(self.addr.add(offset)?)?;
        Ok(MutableSpace::new(self.target.clone(), space_addr, self.layout.space))
    }

    pub fn eden_space(&self) -> Result<MutableSpace> {
        self.space_at(self.layout.eden)
    }

    pub fn from_space(&self) -> Result<MutableSpace> {
        self.space_at(self.layout.from)
    }

    pub fn to_space(&self) -> Result<MutableSpace> {
        self.space_at(self.layout.to)
    }
}

impl Generation for YoungGen {
    fn name(&self) -> &'static str {
        "PSYoungGen"
    }

    fn address(&self) -> Address {
        self.addr
    }

    // The to-space is empty between collections and is not counted.
    fn capacity(&self) -> Result<u64> {
        add_sizes(
            "young capacity",
            self.eden_space()?.capacity()?,
            self.from_space()?.capacity()?,
        )
    }

    fn used(&self) -> Result<u64> {
        add_sizes(
            "young used",
            self.eden_space()?.used()?,
            self.from_space()?.used()?,
        )
    }

    fn is_in(&self, addr: Address) -> Result<bool> {
        Ok(self.eden_space()?.contains(addr)?
            || self.from_space()?.contains(addr)?
            || self.to_space()?.contains(addr)?)
    }

    fn spaces(&self) -> Result<Vec<SpaceBounds>> {
        Ok(vec![
            self.eden_space()?.bounds()?,
            self.from_space()?.bounds()?,
            self.to_space()?.bounds()?,
        ])
    }

    fn print_on(&self, out: &mut dyn Write) -> Result<()> {
        write!(out, "{} [ eden = ", self.name())?;
        self.eden_space()?.print_on(out)?;
        write!(out, ", from = ")?;
        self.from_space()?.print_on(out)?;
        write!(out, ", to = ")?;
        self.to_space()?.print_on(out)?;
        writeln!(out, " ]")?;
        Ok(())
    }
}

/// Field offsets of a generation backed by a single `_object_space`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectSpaceGenLayout {
    object_space: u64,
    space: SpaceLayout,
}

impl ObjectSpaceGenLayout {
    pub fn resolve(db: &TypeDatabase, type_name: &str) -> Result<Self> {
        Ok(Self {
            object_space: db.field_offset(type_name, "_object_space")?,
            space: SpaceLayout::resolve(db)?,
        })
    }
}

/// Shared body of the old and permanent generations.
#[derive(Debug, Clone)]
pub struct ObjectSpaceGen {
    target: Target,
    addr: Address,
    layout: ObjectSpaceGenLayout,
}

impl ObjectSpaceGen {
    pub fn new(target: Target, addr: Address, layout: ObjectSpaceGenLayout) -> Self {
        Self {
            target,
            addr,
            layout,
        }
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    pub fn object_space(&self) -> Result<MutableSpace> {
        let space_addr = self
            .target
            .read_address(self.addr.add(self.layout.object_space)?)?;
        Ok(MutableSpace::new(self.target.clone(), space_addr, self.layout.space))
    }

    pub fn capacity(&self) -> Result<u64> {
        self.object_space()?.capacity()
    }

    pub fn used(&self) -> Result<u64> {
        self.object_space()?.used()
    }

    pub fn is_in(&self, addr: Address) -> Result<bool> {
        self.object_space()?.contains(addr)
    }

    pub fn spaces(&self) -> Result<Vec<SpaceBounds>> {
        Ok(vec![self.object_space()?.bounds()?])
    }

    fn print_labeled(&self, label: &str, out: &mut dyn Write) -> Result<()> {
        write!(out, "{} [ ", label)?;
        self.object_space()?.print_on(out)?;
        writeln!(out, " ]")?;
        Ok(())
    }
}

macro_rules! object_space_generation {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            inner: ObjectSpaceGen,
        }

        impl $name {
            pub fn new(target: Target, addr: Address, layout: ObjectSpaceGenLayout) -> Self {
                Self {
                    inner: ObjectSpaceGen::new(target, addr, layout),
                }
            }

            pub fn object_space(&self) -> Result<MutableSpace> {
                self.inner.object_space()
            }
        }

        impl Generation for $name {
            fn name(&self) -> &'static str {
                $label
            }

            fn address(&self) -> Address {
                self.inner.address()
            }

            fn capacity(&self) -> Result<u64> {
                self.inner.capacity()
            }

            fn used(&self) -> Result<u64> {
                self.inner.used()
            }

            fn is_in(&self, addr: Address) -> Result<bool> {
                self.inner.is_in(addr)
            }

            fn spaces(&self) -> Result<Vec<SpaceBounds>> {
                self.inner.spaces()
            }

            fn print_on(&self, out: &mut dyn Write) -> Result<()> {
                self.inner.print_labeled($label, out)
            }
        }
    };
}

object_space_generation!(
    /// The tenured generation.
    OldGen,
    "PSOldGen"
);

object_space_generation!(
    /// The permanent generation holding class metadata.
    PermGen,
    "PSPermGen"
);
