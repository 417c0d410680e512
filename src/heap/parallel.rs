//! The Parallel Scavenge heap: one young, one old and one permanent
//! generation.

use super::generation::{Generation, ObjectSpaceGenLayout, OldGen, PermGen, YoungGen, YoungGenLayout};
use super::{add_sizes, CollectedHeap, HeapKind};
use crate::core::address::Address;
use crate::error::{InspectError, Result};
use crate::loaded::ObjectDirectory;
use crate::target::Target;
use crate::typedb::TypeDatabase;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

/// Mangled name of `Universe::_collectedHeap`, the runtime's heap pointer.
pub const COLLECTED_HEAP_SYMBOL: &str = "_ZN8Universe14_collectedHeapE";

/// Every field offset the heap views need, resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelScavengeLayout {
    young_gen: u64,
    old_gen: u64,
    perm_gen: u64,
    young: YoungGenLayout,
    old: ObjectSpaceGenLayout,
    perm: ObjectSpaceGenLayout,
}

impl ParallelScavengeLayout {
    /// Resolve offsets from `db`. The permanent generation uses `PSPermGen`
    /// when the database has it and shares the `PSOldGen` layout otherwise.
    pub fn resolve(db: &TypeDatabase) -> Result<Arc<Self>> {
        let perm_type = if db.has_type("PSPermGen") {
            "PSPermGen"
        } else {
            "PSOldGen"
        };
        let layout = Self {
            young_gen: db.field_offset("ParallelScavengeHeap", "_young_gen")?,
            old_gen: db.field_offset("ParallelScavengeHeap", "_old_gen")?,
            perm_gen: db.field_offset("ParallelScavengeHeap", "_perm_gen")?,
            young: YoungGenLayout::resolve(db)?,
            old: ObjectSpaceGenLayout::resolve(db, "PSOldGen")?,
            perm: ObjectSpaceGenLayout::resolve(db, perm_type)?,
        };
        debug!(perm_type, "Resolved ParallelScavengeHeap layout");
        Ok(Arc::new(layout))
    }
}

/// Figures for one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub name: String,
    pub address: Address,
    pub capacity: u64,
    pub used: u64,
    pub free: u64,
}

impl GenerationSummary {
    fn of(generation: &dyn Generation) -> Result<Self> {
        let capacity = generation.capacity()?;
        let used = generation.used()?;
        Ok(Self {
            name: generation.name().to_string(),
            address: generation.address(),
            capacity,
            used,
            free: capacity.saturating_sub(used),
        })
    }
}

/// Heap-wide figures, in the same terms as [`CollectedHeap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapSummary {
    pub kind: HeapKind,
    pub address: Address,
    pub capacity: u64,
    pub used: u64,
    pub free: u64,
    pub generations: Vec<GenerationSummary>,
}

impl fmt::Display for HeapSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} at {}: capacity {}K, used {}K",
            self.kind,
            self.address,
            self.capacity / 1024,
            self.used / 1024
        )?;
        for generation in &self.generations {
            writeln!(
                f,
                "  {:<10} capacity {}K, used {}K, free {}K",
                generation.name,
                generation.capacity / 1024,
                generation.used / 1024,
                generation.free / 1024
            )?;
        }
        Ok(())
    }
}

/// View of a `ParallelScavengeHeap` object in the target.
#[derive(Debug, Clone)]
pub struct ParallelScavengeHeap {
    target: Target,
    addr: Address,
    layout: Arc<ParallelScavengeLayout>,
}

impl ParallelScavengeHeap {
    pub fn new(target: Target, addr: Address, layout: Arc<ParallelScavengeLayout>) -> Self {
        Self {
            target,
            addr,
            layout,
        }
    }

    /// Resolve the layout from `db` and bind it to the heap at `addr`.
    pub fn attach(target: Target, addr: Address, db: &TypeDatabase) -> Result<Self> {
        let layout = ParallelScavengeLayout::resolve(db)?;
        debug!(heap = %addr, "Attached to ParallelScavengeHeap");
        Ok(Self::new(target, addr, layout))
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    pub fn layout(&self) -> &Arc<ParallelScavengeLayout> {
        &self.layout
    }

    fn generation_at(&self, offset: u64) -> Result<Address> {
        self.target.read_address(self.addr.add(offset)?)
    }

    pub fn young_gen(&self) -> Result<YoungGen> {
        let addr = self.generation_at(self.layout.young_gen)?;
        Ok(YoungGen::new(self.target.clone(), addr, self.layout.young))
    }

    pub fn old_gen(&self) -> Result<OldGen> {
        let addr = self.generation_at(self.layout.old_gen)?;
        Ok(OldGen::new(self.target.clone(), addr, self.layout.old))
    }

    pub fn perm_gen(&self) -> Result<PermGen> {
        let addr = self.generation_at(self.layout.perm_gen)?;
        Ok(PermGen::new(self.target.clone(), addr, self.layout.perm))
    }

    fn generations(&self) -> Result<Vec<Box<dyn Generation>>> {
        Ok(vec![
            Box::new(self.young_gen()?) as Box<dyn Generation>,
            Box::new(self.old_gen()?) as Box<dyn Generation>,
            Box::new(self.perm_gen()?) as Box<dyn Generation>,
        ])
    }

    pub fn summary(&self) -> Result<HeapSummary> {
        let generations = self
            .generations()?
            .iter()
            .map(|g| GenerationSummary::of(g.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let capacity = self.capacity()?;
        let used = self.used()?;
        Ok(HeapSummary {
            kind: self.kind(),
            address: self.addr,
            capacity,
            used,
            free: capacity.saturating_sub(used),
            generations,
        })
    }

    /// Check that no two generations reserve overlapping address ranges.
    pub fn verify_disjoint(&self) -> Result<()> {
        let mut ranges = Vec::new();
        for generation in self.generations()? {
            for bounds in generation.spaces()? {
                if !bounds.is_empty() {
                    ranges.push((generation.name(), bounds));
                }
            }
        }
        for (i, (first, a)) in ranges.iter().enumerate() {
            for (second, b) in &ranges[i + 1..] {
                let overlaps = a.bottom.value() < b.end.value() && b.bottom.value() < a.end.value();
                if first != second && overlaps {
                    return Err(InspectError::OverlappingGenerations {
                        first: *first,
                        second: *second,
                    });
                }
            }
        }
        Ok(())
    }
}

impl CollectedHeap for ParallelScavengeHeap {
    fn kind(&self) -> HeapKind {
        HeapKind::ParallelScavenge
    }

    // Perm holds class metadata, not Java objects, and is not counted.
    fn capacity(&self) -> Result<u64> {
        add_sizes(
            "heap capacity",
            self.young_gen()?.capacity()?,
            self.old_gen()?.capacity()?,
        )
    }

    fn used(&self) -> Result<u64> {
        add_sizes("heap used", self.young_gen()?.used()?, self.old_gen()?.used()?)
    }

    fn is_in(&self, addr: Address) -> Result<bool> {
        Ok(self.young_gen()?.is_in(addr)?
            || self.old_gen()?.is_in(addr)?
            || self.perm_gen()?.is_in(addr)?)
    }

    fn print_on(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{} at {}", self.kind(), self.addr)?;
        for generation in self.generations()? {
            write!(out, "  ")?;
            generation.print_on(out)?;
        }
        Ok(())
    }
}

/// Find the heap through `Universe::_collectedHeap` in the loaded objects.
///
/// Returns `None` when no object defines the symbol or the runtime has not
/// created its heap yet.
pub fn locate_collected_heap(directory: &ObjectDirectory, target: &Target) -> Result<Option<Address>> {
    let Some(slot) = directory.lookup_symbol(COLLECTED_HEAP_SYMBOL)? else {
        debug!("Universe::_collectedHeap not found in loaded objects");
        return Ok(None);
    };
    let heap = target.read_address(slot)?;
    debug!(slot = %slot, heap = %heap, "Read collected heap pointer");
    Ok((!heap.is_null()).then_some(heap))
}
