//! Read-only model of the JVM's garbage-collected heap.
//!
//! Heap views are built from an address in the target plus field offsets
//! resolved from a [`crate::typedb::TypeDatabase`]. They cache nothing
//! about the target, so every query reflects the target's current state.

pub mod generation;
pub mod parallel;
pub mod space;

pub use generation::{Generation, ObjectSpaceGen, OldGen, PermGen, YoungGen};
pub use parallel::{locate_collected_heap, HeapSummary, ParallelScavengeHeap, ParallelScavengeLayout};
pub use space::{MutableSpace, SpaceBounds};

use crate::core::address::Address;
use crate::error::{InspectError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Collector family of a heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeapKind {
    ParallelScavenge,
    GenCollected,
    G1,
}

impl HeapKind {
    /// Name of the runtime's heap class.
    pub fn label(self) -> &'static str {
        match self {
            HeapKind::ParallelScavenge => "ParallelScavengeHeap",
            HeapKind::GenCollected => "GenCollectedHeap",
            HeapKind::G1 => "G1CollectedHeap",
        }
    }
}

impl fmt::Display for HeapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Interface shared by all collector heaps.
pub trait CollectedHeap: Send + Sync {
    fn kind(&self) -> HeapKind;

    fn capacity(&self) -> Result<u64>;

    fn used(&self) -> Result<u64>;

    fn free(&self) -> Result<u64> {
        Ok(self.capacity()?.saturating_sub(self.used()?))
    }

    /// Whether `addr` falls inside any part of the heap.
    fn is_in(&self, addr: Address) -> Result<bool>;

    /// Heap label, then one line per generation.
    fn print_on(&self, out: &mut dyn Write) -> Result<()>;
}

/// Sum of two sizes read from the target. Inconsistent bounds can push the
/// total past `u64::MAX`, which is reported rather than wrapped.
pub(crate) fn add_sizes(what: &str, a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or_else(|| {
        InspectError::Address(format!("{} {:#x} + {:#x} overflows", what, a, b))
    })
}
