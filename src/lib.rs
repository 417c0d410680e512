//! Read-only, out-of-process inspection of a JVM heap.
//!
//! heapscope resolves native symbols in the shared objects mapped into a
//! target process and walks the Parallel Scavenge heap by reading fields out
//! of the target's memory.

/// Core data types module
pub mod core;

pub mod config;
pub mod demangle;
pub mod error;
pub mod formats;
pub mod heap;
pub mod io;
pub mod loaded;
pub mod logging;
pub mod target;
pub mod typedb;

pub use crate::config::InspectorConfig;
pub use crate::core::{Address, AddressWidth};
pub use crate::error::{InspectError, Result};
pub use crate::heap::{CollectedHeap, Generation, HeapKind, ParallelScavengeHeap};
pub use crate::loaded::{ClosestSymbol, LoadedObject, ObjectDirectory};
pub use crate::target::{Endianness, SnapshotMemory, Target, TargetMemory};
pub use crate::typedb::TypeDatabase;
