//! Snapshot of a Parallel Scavenge heap laid out in target memory.

use heapscope::TypeDatabase;
use heapscope::SnapshotMemory;
use std::sync::Arc;

pub const HEAP: u64 = 0x10000;
pub const YOUNG: u64 = 0x10100;
pub const OLD: u64 = 0x10200;
pub const PERM: u64 = 0x10300;
pub const EDEN_SPACE: u64 = 0x10400;
pub const FROM_SPACE: u64 = 0x10420;
pub const TO_SPACE: u64 = 0x10440;
pub const OLD_SPACE: u64 = 0x10460;
pub const PERM_SPACE: u64 = 0x10480;

pub fn type_database() -> TypeDatabase {
    TypeDatabase::new()
        .with_type(
            "ParallelScavengeHeap",
            24,
            &[("_young_gen", 0), ("_old_gen", 8), ("_perm_gen", 16)],
        )
        .with_type(
            "PSYoungGen",
            24,
            &[("_eden_space", 0), ("_from_space", 8), ("_to_space", 16)],
        )
        .with_type("PSOldGen", 8, &[("_object_space", 0)])
        .with_type(
            "MutableSpace",
            24,
            &[("_bottom", 0), ("_top", 8), ("_end", 16)],
        )
}

fn words(values: &[u64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Eden [0x1000, 0x1500) with top 0x1200, empty survivors at 0x1500,
/// old [0x2000, 0x2800) and perm [0x3000, 0x3400), each with top at bottom.
pub fn snapshot() -> Arc<SnapshotMemory> {
    let memory = Arc::new(SnapshotMemory::new());
    memory.map_region(HEAP, words(&[YOUNG, OLD, PERM]));
    memory.map_region(YOUNG, words(&[EDEN_SPACE, FROM_SPACE, TO_SPACE]));
    memory.map_region(OLD, words(&[OLD_SPACE]));
    memory.map_region(PERM, words(&[PERM_SPACE]));
    memory.map_region(EDEN_SPACE, words(&[0x1000, 0x1200, 0x1500]));
    memory.map_region(FROM_SPACE, words(&[0x1500, 0x1500, 0x1500]));
    memory.map_region(TO_SPACE, words(&[0x1500, 0x1500, 0x1500]));
    memory.map_region(OLD_SPACE, words(&[0x2000, 0x2000, 0x2800]));
    memory.map_region(PERM_SPACE, words(&[0x3000, 0x3000, 0x3400]));
    memory
}

/// Overwrite one pointer-sized field in the snapshot.
pub fn poke(memory: &SnapshotMemory, addr: u64, value: u64) {
    memory
        .write_bytes(addr, &value.to_le_bytes())
        .expect("address is mapped");
}
