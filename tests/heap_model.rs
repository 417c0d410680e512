//! End-to-end checks of the Parallel Scavenge heap model over a snapshot.

mod common;

use common::heap::{self, poke};
use common::{addr, lp64};
use heapscope::heap::{CollectedHeap, Generation, HeapKind, ParallelScavengeHeap};
use heapscope::{InspectError, TypeDatabase};

fn attach(memory: std::sync::Arc<heapscope::SnapshotMemory>) -> ParallelScavengeHeap {
    ParallelScavengeHeap::attach(lp64(memory), addr(heap::HEAP), &heap::type_database()).unwrap()
}

#[test]
fn capacity_and_containment() {
    let heap = attach(heap::snapshot());

    assert_eq!(heap.kind(), HeapKind::ParallelScavenge);
    assert_eq!(heap.capacity().unwrap(), 0xd00);
    assert_eq!(heap.used().unwrap(), 0x200);
    assert_eq!(heap.free().unwrap(), 0xb00);

    assert!(heap.is_in(addr(0x1200)).unwrap());
    assert!(!heap.is_in(addr(0x1900)).unwrap());
    assert!(heap.is_in(addr(0x27ff)).unwrap());
    // Perm is not counted in capacity but still belongs to the heap.
    assert!(heap.is_in(addr(0x3000)).unwrap());
    assert!(!heap.is_in(addr(0x3400)).unwrap());
}

#[test]
fn generations_report_their_own_figures() {
    let heap = attach(heap::snapshot());

    let young = heap.young_gen().unwrap();
    assert_eq!(young.address(), addr(heap::YOUNG));
    assert_eq!(young.capacity().unwrap(), 0x500);
    assert_eq!(young.used().unwrap(), 0x200);

    let old = heap.old_gen().unwrap();
    assert_eq!(old.capacity().unwrap(), 0x800);
    assert_eq!(old.used().unwrap(), 0);

    let perm = heap.perm_gen().unwrap();
    assert_eq!(perm.name(), "PSPermGen");
    assert_eq!(perm.capacity().unwrap(), 0x400);
    assert!(perm.used().unwrap() <= perm.capacity().unwrap());
}

#[test]
fn reflects_target_changes_between_calls() {
    let memory = heap::snapshot();
    let heap = attach(memory.clone());
    assert_eq!(heap.used().unwrap(), 0x200);

    // Allocation in eden, then a promotion into old.
    poke(&memory, heap::EDEN_SPACE + 8, 0x1400);
    assert_eq!(heap.used().unwrap(), 0x400);
    poke(&memory, heap::OLD_SPACE + 8, 0x2100);
    assert_eq!(heap.used().unwrap(), 0x500);

    // Old gen grows.
    poke(&memory, heap::OLD_SPACE + 16, 0x2c00);
    assert_eq!(heap.capacity().unwrap(), 0x1100);
    assert!(heap.is_in(addr(0x2a00)).unwrap());
}

#[test]
fn prints_label_then_generations() {
    let heap = attach(heap::snapshot());
    let mut out = Vec::new();
    heap.print_on(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("ParallelScavengeHeap"));
    assert!(lines[1].trim_start().starts_with("PSYoungGen [ eden = "));
    assert!(lines[2].trim_start().starts_with("PSOldGen [ "));
    assert!(lines[3].trim_start().starts_with("PSPermGen [ "));
}

#[test]
fn summary_and_disjointness() {
    let memory = heap::snapshot();
    let heap = attach(memory.clone());

    let summary = heap.summary().unwrap();
    assert_eq!(summary.capacity, 0xd00);
    assert_eq!(summary.generations.len(), 3);
    heap.verify_disjoint().unwrap();

    // Stretch eden over the old generation.
    poke(&memory, heap::EDEN_SPACE + 16, 0x2100);
    assert!(matches!(
        heap.verify_disjoint(),
        Err(InspectError::OverlappingGenerations {
            first: "PSYoungGen",
            second: "PSOldGen"
        })
    ));
}

#[test]
fn attaches_from_json_type_database() {
    let json = serde_json::to_string(&heap::type_database()).unwrap();
    let db = TypeDatabase::from_json(&json).unwrap();
    let heap = ParallelScavengeHeap::attach(lp64(heap::snapshot()), addr(heap::HEAP), &db).unwrap();
    assert_eq!(heap.capacity().unwrap(), 0xd00);
}

#[test]
fn unreadable_heap_is_an_error() {
    let heap = ParallelScavengeHeap::attach(
        lp64(heap::snapshot()),
        addr(0xdead_0000),
        &heap::type_database(),
    )
    .unwrap();
    assert!(matches!(heap.capacity(), Err(InspectError::ProcessRead(_))));
}
