//! Common test utilities and helpers.
//!
//! Builders for synthetic ELF images and heap snapshots shared by the
//! integration tests.

#![allow(dead_code)]

pub mod elf;
pub mod heap;

use heapscope::{Address, Target};
use std::sync::Arc;

pub fn lp64(memory: Arc<heapscope::SnapshotMemory>) -> Target {
    Target::lp64(memory)
}

pub fn addr(value: u64) -> Address {
    Address::new64(value)
}
