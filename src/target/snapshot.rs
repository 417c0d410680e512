//! In-memory snapshot of a target's address space.
//!
//! Holds a set of non-overlapping regions, the way a core file records the
//! mapped memory of a dead process. Regions can be replaced while readers
//! hold the snapshot, which lets callers emulate a live target changing
//! between queries.

use super::{ProcessReadError, TargetMemory};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct SnapshotMemory {
    regions: RwLock<BTreeMap<u64, Vec<u8>>>,
}

impl SnapshotMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `bytes` at `base`, replacing any region that starts there.
    pub fn map_region(&self, base: u64, bytes: Vec<u8>) {
        let mut regions = self.regions.write().unwrap_or_else(|e| e.into_inner());
        regions.insert(base, bytes);
    }

    /// Remove the region starting at `base`.
    pub fn unmap_region(&self, base: u64) -> Option<Vec<u8>> {
        let mut regions = self.regions.write().unwrap_or_else(|e| e.into_inner());
        regions.remove(&base)
    }

    /// Overwrite bytes inside an existing region.
    pub fn write_bytes(&self, addr: u64, bytes: &[u8]) -> Result<(), ProcessReadError> {
        let mut regions = self.regions.write().unwrap_or_else(|e| e.into_inner());
        let unmapped = ProcessReadError::Unmapped {
            addr,
            len: bytes.len(),
        };
        let Some((&base, region)) = regions.range_mut(..=addr).next_back() else {
            return Err(unmapped);
        };
        let start = (addr - base) as usize;
        match region.get_mut(start..start + bytes.len()) {
            Some(dst) => {
                dst.copy_from_slice(bytes);
                Ok(())
            }
            None => Err(unmapped),
        }
    }

    pub fn region_count(&self) -> usize {
        self.regions.read().map(|r| r.len()).unwrap_or(0)
    }
}

impl TargetMemory for SnapshotMemory {
    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>, ProcessReadError> {
        let regions = self.regions.read().unwrap_or_else(|e| e.into_inner());
        let (&base, region) = regions
            .range(..=addr)
            .next_back()
            .ok_or(ProcessReadError::Unmapped { addr, len })?;

        let start = (addr - base) as usize;
        start
            .checked_add(len)
            .and_then(|end| region.get(start..end))
            .map(|bytes| bytes.to_vec())
            .ok_or(ProcessReadError::Unmapped { addr, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_within_regions() {
        let memory = SnapshotMemory::new();
        memory.map_region(0x1000, (0u8..16).collect());
        memory.map_region(0x4000, vec![0xaa; 4]);

        assert_eq!(memory.read_bytes(0x1004, 3).unwrap(), vec![4, 5, 6]);
        assert_eq!(memory.read_bytes(0x4000, 4).unwrap(), vec![0xaa; 4]);
        assert_eq!(memory.region_count(), 2);
    }

    #[test]
    fn rejects_reads_across_region_end() {
        let memory = SnapshotMemory::new();
        memory.map_region(0x1000, vec![0; 16]);
        assert!(memory.read_bytes(0x100c, 8).is_err());
        assert!(memory.read_bytes(0x0fff, 1).is_err());
        assert!(memory.read_bytes(0x2000, 1).is_err());
    }

    #[test]
    fn write_and_unmap() {
        let memory = SnapshotMemory::new();
        memory.map_region(0x1000, vec![0; 8]);
        memory.write_bytes(0x1002, &[7, 8]).unwrap();
        assert_eq!(memory.read_bytes(0x1000, 4).unwrap(), vec![0, 0, 7, 8]);
        assert!(memory.write_bytes(0x1007, &[1, 2]).is_err());

        memory.unmap_region(0x1000);
        assert!(memory.read_bytes(0x1000, 1).is_err());
    }
}
