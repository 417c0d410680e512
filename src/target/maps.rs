//! Parsing of `/proc/<pid>/maps` listings.
//!
//! Each line reads `start-end perms offset dev inode [pathname]`.

use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One mapping of the target's address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRegion {
    pub start: u64,
    pub end: u64,
    pub perms: String,
    pub offset: u64,
    pub path: Option<PathBuf>,
}

impl MappedRegion {
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }

    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    /// Backed by a real file rather than `[heap]`, `[stack]` and similar.
    pub fn is_file_backed(&self) -> bool {
        self.path.as_ref().is_some_and(|p| p.is_absolute())
    }
}

fn parse_line(line: &str) -> Option<MappedRegion> {
    let mut parts = line.split_whitespace();
    let (start, end) = parts.next()?.split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    if end < start {
        return None;
    }
    let perms = parts.next()?.to_string();
    let offset = u64::from_str_radix(parts.next()?, 16).ok()?;
    let _dev = parts.next()?;
    let _inode = parts.next()?;
    // Paths may contain spaces; " (deleted)" suffixes are kept as-is.
    let rest: Vec<&str> = parts.collect();
    let path = (!rest.is_empty()).then(|| PathBuf::from(rest.join(" ")));

    Some(MappedRegion {
        start,
        end,
        perms,
        offset,
        path,
    })
}

/// Parse a maps listing, skipping lines that do not parse.
pub fn parse_maps(text: &str) -> Vec<MappedRegion> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let region = parse_line(line);
            if region.is_none() {
                warn!(line, "Skipping unparsable maps line");
            }
            region
        })
        .collect()
}

/// Read and parse `/proc/<pid>/maps`.
pub fn read_proc_maps(pid: u32) -> std::io::Result<Vec<MappedRegion>> {
    let text = fs::read_to_string(format!("/proc/{}/maps", pid))?;
    let regions = parse_maps(&text);
    debug!(pid, regions = regions.len(), "Read process mappings");
    Ok(regions)
}
