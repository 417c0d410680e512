//! Bounded file access for on-disk images.
//!
//! `SafeReader` memory-maps a file and hands out owned `Bytes` slices while
//! enforcing the size and read budgets from `IOLimits`, so a huge or
//! hostile file named in a target's mapping list cannot exhaust memory.

pub mod error;

use crate::io::error::{IoError, Result};
use bytes::Bytes;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Resource limits for loading images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOLimits {
    /// Largest image, on disk or in target memory, that will be loaded.
    pub max_file_size: u64,
    /// Total number of bytes a single reader may hand out.
    pub max_read_bytes: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self {
            max_file_size: 256 * 1024 * 1024,
            max_read_bytes: 256 * 1024 * 1024,
        }
    }
}

/// A bounded, memory-mapped file reader.
pub struct SafeReader {
    path: PathBuf,
    // None when the file size is zero; memmap cannot map empty files.
    mmap: Option<Mmap>,
    limits: IOLimits,
    bytes_read: u64,
    file_size: u64,
}

impl SafeReader {
    /// Opens and memory-maps a file, rejecting files above `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: IOLimits) -> Result<Self> {
        let path = path.as_ref();
        let open_err = |source| IoError::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        let file_size = file.metadata().map_err(open_err)?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Opening image file"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "Image file is too large"
            );
            return Err(IoError::FileTooLarge {
                path: path.to_path_buf(),
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: read-only map of a regular file; the bytes are copied out on read.
            Some(unsafe { Mmap::map(&file) }.map_err(open_err)?)
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            limits,
            bytes_read: 0,
            file_size,
        })
    }

    /// Size of the underlying file in bytes.
    pub fn size(&self) -> u64 {
        self.file_size
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Reads up to `len` bytes at `offset`; reads past EOF are shortened.
    ///
    /// # Errors
    ///
    /// Returns `IoError::ReadLimitExceeded` if the read would push the total
    /// past `limits.max_read_bytes`.
    pub fn read_at(&mut self, offset: u64, len: u64) -> Result<Bytes> {
        if self.bytes_read.saturating_add(len) > self.limits.max_read_bytes {
            warn!(
                path = %self.path.display(),
                current_read = self.bytes_read,
                requested = len,
                limit = self.limits.max_read_bytes,
                "Read budget exceeded"
            );
            return Err(IoError::ReadLimitExceeded {
                limit: self.limits.max_read_bytes,
                current: self.bytes_read,
            });
        }

        let map = match &self.mmap {
            Some(m) => m,
            None => return Ok(Bytes::new()),
        };

        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        if start >= map.len() {
            return Ok(Bytes::new());
        }
        let end = start.saturating_add(usize::try_from(len).unwrap_or(usize::MAX)).min(map.len());

        let out = Bytes::copy_from_slice(&map[start..end]);
        self.bytes_read += out.len() as u64;

        trace!(
            path = %self.path.display(),
            offset = start,
            len = out.len(),
            total_read = self.bytes_read,
            "Read image bytes"
        );

        Ok(out)
    }

    /// Equivalent to `read_at(0, len)`.
    pub fn read_prefix(&mut self, len: u64) -> Result<Bytes> {
        self.read_at(0, len)
    }
}
