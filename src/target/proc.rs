//! Live-process reader backed by `/proc/<pid>/mem`.

use super::{ProcessReadError, TargetMemory};
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;
use tracing::debug;

/// Reads a running process's memory. The caller is responsible for keeping
/// the process stopped while it needs a consistent view.
#[derive(Debug)]
pub struct ProcMemory {
    pid: u32,
    mem: File,
}

impl ProcMemory {
    pub fn open(pid: u32) -> Result<Self, ProcessReadError> {
        let path = PathBuf::from(format!("/proc/{}/mem", pid));
        let mem = File::open(&path).map_err(|source| ProcessReadError::Attach { pid, source })?;
        debug!(pid, path = %path.display(), "Opened process memory");
        Ok(Self { pid, mem })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl TargetMemory for ProcMemory {
    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>, ProcessReadError> {
        let mut buf = vec![0u8; len];
        self.mem
            .read_exact_at(&mut buf, addr)
            .map_err(|source| match source.raw_os_error() {
                // EIO and EFAULT: nothing mapped at that address.
                Some(5) | Some(14) => ProcessReadError::Unmapped { addr, len },
                _ if source.kind() == std::io::ErrorKind::UnexpectedEof => {
                    ProcessReadError::Unmapped { addr, len }
                }
                _ => ProcessReadError::Os { addr, len, source },
            })?;
        Ok(buf)
    }
}
