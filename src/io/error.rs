//! Error types for bounded image file access.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("image {path} is {found} bytes, above the {limit} byte limit")]
    FileTooLarge {
        path: PathBuf,
        limit: u64,
        found: u64,
    },

    #[error("target region at {base:#x} is {found} bytes, above the {limit} byte limit")]
    RegionTooLarge { base: u64, limit: u64, found: u64 },

    #[error("reading would exceed the {limit} byte read budget (already read: {current})")]
    ReadLimitExceeded { limit: u64, current: u64 },

    #[error("cannot access {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, IoError>;
