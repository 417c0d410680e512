//! Error types for heapscope.
//!
//! Lookups that simply find nothing return `Option::None`; the variants
//! here are reserved for inputs that cannot be interpreted at all.

use crate::formats::elf::ElfError;
use crate::io::error::IoError;
use crate::target::ProcessReadError;
use thiserror::Error;

/// Main error type for inspection operations.
#[derive(Debug, Error)]
pub enum InspectError {
    /// ELF header or symbol table could not be parsed
    #[error("Malformed binary: {0}")]
    MalformedBinary(#[from] ElfError),

    /// Reading the target's memory failed
    #[error("Target read failed: {0}")]
    ProcessRead(#[from] ProcessReadError),

    /// Loading an image file failed
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Value does not fit the target's address width
    #[error("Address error: {0}")]
    Address(String),

    /// Type database has no entry for the named type
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// Type database has the type but not the field
    #[error("Unknown field {type_name}::{field}")]
    UnknownField { type_name: String, field: String },

    /// Two generations of one heap snapshot claim the same addresses
    #[error("Generations {first} and {second} overlap")]
    OverlappingGenerations {
        first: &'static str,
        second: &'static str,
    },

    /// Sink rejected printed output
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl InspectError {
    /// True for errors that mark an image as permanently unreadable.
    pub fn is_malformed(&self) -> bool {
        matches!(self, InspectError::MalformedBinary(_))
    }
}

/// Result type alias for inspection operations
pub type Result<T> = std::result::Result<T, InspectError>;
