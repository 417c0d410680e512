//! Configuration for an inspection session.
//!
//! Provides centralized configuration with sensible defaults, loadable
//! from JSON.

use crate::core::address::AddressWidth;
use crate::error::{InspectError, Result};
use crate::io::IOLimits;
use crate::logging::LoggingConfig;
use crate::target::{Endianness, Target, TargetMemory};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Master configuration for the inspector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Bounds on image files and reads.
    pub io: IOLimits,
    /// Data model of the inspected process.
    pub target: TargetConfig,
    /// Logging output.
    pub logging: LoggingConfig,
}

/// Pointer width and byte order of the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub width: AddressWidth,
    pub endianness: Endianness,
}

impl InspectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| InspectError::Config(e.to_string()))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| InspectError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| InspectError::Config(e.to_string()))
    }

    /// A target session over `memory` using the configured data model.
    pub fn target(&self, memory: Arc<dyn TargetMemory>) -> Target {
        Target::new(memory, self.target.width, self.target.endianness)
    }
}
