//! Type database: sizes and field offsets of the runtime's native types.
//!
//! The heap model never hard-codes struct layouts. Every field it reads is
//! looked up here by type and field name, the way a debugger consults the
//! runtime's exported structure tables.

use crate::error::{InspectError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// Layout of one native type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLayout {
    pub size: u64,
    /// Field name to byte offset from the start of the type.
    #[serde(default)]
    pub fields: BTreeMap<String, u64>,
}

impl TypeLayout {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: &str, offset: u64) -> Self {
        self.fields.insert(name.to_string(), offset);
        self
    }

    pub fn offset_of(&self, field: &str) -> Option<u64> {
        self.fields.get(field).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDatabase {
    #[serde(default)]
    types: HashMap<String, TypeLayout>,
}

impl TypeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a type with `(field, offset)` pairs.
    pub fn with_type(mut self, name: &str, size: u64, fields: &[(&str, u64)]) -> Self {
        let layout = fields
            .iter()
            .fold(TypeLayout::new(size), |layout, (field, offset)| {
                layout.field(field, *offset)
            });
        self.insert(name, layout);
        self
    }

    pub fn insert(&mut self, name: &str, layout: TypeLayout) -> Option<TypeLayout> {
        self.types.insert(name.to_string(), layout)
    }

    pub fn type_layout(&self, name: &str) -> Option<&TypeLayout> {
        self.types.get(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn type_size(&self, type_name: &str) -> Result<u64> {
        self.type_layout(type_name)
            .map(|layout| layout.size)
            .ok_or_else(|| InspectError::UnknownType(type_name.to_string()))
    }

    /// Byte offset of `field` within `type_name`.
    pub fn field_offset(&self, type_name: &str, field: &str) -> Result<u64> {
        let layout = self
            .type_layout(type_name)
            .ok_or_else(|| InspectError::UnknownType(type_name.to_string()))?;
        layout
            .offset_of(field)
            .ok_or_else(|| InspectError::UnknownField {
                type_name: type_name.to_string(),
                field: field.to_string(),
            })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let db: Self = serde_json::from_str(text)
            .map_err(|e| InspectError::Config(format!("type database: {}", e)))?;
        debug!(types = db.len(), "Loaded type database");
        Ok(db)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| InspectError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }
}
