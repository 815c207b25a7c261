//! Schema Module
//!
//! Field descriptors, the block-0 catalog, and the collaborators that supply
//! a schema when a table is created.
//!
//! ## Responsibilities
//! - Describe each column as `(name, type, fixed byte length)`
//! - Encode/decode block 0 (block count, field count, descriptors)
//! - Resolve field names for delete/update conditions
//! - Obtain descriptors for new tables through [`SchemaProvider`]

mod catalog;
mod provider;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

pub use catalog::SchemaCatalog;
pub use provider::{JsonSchemaFile, NoSchema, PromptSchema, SchemaProvider, StaticSchema};

/// Storage type of a field
///
/// Every type is stored at its declared fixed width. `VarString` carries its
/// own tag but is laid out exactly like `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    VarString,
    Int,
    Bool,
}

impl FieldType {
    /// On-disk tag of this type
    pub fn tag(self) -> i32 {
        match self {
            FieldType::String => 0,
            FieldType::VarString => 1,
            FieldType::Int => 2,
            FieldType::Bool => 3,
        }
    }

    /// Type for an on-disk tag
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(FieldType::String),
            1 => Some(FieldType::VarString),
            2 => Some(FieldType::Int),
            3 => Some(FieldType::Bool),
            _ => None,
        }
    }

    /// True for the two text types
    pub fn is_text(self) -> bool {
        matches!(self, FieldType::String | FieldType::VarString)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::VarString => "varstring",
            FieldType::Int => "int",
            FieldType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Accepts either the type name or its numeric tag ("int" or "2")
impl FromStr for FieldType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(tag) = s.parse::<i32>() {
            return FieldType::from_tag(tag).ok_or_else(|| {
                TableError::Schema(format!("unknown field type tag {}", tag))
            });
        }
        match s.to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(FieldType::String),
            "varstring" | "varstr" => Ok(FieldType::VarString),
            "int" => Ok(FieldType::Int),
            "bool" | "boolean" => Ok(FieldType::Bool),
            other => Err(TableError::Schema(format!("unknown field type '{}'", other))),
        }
    }
}

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, at most 10 bytes
    pub name: String,

    /// Storage type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Fixed on-disk width in bytes
    pub length: usize,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType, length: usize) -> Self {
        Self {
            name: name.into(),
            field_type,
            length,
        }
    }
}

/// Parses the CLI shorthand `name:type:length`
impl FromStr for FieldDescriptor {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(TableError::Schema(format!(
                "field '{}' must look like name:type:length",
                s
            )));
        }

        let length = parts[2].trim().parse::<usize>().map_err(|_| {
            TableError::Schema(format!("field length '{}' is not a number", parts[2]))
        })?;

        Ok(Self::new(parts[0].trim(), parts[1].parse()?, length))
    }
}
