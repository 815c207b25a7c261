//! Schema Catalog
//!
//! Owns the field descriptor list and the persisted data block count, and
//! encodes/decodes both to and from block 0.

use bytes::{Buf, BufMut};

use crate::error::{Result, TableError};
use crate::storage::{
    Block, BLOCK_HEADER_SIZE, BLOCK_SIZE, DIRECTORY_ENTRY_SIZE, FIELD_DESCRIPTOR_SIZE,
    FIELD_NAME_SIZE, RECORD_HEADER_SIZE, TABLE_HEADER_SIZE,
};

use super::{FieldDescriptor, FieldType};

/// Block 0 contents: the table's schema plus its data block count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCatalog {
    /// Ordered, immutable field descriptors
    fields: Vec<FieldDescriptor>,
    /// Number of data blocks holding at least one record
    data_block_count: u32,
}

impl SchemaCatalog {
    /// Most descriptors block 0 can hold after its 12-byte prefix
    pub const MAX_FIELDS: usize = (BLOCK_SIZE - TABLE_HEADER_SIZE) / FIELD_DESCRIPTOR_SIZE;

    /// Validate descriptors for a new table (data block count starts at 0)
    pub fn create(fields: Vec<FieldDescriptor>) -> Result<Self> {
        if fields.is_empty() {
            return Err(TableError::Schema("a table needs at least one field".to_string()));
        }
        if fields.len() > Self::MAX_FIELDS {
            return Err(TableError::Schema(format!(
                "{} fields do not fit in the header block (max {})",
                fields.len(),
                Self::MAX_FIELDS
            )));
        }

        let mut normalized: Vec<FieldDescriptor> = Vec::with_capacity(fields.len());
        for field in fields {
            let name = field.name.trim().to_string();
            if name.is_empty() {
                return Err(TableError::Schema("field name is empty".to_string()));
            }
            if name.len() > FIELD_NAME_SIZE {
                return Err(TableError::Schema(format!(
                    "field name '{}' is longer than {} bytes",
                    name, FIELD_NAME_SIZE
                )));
            }
            if field.length == 0 || field.length > i32::MAX as usize {
                return Err(TableError::Schema(format!(
                    "field '{}' has invalid length {}",
                    name, field.length
                )));
            }
            if normalized.iter().any(|f| fold_name(&f.name) == fold_name(&name)) {
                return Err(TableError::Schema(format!("duplicate field name '{}'", name)));
            }
            normalized.push(FieldDescriptor::new(name, field.field_type, field.length));
        }

        let catalog = Self {
            fields: normalized,
            data_block_count: 0,
        };

        if catalog.max_records_per_block() == 0 {
            return Err(TableError::Schema(format!(
                "a {}-byte record does not fit in a {}-byte block",
                catalog.record_size(),
                BLOCK_SIZE
            )));
        }

        Ok(catalog)
    }

    /// Parse block 0
    pub fn load(block: &Block) -> Result<Self> {
        let mut buf = &block[..];

        let block_id = buf.get_i32();
        let data_block_count = buf.get_i32();
        let field_count = buf.get_i32();

        if block_id != 0 {
            return Err(TableError::Corruption(format!(
                "header block carries block id {}",
                block_id
            )));
        }
        if data_block_count < 0 {
            return Err(TableError::Corruption(format!(
                "negative data block count {}",
                data_block_count
            )));
        }
        if field_count <= 0 || field_count as usize > Self::MAX_FIELDS {
            return Err(TableError::Corruption(format!(
                "field count {} is inconsistent with the header block",
                field_count
            )));
        }

        let mut fields = Vec::with_capacity(field_count as usize);
        for i in 0..field_count as usize {
            let mut raw_name = [0u8; FIELD_NAME_SIZE];
            buf.copy_to_slice(&mut raw_name);
            let tag = buf.get_i32();
            let length = buf.get_i32();

            let name = std::str::from_utf8(&raw_name)
                .map_err(|_| {
                    TableError::Corruption(format!("field {} name is not valid UTF-8", i))
                })?
                .trim_matches(|c| c == ' ' || c == '\0')
                .to_string();
            if name.is_empty() {
                return Err(TableError::Corruption(format!(
                    "field {} of {} has no name",
                    i, field_count
                )));
            }

            let field_type = FieldType::from_tag(tag).ok_or_else(|| {
                TableError::Corruption(format!("field '{}' has unknown type tag {}", name, tag))
            })?;
            if length <= 0 {
                return Err(TableError::Corruption(format!(
                    "field '{}' has non-positive length {}",
                    name, length
                )));
            }

            fields.push(FieldDescriptor::new(name, field_type, length as usize));
        }

        let catalog = Self {
            fields,
            data_block_count: data_block_count as u32,
        };
        if catalog.max_records_per_block() == 0 {
            return Err(TableError::Corruption(format!(
                "declared record size {} exceeds the block size",
                catalog.record_size()
            )));
        }

        Ok(catalog)
    }

    /// Full block-0 image
    pub fn encode(&self) -> Block {
        let mut block = [0u8; BLOCK_SIZE];
        let mut out = &mut block[..];

        out.put_slice(&self.header_prefix());
        for field in &self.fields {
            let pad = FIELD_NAME_SIZE - field.name.len();
            out.put_bytes(b' ', pad);
            out.put_slice(field.name.as_bytes());
            out.put_i32(field.field_type.tag());
            out.put_i32(field.length as i32);
        }

        block
    }

    /// The `(0, data_block_count, field_count)` prefix of block 0
    pub fn header_prefix(&self) -> [u8; TABLE_HEADER_SIZE] {
        let mut prefix = [0u8; TABLE_HEADER_SIZE];
        let mut out = &mut prefix[..];
        out.put_i32(0);
        out.put_i32(self.data_block_count as i32);
        out.put_i32(self.fields.len() as i32);
        prefix
    }

    // =========================================================================
    // Field Lookup
    // =========================================================================

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Index of `name`, matched trimmed and case-insensitively
    pub fn field_index(&self, name: &str) -> Option<usize> {
        let wanted = fold_name(name);
        self.fields.iter().position(|f| fold_name(&f.name) == wanted)
    }

    /// Like [`field_index`](Self::field_index) but fails with `NotFound`
    pub fn resolve(&self, name: &str) -> Result<usize> {
        self.field_index(name).ok_or_else(|| {
            TableError::NotFound(format!("field '{}' not found in table", name.trim()))
        })
    }

    // =========================================================================
    // Layout Arithmetic
    // =========================================================================

    /// Sum of the declared field widths
    pub fn content_length(&self) -> usize {
        self.fields.iter().map(|f| f.length).sum()
    }

    /// On-disk size of every record of this table
    pub fn record_size(&self) -> usize {
        RECORD_HEADER_SIZE + self.content_length()
    }

    /// Uniform slot capacity of every data block
    pub fn max_records_per_block(&self) -> usize {
        (BLOCK_SIZE - BLOCK_HEADER_SIZE) / (self.record_size() + DIRECTORY_ENTRY_SIZE)
    }

    pub fn data_block_count(&self) -> u32 {
        self.data_block_count
    }

    pub fn set_data_block_count(&mut self, count: u32) {
        self.data_block_count = count;
    }
}

/// Field names compare trimmed and case-folded
fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}
