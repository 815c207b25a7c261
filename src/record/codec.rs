//! Record Codec
//!
//! Packs raw field inputs into fixed-width records and unpacks them again.

use bytes::{Buf, BufMut};

use crate::config::TimestampSource;
use crate::error::{Result, TableError};
use crate::schema::{FieldDescriptor, FieldType};
use crate::storage::{RECORD_HEADER_SIZE, SCHEMA_POINTER, TIMESTAMP_SIZE};

use super::{Row, Value};

/// Decoded record header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    /// Offset of the schema in block 0
    pub schema_pointer: i32,
    /// Length of the field content region
    pub content_length: i32,
    /// Last update time, padding trimmed
    pub timestamp: String,
}

/// What to do with a value wider than its field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overflow {
    Reject,
    Truncate,
}

/// Fixed-width record encoder/decoder for one table's schema
///
/// VARSTRING is encoded exactly like STRING; variable-length storage would
/// only need changes here.
#[derive(Debug, Clone)]
pub struct RecordCodec {
    fields: Vec<FieldDescriptor>,
    /// Start of each field inside the content region
    offsets: Vec<usize>,
    content_length: usize,
}

impl RecordCodec {
    pub fn new(fields: &[FieldDescriptor]) -> Self {
        let mut offsets = Vec::with_capacity(fields.len());
        let mut content_length = 0;
        for field in fields {
            offsets.push(content_length);
            content_length += field.length;
        }

        Self {
            fields: fields.to_vec(),
            offsets,
            content_length,
        }
    }

    /// Total on-disk size of one record
    pub fn record_size(&self) -> usize {
        RECORD_HEADER_SIZE + self.content_length
    }

    pub fn content_length(&self) -> usize {
        self.content_length
    }

    /// Byte range of field `index` within a full record
    pub fn field_range(&self, index: usize) -> std::ops::Range<usize> {
        let start = RECORD_HEADER_SIZE + self.offsets[index];
        start..start + self.fields[index].length
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Validate and encode a full row of raw inputs
    ///
    /// Returns the typed row alongside its record bytes. Nothing is encoded
    /// unless every field validates.
    pub fn encode<S: AsRef<str>>(
        &self,
        inputs: &[S],
        timestamp: &[u8; TIMESTAMP_SIZE],
    ) -> Result<(Row, Vec<u8>)> {
        if inputs.len() != self.fields.len() {
            return Err(TableError::Validation(format!(
                "expected {} values, got {}",
                self.fields.len(),
                inputs.len()
            )));
        }

        let mut row = Vec::with_capacity(self.fields.len());
        let mut record = Vec::with_capacity(self.record_size());

        record.put_i32(SCHEMA_POINTER);
        record.put_i32(self.content_length as i32);
        record.put_slice(timestamp);

        for (index, input) in inputs.iter().enumerate() {
            let (value, bytes) = self.encode_value(index, input.as_ref(), Overflow::Reject)?;
            row.push(value);
            record.put_slice(&bytes);
        }

        Ok((row, record))
    }

    /// Encode one field at its declared width, rejecting oversized values
    pub fn encode_field(&self, index: usize, input: &str) -> Result<(Value, Vec<u8>)> {
        self.encode_value(index, input, Overflow::Reject)
    }

    /// Encode one field for an in-place update: text wider than the field is
    /// truncated, INT and BOOL must still parse and fit
    pub fn encode_field_truncated(&self, index: usize, input: &str) -> Result<(Value, Vec<u8>)> {
        self.encode_value(index, input, Overflow::Truncate)
    }

    fn encode_value(&self, index: usize, input: &str, overflow: Overflow) -> Result<(Value, Vec<u8>)> {
        let field = &self.fields[index];
        let input = input.trim();

        let (value, text) = match field.field_type {
            FieldType::String | FieldType::VarString => {
                let text = if input.len() > field.length {
                    match overflow {
                        Overflow::Reject => {
                            return Err(TableError::Validation(format!(
                                "value '{}' is longer than the {} bytes of field '{}'",
                                input, field.length, field.name
                            )))
                        }
                        Overflow::Truncate => truncate_to_boundary(input, field.length),
                    }
                } else {
                    input
                };
                (Value::Text(text.to_string()), text.to_string())
            }
            FieldType::Int => {
                let n = input.parse::<i64>().map_err(|_| {
                    TableError::Validation(format!(
                        "value '{}' of field '{}' is not an integer",
                        input, field.name
                    ))
                })?;
                let text = n.to_string();
                if text.len() > field.length {
                    return Err(TableError::Validation(format!(
                        "integer {} does not fit in the {} bytes of field '{}'",
                        n, field.length, field.name
                    )));
                }
                (Value::Int(n), text)
            }
            FieldType::Bool => {
                let b = parse_bool(input).ok_or_else(|| {
                    TableError::Validation(format!(
                        "value '{}' of field '{}' is not a boolean",
                        input, field.name
                    ))
                })?;
                (Value::Bool(b), bool_repr(b, field.length).to_string())
            }
        };

        let mut bytes = Vec::with_capacity(field.length);
        bytes.put_bytes(b' ', field.length - text.len());
        bytes.put_slice(text.as_bytes());
        Ok((value, bytes))
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    /// Parse and check the header of a full record
    pub fn decode_header(&self, record: &[u8]) -> Result<RecordHeader> {
        self.check_length(record)?;

        let mut buf = record;
        let schema_pointer = buf.get_i32();
        let content_length = buf.get_i32();
        let timestamp = String::from_utf8_lossy(&buf[..TIMESTAMP_SIZE])
            .trim_matches(|c| c == ' ' || c == '\0')
            .to_string();

        if schema_pointer != SCHEMA_POINTER {
            return Err(TableError::Corruption(format!(
                "record schema pointer {} (expected {})",
                schema_pointer, SCHEMA_POINTER
            )));
        }
        if content_length as usize != self.content_length {
            return Err(TableError::Corruption(format!(
                "record content length {} (schema declares {})",
                content_length, self.content_length
            )));
        }

        Ok(RecordHeader {
            schema_pointer,
            content_length,
            timestamp,
        })
    }

    /// Decode a full record into a typed row
    pub fn decode(&self, record: &[u8]) -> Result<Row> {
        self.decode_header(record)?;
        (0..self.fields.len())
            .map(|index| self.decode_field(record, index))
            .collect()
    }

    /// Decode field `index` of a full record
    pub fn decode_field(&self, record: &[u8], index: usize) -> Result<Value> {
        let field = &self.fields[index];
        let text = self.field_text(record, index)?;

        match field.field_type {
            FieldType::String | FieldType::VarString => Ok(Value::Text(text.to_string())),
            FieldType::Int => text.parse::<i64>().map(Value::Int).map_err(|_| {
                TableError::Corruption(format!(
                    "field '{}' holds '{}', not an integer",
                    field.name, text
                ))
            }),
            FieldType::Bool => parse_bool(text).map(Value::Bool).ok_or_else(|| {
                TableError::Corruption(format!(
                    "field '{}' holds '{}', not a boolean",
                    field.name, text
                ))
            }),
        }
    }

    /// Trimmed text of field `index` in a full record
    pub fn field_text<'a>(&self, record: &'a [u8], index: usize) -> Result<&'a str> {
        self.check_length(record)?;
        let field = &self.fields[index];
        let raw = &record[self.field_range(index)];

        std::str::from_utf8(raw)
            .map(|s| s.trim_matches(|c| c == ' ' || c == '\0'))
            .map_err(|_| {
                TableError::Corruption(format!("field '{}' is not valid UTF-8", field.name))
            })
    }

    fn check_length(&self, record: &[u8]) -> Result<()> {
        if record.len() != self.record_size() {
            return Err(TableError::Corruption(format!(
                "record is {} bytes, schema needs {}",
                record.len(),
                self.record_size()
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// The 10-byte timestamp stamped on a record
///
/// `Local` renders today's date as `YYYY-MM-DD`; fixed strings are truncated
/// or space-padded on the right.
pub fn format_timestamp(source: &TimestampSource) -> [u8; TIMESTAMP_SIZE] {
    let text = match source {
        TimestampSource::Local => chrono::Local::now().format("%Y-%m-%d").to_string(),
        TimestampSource::Fixed(s) => s.clone(),
    };

    let mut stamp = [b' '; TIMESTAMP_SIZE];
    let text = truncate_to_boundary(&text, TIMESTAMP_SIZE);
    stamp[..text.len()].copy_from_slice(text.as_bytes());
    stamp
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Booleans are spelled out when the field is wide enough for "false"
fn bool_repr(b: bool, width: usize) -> &'static str {
    match (b, width >= 5) {
        (true, true) => "true",
        (false, true) => "false",
        (true, false) => "1",
        (false, false) => "0",
    }
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary
fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
