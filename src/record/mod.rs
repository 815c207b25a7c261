//! Record Module
//!
//! Typed row values and the fixed-width record codec.
//!
//! ## Record Layout
//! ```text
//! ┌──────────────┬───────────────┬────────────────┬─────────┬─────────┬─────┐
//! │SchemaPtr (4) │ContentLen (4) │ Timestamp (10) │ field_0 │ field_1 │ ... │
//! └──────────────┴───────────────┴────────────────┴─────────┴─────────┴─────┘
//! ```
//! Field values are space-padded on the left to their declared width.

mod codec;

use std::fmt;

pub use codec::{format_timestamp, RecordCodec, RecordHeader};

/// One decoded row, values in schema order
pub type Row = Vec<Value>;

/// A typed field value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// STRING or VARSTRING content, padding trimmed
    Text(String),
    Int(i64),
    Bool(bool),
}

impl Value {
    /// Trimmed, lower-cased string form used by condition matching
    pub fn normalized(&self) -> String {
        self.to_string().trim().to_lowercase()
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
