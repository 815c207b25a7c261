//! Storage Module
//!
//! Raw fixed-size block I/O over a single table file.
//!
//! ## Responsibilities
//! - Read and write whole blocks at `block_id * BLOCK_SIZE`
//! - Patch byte ranges inside a block (insert, in-place update)
//! - Push every write to the OS (and optionally to disk) immediately
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Block 0 (header)                                         │
//! │   BlockId=0 (4) | DataBlockCount (4) | FieldCount (4)    │
//! │   [Name (10) | Type (4) | Length (4)] × FieldCount       │
//! ├──────────────────────────────────────────────────────────┤
//! │ Block 1..N (data)                                        │
//! │   BlockId (4) | RecordCount (4)                          │
//! │   [Offset (4)] × RecordCount          → grows forward    │
//! │   ... free space ...                                     │
//! │   record_n ... record_1 record_0      ← grows backward   │
//! ├──────────────────────────────────────────────────────────┤
//! │ Record                                                   │
//! │   SchemaPtr (4) | ContentLen (4) | Timestamp (10)        │
//! │   field_0 | field_1 | ... (fixed widths, space-padded)   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//! All integers are big-endian `i32`.

mod block_store;

pub use block_store::{Block, BlockStore};

// =============================================================================
// Shared Format Constants (used by schema, record and table)
// =============================================================================

/// Size of every block in the file
pub const BLOCK_SIZE: usize = 4096;

/// Width of every on-disk integer
pub const INT_SIZE: usize = 4;

/// Block 0 prefix: BlockId (4) + DataBlockCount (4) + FieldCount (4)
pub const TABLE_HEADER_SIZE: usize = 3 * INT_SIZE;

/// Fixed width of a field name in block 0
pub const FIELD_NAME_SIZE: usize = 10;

/// One field descriptor: Name (10) + Type (4) + Length (4)
pub const FIELD_DESCRIPTOR_SIZE: usize = FIELD_NAME_SIZE + 2 * INT_SIZE;

/// Data block prefix: BlockId (4) + RecordCount (4)
pub const BLOCK_HEADER_SIZE: usize = 2 * INT_SIZE;

/// One offset directory entry
pub const DIRECTORY_ENTRY_SIZE: usize = INT_SIZE;

/// Fixed width of the record timestamp
pub const TIMESTAMP_SIZE: usize = 10;

/// Record header: SchemaPtr (4) + ContentLen (4) + Timestamp (10)
pub const RECORD_HEADER_SIZE: usize = 2 * INT_SIZE + TIMESTAMP_SIZE;

/// Every record points at the first field descriptor in block 0
pub const SCHEMA_POINTER: i32 = TABLE_HEADER_SIZE as i32;
