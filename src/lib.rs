//! # blocktable
//!
//! A single-file table storage engine with:
//! - One relation per file, stored as fixed 4096-byte blocks
//! - A schema header in block 0 and slotted data records in blocks 1..N
//! - Insert, delete-by-condition, update-by-condition and full scan
//! - An in-memory row cache loaded once at open
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Table                              │
//! │          (row cache + position index, CRUD logic)           │
//! └──────────┬───────────────────┬───────────────────┬──────────┘
//!            │                   │                   │
//!            ▼                   ▼                   ▼
//!   ┌────────────────┐  ┌────────────────┐  ┌────────────────┐
//!   │ SchemaCatalog  │  │  RecordCodec   │  │   DataBlock    │
//!   │   (block 0)    │  │ (fixed-width)  │  │ (offset dir)   │
//!   └───────┬────────┘  └────────────────┘  └───────┬────────┘
//!           │                                       │
//!           └──────────────────┬────────────────────┘
//!                              ▼
//!                      ┌──────────────┐
//!                      │  BlockStore  │
//!                      │ (<name>.dat) │
//!                      └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod schema;
pub mod record;
pub mod table;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, TableError};
pub use config::{Config, SyncStrategy, TimestampSource};
pub use record::{Row, Value};
pub use schema::{FieldDescriptor, FieldType, SchemaProvider, StaticSchema};
pub use table::{Notice, Position, Table};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blocktable
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
