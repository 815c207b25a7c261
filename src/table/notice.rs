//! Status notices
//!
//! The table never prints. Human-readable status is queued as [`Notice`]s and
//! rendered by whoever drives the table.

use std::fmt;
use std::path::PathBuf;

use super::Position;

/// Something the caller may want to tell the user about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A new table file was created and its schema written
    TableCreated { table: String, path: PathBuf, fields: usize },

    /// An existing table file was opened and loaded
    TableOpened { table: String, rows: usize, data_blocks: u32 },

    /// A row was appended at `position`
    RecordInserted { position: Position },

    RecordsDeleted { count: usize },

    RecordsUpdated { count: usize },

    /// A delete or update condition matched nothing
    NoMatchingRecords { field: String, value: String },

    /// Live rows were re-packed and the file truncated
    TableVacuumed { data_blocks: u32 },

    /// The table file was removed
    TableDropped { table: String, path: PathBuf },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TableCreated { table, path, fields } => write!(
                f,
                "table {} created at {} with {} fields",
                table,
                path.display(),
                fields
            ),
            Notice::TableOpened {
                table,
                rows,
                data_blocks,
            } => write!(
                f,
                "table {} opened: {} records in {} data blocks",
                table, rows, data_blocks
            ),
            Notice::RecordInserted { position } => write!(
                f,
                "inserted into block {} slot {}",
                position.block_id, position.slot
            ),
            Notice::RecordsDeleted { count } => write!(f, "deleted {} records", count),
            Notice::RecordsUpdated { count } => write!(f, "updated {} records", count),
            Notice::NoMatchingRecords { field, value } => {
                write!(f, "no records found with {}={}", field, value)
            }
            Notice::TableVacuumed { data_blocks } => {
                write!(f, "table vacuumed into {} data blocks", data_blocks)
            }
            Notice::TableDropped { table, path } => {
                write!(f, "table {} dropped ({} removed)", table, path.display())
            }
        }
    }
}
