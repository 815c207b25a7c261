//! Configuration for blocktable
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, TableError};

/// Main configuration for opening tables
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding one `<table>.<ext>` file per table
    pub data_dir: PathBuf,

    /// Extension of table files (without the dot)
    pub file_extension: String,

    /// How hard each block write is pushed to disk
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Record Configuration
    // -------------------------------------------------------------------------
    /// Source of the 10-byte last-update timestamp stamped on inserted records
    pub timestamp: TimestampSource,
}

/// Write durability strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Flush to the OS after every write
    Flush,

    /// Flush and fsync after every write (safest, slowest)
    EveryWrite,
}

/// Where record timestamps come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampSource {
    /// Current local date, `YYYY-MM-DD`
    Local,

    /// A fixed string, truncated or space-padded to 10 bytes
    Fixed(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            file_extension: "dat".to_string(),
            sync_strategy: SyncStrategy::Flush,
            timestamp: TimestampSource::Local,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Resolve the backing file of `table`
    ///
    /// The name is trimmed and must be non-empty without path separators.
    pub fn table_path(&self, table: &str) -> Result<PathBuf> {
        let name = table.trim();
        if name.is_empty() {
            return Err(TableError::Config("table name is empty".to_string()));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(TableError::Config(format!(
                "table name '{}' must not contain path components",
                name
            )));
        }
        Ok(self.data_dir.join(format!("{}.{}", name, self.file_extension)))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the table file extension
    pub fn file_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.file_extension = ext.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the timestamp source
    pub fn timestamp(mut self, source: TimestampSource) -> Self {
        self.config.timestamp = source;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
