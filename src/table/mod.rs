//! Table Module
//!
//! Coordinates the block store, schema catalog and record codec for one
//! table file.
//!
//! ## Responsibilities
//! - Create or open a table file and load every record into a row cache
//! - Insert with append-only slot placement and block growth
//! - Delete by condition with per-block compaction
//! - Update one field in place by condition
//! - Persist the header on close

mod block;
mod notice;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use bytes::BufMut;

use crate::config::{Config, TimestampSource};
use crate::error::Result;
use crate::record::{format_timestamp, RecordCodec, Row};
use crate::schema::{FieldDescriptor, SchemaCatalog, SchemaProvider};
use crate::storage::{BlockStore, BLOCK_HEADER_SIZE};

pub use block::DataBlock;
pub use notice::Notice;

/// Location of a record: data block id and slot within that block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub block_id: u32,
    pub slot: u32,
}

impl Position {
    pub fn new(block_id: u32, slot: u32) -> Self {
        Self { block_id, slot }
    }
}

/// An open table
///
/// ## Consistency Model
///
/// - `rows[i]` is the decoded record at `positions[i]`; both are in scan
///   order (block id, then slot).
/// - Every mutation writes to disk first and touches the cache only once all
///   of its writes succeeded.
/// - Writes inside one mutation are not atomic. An I/O error between two of
///   them leaves the file partially updated; there is no log to roll back.
/// - One handle per file. Concurrent handles on the same file, in this or
///   another process, are unsupported.
pub struct Table {
    /// Table name (file stem)
    name: String,

    /// Backing file
    store: BlockStore,

    /// Block-0 contents
    catalog: SchemaCatalog,

    /// Record encoder/decoder for this schema
    codec: RecordCodec,

    /// Timestamp stamped on inserted records
    timestamp: TimestampSource,

    /// Decoded rows in scan order
    rows: Vec<Row>,

    /// `(block_id, slot)` of each cached row
    positions: Vec<Position>,

    /// Status for the caller to render
    notices: Vec<Notice>,

    /// Header persisted and handle finished
    closed: bool,
}

impl Table {
    /// Open `name` under `config.data_dir`, creating it if needed
    ///
    /// A missing or empty file gets its schema from `provider` and a fresh
    /// block 0. An existing file is loaded block by block; any block that
    /// fails to decode aborts the open.
    pub fn open(config: &Config, name: &str, mut provider: impl SchemaProvider) -> Result<Self> {
        let name = name.trim().to_string();
        let path = config.table_path(&name)?;
        let existed = path.exists();

        let mut store = BlockStore::open(&path, config.sync_strategy)?;

        let (catalog, created) = if store.is_empty()? {
            let catalog = match Self::create_schema(&mut store, &name, &mut provider) {
                Ok(catalog) => catalog,
                Err(e) => {
                    if !existed {
                        drop(store);
                        let _ = fs::remove_file(&path);
                    }
                    return Err(e);
                }
            };
            (catalog, true)
        } else {
            (SchemaCatalog::load(&store.read_block(0)?)?, false)
        };

        let codec = RecordCodec::new(catalog.fields());
        let (rows, positions) = Self::read_rows(&mut store, &catalog, &codec)?;

        let notice = if created {
            tracing::info!(table = %name, path = %path.display(), fields = catalog.field_count(), "table created");
            Notice::TableCreated {
                table: name.clone(),
                path: path.clone(),
                fields: catalog.field_count(),
            }
        } else {
            tracing::info!(
                table = %name,
                rows = rows.len(),
                data_blocks = catalog.data_block_count(),
                "table opened"
            );
            Notice::TableOpened {
                table: name.clone(),
                rows: rows.len(),
                data_blocks: catalog.data_block_count(),
            }
        };

        Ok(Self {
            name,
            store,
            catalog,
            codec,
            timestamp: config.timestamp.clone(),
            rows,
            positions,
            notices: vec![notice],
            closed: false,
        })
    }

    /// Open a table at default config with the given data directory
    pub fn open_in(data_dir: &Path, name: &str, provider: impl SchemaProvider) -> Result<Self> {
        let config = Config::builder().data_dir(data_dir).build();
        Self::open(&config, name, provider)
    }

    /// Whether a table file for `name` exists
    pub fn exists(config: &Config, name: &str) -> Result<bool> {
        Ok(config.table_path(name)?.exists())
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Cached rows in insertion order; no I/O
    pub fn scan(&self) -> &[Row] {
        &self.rows
    }

    /// Validate, encode and append one row
    ///
    /// The row goes into the slot after the last occupied one, or slot 0 of a
    /// new block when the last block is full. Slots freed by earlier deletes
    /// in other blocks are not reused.
    pub fn insert<S: AsRef<str>>(&mut self, inputs: &[S]) -> Result<Position> {
        let stamp = format_timestamp(&self.timestamp);
        let (row, record) = self.codec.encode(inputs, &stamp)?;

        let capacity = self.catalog.max_records_per_block() as u32;
        let current_count = self.catalog.data_block_count();
        let target = match self.positions.last() {
            None => Position::new(1, 0),
            Some(last) if last.slot + 1 >= capacity => Position::new(last.block_id + 1, 0),
            Some(last) => Position::new(last.block_id, last.slot + 1),
        };
        let new_count = current_count.max(target.block_id);

        self.catalog.set_data_block_count(new_count);
        if let Err(e) = self.write_record(target, &record) {
            self.catalog.set_data_block_count(current_count);
            return Err(e);
        }

        tracing::debug!(
            table = %self.name,
            block_id = target.block_id,
            slot = target.slot,
            "record inserted"
        );

        self.rows.push(row);
        self.positions.push(target);
        self.notices.push(Notice::RecordInserted { position: target });
        Ok(target)
    }

    /// Delete every row whose `field` equals `value` (trimmed, case-insensitive)
    ///
    /// Every data block is rewritten with its survivors packed from slot 0.
    /// Blocks left empty are dropped from the numbering: later non-empty
    /// blocks move down so blocks `1..=data_block_count` are exactly the
    /// non-empty ones.
    pub fn delete_by_condition(&mut self, field: &str, value: &str) -> Result<usize> {
        let index = self.catalog.resolve(field)?;
        let wanted = value.trim().to_lowercase();

        let doomed: HashSet<Position> = self
            .rows
            .iter()
            .zip(&self.positions)
            .filter(|(row, _)| row[index].normalized() == wanted)
            .map(|(_, position)| *position)
            .collect();

        if doomed.is_empty() {
            tracing::debug!(
                table = %self.name,
                field = field.trim(),
                value = value.trim(),
                "delete matched no records"
            );
            self.notices.push(Notice::NoMatchingRecords {
                field: field.trim().to_string(),
                value: value.trim().to_string(),
            });
            return Ok(0);
        }

        let record_size = self.codec.record_size();
        let capacity = self.catalog.max_records_per_block();
        let old_count = self.catalog.data_block_count();

        // Re-pack each block, keeping only non-empty ones
        let mut packed: Vec<Vec<Vec<u8>>> = Vec::new();
        for block_id in 1..=old_count {
            let raw = self.store.read_block(block_id)?;
            let block = DataBlock::decode(&raw, block_id, record_size, capacity)?;
            let survivors: Vec<Vec<u8>> = block
                .into_records()
                .into_iter()
                .enumerate()
                .filter(|(slot, _)| !doomed.contains(&Position::new(block_id, *slot as u32)))
                .map(|(_, record)| record)
                .collect();
            if !survivors.is_empty() {
                packed.push(survivors);
            }
        }

        let new_count = packed.len() as u32;
        let mut new_positions = Vec::with_capacity(self.positions.len() - doomed.len());
        let mut packed = packed.into_iter();
        for block_id in 1..=old_count {
            let block = match packed.next() {
                Some(records) => {
                    new_positions
                        .extend((0..records.len() as u32).map(|slot| Position::new(block_id, slot)));
                    DataBlock::from_records(block_id, records, record_size)
                }
                None => DataBlock::empty(block_id),
            };
            self.store.write_block(block_id, &block.encode(record_size))?;
        }

        self.catalog.set_data_block_count(new_count);
        self.write_header()?;

        // Highest index first so the remaining indices stay valid
        let mut doomed_indices: Vec<usize> = self
            .positions
            .iter()
            .enumerate()
            .filter(|(_, position)| doomed.contains(*position))
            .map(|(i, _)| i)
            .collect();
        doomed_indices.sort_unstable_by(|a, b| b.cmp(a));
        for i in &doomed_indices {
            self.rows.remove(*i);
        }
        self.positions = new_positions;

        let count = doomed_indices.len();
        tracing::info!(
            table = %self.name,
            deleted = count,
            data_blocks = new_count,
            "records deleted"
        );
        self.notices.push(Notice::RecordsDeleted { count });
        Ok(count)
    }

    /// Overwrite `target_field` with `new_value` in every record whose
    /// `condition_field` equals `old_value` (trimmed, exact)
    ///
    /// Matching reads every data block from disk. Only the target field's
    /// bytes are rewritten; text longer than the field is truncated. The row
    /// cache is patched at the same positions so `scan()` stays current.
    pub fn update_by_condition(
        &mut self,
        condition_field: &str,
        old_value: &str,
        target_field: &str,
        new_value: &str,
    ) -> Result<usize> {
        let condition = self.catalog.resolve(condition_field)?;
        let target = self.catalog.resolve(target_field)?;
        let (value, bytes) = self.codec.encode_field_truncated(target, new_value)?;

        let wanted = old_value.trim();
        let record_size = self.codec.record_size();
        let capacity = self.catalog.max_records_per_block();
        let field_start = self.codec.field_range(target).start;

        let mut matches = Vec::new();
        for block_id in 1..=self.catalog.data_block_count() {
            let raw = self.store.read_block(block_id)?;
            let block = DataBlock::decode(&raw, block_id, record_size, capacity)?;
            for (slot, offset, record) in block.slots() {
                if self.codec.field_text(record, condition)? == wanted {
                    matches.push((Position::new(block_id, slot as u32), offset));
                }
            }
        }

        if matches.is_empty() {
            tracing::debug!(
                table = %self.name,
                field = condition_field.trim(),
                value = wanted,
                "update matched no records"
            );
            self.notices.push(Notice::NoMatchingRecords {
                field: condition_field.trim().to_string(),
                value: wanted.to_string(),
            });
            return Ok(0);
        }

        for (position, offset) in &matches {
            self.store
                .write_at(position.block_id, offset + field_start, &bytes)?;
        }

        let index_of: HashMap<Position, usize> = self
            .positions
            .iter()
            .enumerate()
            .map(|(i, position)| (*position, i))
            .collect();
        for (position, _) in &matches {
            if let Some(&i) = index_of.get(position) {
                self.rows[i][target] = value.clone();
            }
        }

        let count = matches.len();
        tracing::info!(table = %self.name, updated = count, "records updated");
        self.notices.push(Notice::RecordsUpdated { count });
        Ok(count)
    }

    /// Re-read every row from disk, bypassing the cache
    pub fn rows_from_disk(&mut self) -> Result<Vec<Row>> {
        let (rows, _) = Self::read_rows(&mut self.store, &self.catalog, &self.codec)?;
        Ok(rows)
    }

    /// Re-pack all live records densely and truncate the file
    ///
    /// Fills each block to capacity, rewrites blocks `1..=n`, persists the
    /// header and cuts off every block past `n`. Returns `n`.
    pub fn vacuum(&mut self) -> Result<u32> {
        let record_size = self.codec.record_size();
        let capacity = self.catalog.max_records_per_block();

        let mut records = Vec::with_capacity(self.rows.len());
        for block_id in 1..=self.catalog.data_block_count() {
            let raw = self.store.read_block(block_id)?;
            records.extend(DataBlock::decode(&raw, block_id, record_size, capacity)?.into_records());
        }

        let mut positions = Vec::with_capacity(records.len());
        let mut block_id = 0u32;
        let mut records = records.into_iter().peekable();
        while records.peek().is_some() {
            block_id += 1;
            let chunk: Vec<Vec<u8>> = records.by_ref().take(capacity).collect();
            positions.extend((0..chunk.len() as u32).map(|slot| Position::new(block_id, slot)));
            let block = DataBlock::from_records(block_id, chunk, record_size);
            self.store.write_block(block_id, &block.encode(record_size))?;
        }

        self.catalog.set_data_block_count(block_id);
        self.write_header()?;
        self.store.truncate_blocks(block_id + 1)?;
        self.positions = positions;

        tracing::info!(table = %self.name, data_blocks = block_id, "table vacuumed");
        self.notices.push(Notice::TableVacuumed {
            data_blocks: block_id,
        });
        Ok(block_id)
    }

    /// Persist the header, sync and release the file
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    /// Close the table and delete its backing file
    ///
    /// The handle is consumed, so the resulting notice is returned instead of
    /// queued.
    pub fn drop_table(mut self) -> Result<Notice> {
        let path = self.store.path().to_path_buf();
        let name = self.name.clone();
        self.closed = true;
        drop(self);

        if path.exists() {
            fs::remove_file(&path)?;
        }
        tracing::info!(table = %name, path = %path.display(), "table dropped");
        Ok(Notice::TableDropped { table: name, path })
    }

    /// Drain queued status notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        self.catalog.fields()
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn codec(&self) -> &RecordCodec {
        &self.codec
    }

    /// Number of data blocks recorded in the header
    pub fn data_block_count(&self) -> u32 {
        self.catalog.data_block_count()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// `(block_id, slot)` of each cached row, parallel to [`scan`](Self::scan)
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn create_schema(
        store: &mut BlockStore,
        name: &str,
        provider: &mut impl SchemaProvider,
    ) -> Result<SchemaCatalog> {
        let catalog = SchemaCatalog::create(provider.provide(name)?)?;
        store.write_block(0, &catalog.encode())?;
        Ok(catalog)
    }

    /// Decode every data block in scan order
    fn read_rows(
        store: &mut BlockStore,
        catalog: &SchemaCatalog,
        codec: &RecordCodec,
    ) -> Result<(Vec<Row>, Vec<Position>)> {
        let record_size = codec.record_size();
        let capacity = catalog.max_records_per_block();
        let mut rows = Vec::new();
        let mut positions = Vec::new();

        for block_id in 1..=catalog.data_block_count() {
            let raw = store.read_block(block_id)?;
            let block = DataBlock::decode(&raw, block_id, record_size, capacity)?;
            tracing::debug!(block_id, records = block.len(), "loaded data block");

            for (slot, _, record) in block.slots() {
                rows.push(codec.decode(record)?);
                positions.push(Position::new(block_id, slot as u32));
            }
        }

        Ok((rows, positions))
    }

    /// Header count, block header, directory entry, then the record itself
    fn write_record(&mut self, target: Position, record: &[u8]) -> Result<()> {
        let slot = target.slot as usize;
        let offset = DataBlock::slot_offset(slot, record.len());

        self.write_header()?;

        let mut block_header = Vec::with_capacity(BLOCK_HEADER_SIZE);
        block_header.put_i32(target.block_id as i32);
        block_header.put_i32(target.slot as i32 + 1);
        self.store.write_at(target.block_id, 0, &block_header)?;

        self.store.write_at(
            target.block_id,
            DataBlock::directory_offset(slot),
            &(offset as i32).to_be_bytes(),
        )?;

        self.store.write_at(target.block_id, offset, record)
    }

    fn write_header(&mut self) -> Result<()> {
        self.store.write_at(0, 0, &self.catalog.header_prefix())
    }

    fn finish(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.write_header()?;
        self.store.sync()?;
        self.closed = true;
        tracing::info!(
            table = %self.name,
            data_blocks = self.catalog.data_block_count(),
            "table closed"
        );
        Ok(())
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::warn!(table = %self.name, error = %e, "failed to persist header on drop");
        }
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("path", &self.store.path())
            .field("fields", &self.catalog.fields())
            .field("data_block_count", &self.catalog.data_block_count())
            .field("rows", &self.rows.len())
            .finish()
    }
}
