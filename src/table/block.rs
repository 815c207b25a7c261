//! Data Block
//!
//! Decoded view of one data block: its id and the records its offset
//! directory points at, in slot order.

use bytes::{Buf, BufMut};

use crate::error::{Result, TableError};
use crate::storage::{Block, BLOCK_HEADER_SIZE, BLOCK_SIZE, DIRECTORY_ENTRY_SIZE};

/// One data block's resident records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    block_id: u32,
    /// In-block start of each slot's record, from the offset directory
    offsets: Vec<usize>,
    /// Record bytes, one per slot
    records: Vec<Vec<u8>>,
}

impl DataBlock {
    /// A block with no resident records
    pub fn empty(block_id: u32) -> Self {
        Self {
            block_id,
            offsets: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Pack `records` contiguously from the end of the block, slot 0 first
    pub fn from_records(block_id: u32, records: Vec<Vec<u8>>, record_size: usize) -> Self {
        let offsets = (0..records.len())
            .map(|slot| Self::slot_offset(slot, record_size))
            .collect();
        Self {
            block_id,
            offsets,
            records,
        }
    }

    /// Parse a raw block, checking it against the expected id and capacity
    pub fn decode(
        block: &Block,
        expected_id: u32,
        record_size: usize,
        max_records: usize,
    ) -> Result<Self> {
        let mut buf = &block[..];
        let block_id = buf.get_i32();
        let record_count = buf.get_i32();

        if block_id != expected_id as i32 {
            return Err(TableError::Corruption(format!(
                "block {} carries block id {}",
                expected_id, block_id
            )));
        }
        if record_count < 0 || record_count as usize > max_records {
            return Err(TableError::Corruption(format!(
                "block {} claims {} records (capacity {})",
                expected_id, record_count, max_records
            )));
        }

        let count = record_count as usize;
        let directory_end = Self::directory_offset(count);
        let mut offsets = Vec::with_capacity(count);
        let mut records = Vec::with_capacity(count);

        for slot in 0..count {
            let offset = buf.get_i32();
            if offset < directory_end as i32 || offset as usize + record_size > BLOCK_SIZE {
                return Err(TableError::Corruption(format!(
                    "block {} slot {} points outside the record area (offset {})",
                    expected_id, slot, offset
                )));
            }
            let offset = offset as usize;
            offsets.push(offset);
            records.push(block[offset..offset + record_size].to_vec());
        }

        Ok(Self {
            block_id: expected_id,
            offsets,
            records,
        })
    }

    /// Full block image: header, directory, records, zeroed free space
    pub fn encode(&self, record_size: usize) -> Block {
        let mut block = [0u8; BLOCK_SIZE];

        {
            let mut out = &mut block[..BLOCK_HEADER_SIZE + self.records.len() * DIRECTORY_ENTRY_SIZE];
            out.put_i32(self.block_id as i32);
            out.put_i32(self.records.len() as i32);
            for offset in &self.offsets {
                out.put_i32(*offset as i32);
            }
        }

        for (offset, record) in self.offsets.iter().zip(&self.records) {
            block[*offset..*offset + record_size].copy_from_slice(record);
        }

        block
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn block_id(&self) -> u32 {
        self.block_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(slot, in-block offset, record bytes)` in slot order
    pub fn slots(&self) -> impl Iterator<Item = (usize, usize, &[u8])> + '_ {
        self.offsets
            .iter()
            .zip(&self.records)
            .enumerate()
            .map(|(slot, (offset, record))| (slot, *offset, record.as_slice()))
    }

    pub fn into_records(self) -> Vec<Vec<u8>> {
        self.records
    }

    // =========================================================================
    // Layout Arithmetic
    // =========================================================================

    /// Where slot `slot` lives when records are packed from the block end
    pub fn slot_offset(slot: usize, record_size: usize) -> usize {
        BLOCK_SIZE - (slot + 1) * record_size
    }

    /// Where directory entry `slot` lives
    pub fn directory_offset(slot: usize) -> usize {
        BLOCK_HEADER_SIZE + slot * DIRECTORY_ENTRY_SIZE
    }
}
