//! Block Store
//!
//! Seek-and-read / seek-and-write of fixed-size blocks over one file.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{Result, TableError};

use super::BLOCK_SIZE;

/// One raw block image
pub type Block = [u8; BLOCK_SIZE];

/// Raw block I/O over a single backing file
///
/// No caching beyond the OS file layer. Writes are not atomic with respect to
/// each other: a failure between two writes of one logical mutation leaves the
/// file partially updated.
#[derive(Debug)]
pub struct BlockStore {
    /// Backing file path
    path: PathBuf,
    /// Open read/write handle
    file: File,
    /// Whether writes are also fsynced
    sync_strategy: SyncStrategy,
}

impl BlockStore {
    /// Open the backing file, creating an empty one if it does not exist
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_strategy,
        })
    }

    /// Read block `block_id` in full
    ///
    /// A file that ends inside the requested block is reported as corruption.
    pub fn read_block(&mut self, block_id: u32) -> Result<Block> {
        let mut block = [0u8; BLOCK_SIZE];
        self.file.seek(SeekFrom::Start(Self::block_start(block_id)))?;

        match self.file.read_exact(&mut block) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(TableError::Corruption(format!(
                    "block {} is truncated in {}",
                    block_id,
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::trace!(block_id, "read block");
        Ok(block)
    }

    /// Overwrite block `block_id` in full
    pub fn write_block(&mut self, block_id: u32, block: &Block) -> Result<()> {
        self.write_at(block_id, 0, block)
    }

    /// Overwrite `bytes` at `offset` inside block `block_id`
    pub fn write_at(&mut self, block_id: u32, offset: usize, bytes: &[u8]) -> Result<()> {
        if offset + bytes.len() > BLOCK_SIZE {
            return Err(TableError::Validation(format!(
                "write of {} bytes at offset {} crosses the end of block {}",
                bytes.len(),
                offset,
                block_id
            )));
        }

        self.file
            .seek(SeekFrom::Start(Self::block_start(block_id) + offset as u64))?;
        self.file.write_all(bytes)?;
        self.file.flush()?;

        if self.sync_strategy == SyncStrategy::EveryWrite {
            self.file.sync_data()?;
        }

        tracing::trace!(block_id, offset, len = bytes.len(), "wrote block bytes");
        Ok(())
    }

    /// Current file length in bytes
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// True if the file holds no bytes at all (no schema written yet)
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of whole blocks currently in the file
    pub fn blocks_on_disk(&self) -> Result<u64> {
        Ok(self.len()? / BLOCK_SIZE as u64)
    }

    /// Cut the file down to its first `count` blocks
    pub fn truncate_blocks(&mut self, count: u32) -> Result<()> {
        self.file.set_len(Self::block_start(count))?;
        self.sync()
    }

    /// Force file contents and metadata to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn block_start(block_id: u32) -> u64 {
        block_id as u64 * BLOCK_SIZE as u64
    }
}
