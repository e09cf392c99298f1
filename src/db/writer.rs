//! Batched record writer for high-throughput inserts
//!
//! Buffers parsed records and flushes them to the store in one transaction
//! per batch. Runs on the caller's thread; there is no background writer.
//!
//! # Performance Characteristics
//!
//! - One transaction per batch (1K records by default)
//! - Cached prepared statement inside the store
//! - A failed flush is fatal; rows from earlier batches stay committed

use crate::db::store::RecordStore;
use crate::error::DbResult;
use crate::parser::AccessRecord;
use tracing::debug;

/// Default records per transaction
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Statistics about write operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Total records written
    pub records_written: u64,

    /// Total batches committed
    pub batches_committed: u64,
}

/// Buffers records and writes them to a `RecordStore` in batches
pub struct BatchWriter<'a> {
    store: &'a RecordStore,
    buffer: Vec<AccessRecord>,
    batch_size: usize,
    stats: WriterStats,
}

impl<'a> BatchWriter<'a> {
    pub fn new(store: &'a RecordStore, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            stats: WriterStats::default(),
        }
    }

    /// Queue a record, flushing when the batch is full
    pub fn push(&mut self, record: AccessRecord) -> DbResult<()> {
        self.buffer.push(record);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Write any buffered records
    pub fn flush(&mut self) -> DbResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let written = self.store.insert_batch(&self.buffer)?;
        self.buffer.clear();

        self.stats.records_written += written as u64;
        self.stats.batches_committed += 1;
        debug!(
            written,
            total = self.stats.records_written,
            "Committed record batch"
        );
        Ok(())
    }

    /// Records queued but not yet written
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    /// Flush the remainder and return the final statistics
    pub fn finish(mut self) -> DbResult<WriterStats> {
        self.flush()?;
        Ok(self.stats)
    }
}
