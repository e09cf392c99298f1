//! Access log ingestion
//!
//! Reads an access log line by line, parses each line and appends the
//! records to the store in batches. A line that fails to parse is logged
//! and skipped; only store and read failures abort the run. Rows committed
//! before such a failure stay in the store.

use crate::db::{BatchWriter, RecordStore, DEFAULT_BATCH_SIZE};
use crate::error::Result;
use crate::parser::LogLineParser;
use crate::progress::{IngestProgress, ProgressReporter};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lines between progress updates
const PROGRESS_INTERVAL: u64 = 1000;

/// Result of ingesting one input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines_read: u64,
    pub records_inserted: u64,
    pub lines_skipped: u64,
    pub bytes_read: u64,
    pub duration: Duration,
}

/// Drives parsing and batched inserts for one input
pub struct Ingestor<'a> {
    store: &'a RecordStore,
    parser: LogLineParser,
    batch_size: usize,
    progress: Option<&'a ProgressReporter>,
}

impl<'a> Ingestor<'a> {
    pub fn new(store: &'a RecordStore, parser: LogLineParser) -> Self {
        Self {
            store,
            parser,
            batch_size: DEFAULT_BATCH_SIZE,
            progress: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_progress(mut self, progress: Option<&'a ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Ingest a log file and record it as the store's latest source
    pub fn ingest_file(&self, path: &Path) -> Result<IngestStats> {
        info!(input = %path.display(), "Reading access log");
        let file = File::open(path)?;
        let stats = self.ingest_reader(BufReader::new(file))?;

        self.store
            .finalize_ingest(&path.display().to_string(), stats.records_inserted)?;
        info!(
            records = stats.records_inserted,
            skipped = stats.lines_skipped,
            "Done reading file"
        );
        Ok(stats)
    }

    /// Ingest every line from `reader`
    pub fn ingest_reader<R: BufRead>(&self, mut reader: R) -> Result<IngestStats> {
        let start = Instant::now();
        let mut writer = BatchWriter::new(self.store, self.batch_size);
        let mut stats = IngestStats::default();
        let mut buf = Vec::with_capacity(4096);

        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            stats.lines_read += 1;
            stats.bytes_read += n as u64;

            let line = String::from_utf8_lossy(&buf);
            if line.trim().is_empty() {
                debug!(line = stats.lines_read, "Skipping blank line");
                stats.lines_skipped += 1;
                continue;
            }

            match self.parser.parse(&line) {
                Ok(record) => writer.push(record)?,
                Err(e) => {
                    warn!(line = %line.trim_end(), error = %e, "Unable to parse");
                    stats.lines_skipped += 1;
                }
            }

            if stats.lines_read % PROGRESS_INTERVAL == 0 {
                self.report(&stats, &writer, start);
            }
        }

        let written = writer.finish()?;
        stats.records_inserted = written.records_written;
        stats.duration = start.elapsed();
        Ok(stats)
    }

    fn report(&self, stats: &IngestStats, writer: &BatchWriter<'_>, start: Instant) {
        if let Some(progress) = self.progress {
            progress.update_ingest(&IngestProgress {
                lines_read: stats.lines_read,
                records_inserted: writer.stats().records_written + writer.pending() as u64,
                lines_skipped: stats.lines_skipped,
                bytes_read: stats.bytes_read,
                elapsed: start.elapsed(),
            });
        }
    }
}
