//! Sequenced url file writer
//!
//! `OutputWriter` owns exactly one open output file at a time. File names
//! come from a pattern with a `{n}` placeholder that is replaced by the
//! sequence number, starting at 1. Existing files are truncated.

use crate::error::{ExportError, ExportResult};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Placeholder replaced by the file sequence number
pub const SEQUENCE_PLACEHOLDER: &str = "{n}";

/// Lines written to one output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFileSummary {
    pub path: PathBuf,
    pub lines: u64,
}

/// Writes `domain + url` lines into a numbered sequence of files
pub struct OutputWriter {
    pattern: String,
    domain: String,
    sequence: u32,
    lines_in_file: usize,
    file: Option<BufWriter<File>>,
    files: Vec<OutputFileSummary>,
}

impl OutputWriter {
    /// Open the first file of the sequence
    pub fn open(pattern: &str, domain: &str) -> ExportResult<Self> {
        let mut writer = Self {
            pattern: pattern.to_string(),
            domain: domain.to_string(),
            sequence: 1,
            lines_in_file: 0,
            file: None,
            files: Vec::new(),
        };
        writer.open_current()?;
        Ok(writer)
    }

    /// Resolve the file name for a sequence number
    pub fn file_name(pattern: &str, sequence: u32) -> PathBuf {
        PathBuf::from(pattern.replace(SEQUENCE_PLACEHOLDER, &sequence.to_string()))
    }

    fn open_current(&mut self) -> ExportResult<()> {
        let path = Self::file_name(&self.pattern, self.sequence);
        let file = File::create(&path).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(file = %path.display(), "Opened output file");

        self.file = Some(BufWriter::new(file));
        self.lines_in_file = 0;
        self.files.push(OutputFileSummary { path, lines: 0 });
        Ok(())
    }

    /// Write one line per url, rolling over whenever `line_budget` is reached
    pub fn write(&mut self, urls: &[String], line_budget: Option<usize>) -> ExportResult<()> {
        for url in urls {
            let Some(file) = self.file.as_mut() else {
                return Err(self.io_error(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "output file is closed",
                )));
            };
            writeln!(file, "{}{}", self.domain, url).map_err(|e| self.io_error(e))?;

            self.lines_in_file += 1;
            if let Some(current) = self.files.last_mut() {
                current.lines += 1;
            }

            if line_budget.is_some_and(|budget| self.lines_in_file >= budget) {
                self.rollover()?;
            }
        }
        Ok(())
    }

    /// Close the current file and open the next one in the sequence
    pub fn rollover(&mut self) -> ExportResult<()> {
        self.close()?;
        self.sequence += 1;
        self.open_current()
    }

    /// Flush and release the current file; safe to call repeatedly
    pub fn close(&mut self) -> ExportResult<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().map_err(|e| self.io_error(e))?;
            debug!(
                file = %self.current_path().display(),
                lines = self.lines_in_file,
                "Closed output file"
            );
        }
        Ok(())
    }

    pub fn sequence_number(&self) -> u32 {
        self.sequence
    }

    pub fn lines_in_current_file(&self) -> usize {
        self.lines_in_file
    }

    /// Path of the file currently (or most recently) open
    pub fn current_path(&self) -> &Path {
        self.files
            .last()
            .map(|f| f.path.as_path())
            .unwrap_or_else(|| Path::new(""))
    }

    /// Every file opened so far, in sequence order
    pub fn files(&self) -> &[OutputFileSummary] {
        &self.files
    }

    fn io_error(&self, source: io::Error) -> ExportError {
        ExportError::Io {
            path: self.current_path().to_path_buf(),
            source,
        }
    }
}

impl Drop for OutputWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
