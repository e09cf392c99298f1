//! Distribution of stored urls across output files
//!
//! Two policies, chosen exclusively by configuration:
//!
//! - `LineCount`: every url, in log order, with a rollover each time the
//!   current file reaches the line budget.
//! - `IpGrouped`: urls grouped per client IP. IPs are spread over
//!   `file_count` files, `round(ips / file_count)` IPs per file. When the
//!   division is inexact the last file stops at its share and any leftover
//!   IPs are not exported; file sizes are only roughly equal.

use crate::db::{Paginator, RecordStore, DEFAULT_PAGE_SIZE};
use crate::error::{ExportError, ExportResult};
use crate::export::filter::UrlFilter;
use crate::export::writer::{OutputFileSummary, OutputWriter};
use crate::progress::{ExportProgress, ProgressReporter};
use tracing::{debug, info, warn};

/// How urls are split into files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionPolicy {
    /// Fixed number of lines per file
    LineCount { lines_per_file: usize },
    /// Urls grouped by IP into this many files
    IpGrouped { file_count: usize },
}

/// Where and how output lines are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// File name pattern containing `{n}`
    pub pattern: String,
    /// Prefix written before every url (scheme and host)
    pub domain: String,
}

/// Outcome of an export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub files: Vec<OutputFileSummary>,
    pub urls_written: u64,
    pub urls_filtered: u64,
    pub ips_processed: usize,
    pub ips_skipped: usize,
}

/// IPs per file for grouped export: `round(ips / files)`, half away from zero
pub fn ips_per_file(ip_count: usize, file_count: usize) -> usize {
    (ip_count as f64 / file_count.max(1) as f64).round() as usize
}

/// Streams url pages out of the store and into numbered files
pub struct Partitioner<'a> {
    store: &'a RecordStore,
    filter: Option<&'a UrlFilter>,
    page_size: usize,
    progress: Option<&'a ProgressReporter>,
}

impl<'a> Partitioner<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self {
            store,
            filter: None,
            page_size: DEFAULT_PAGE_SIZE,
            progress: None,
        }
    }

    /// Drop urls matching `filter` before writing
    pub fn with_filter(mut self, filter: Option<&'a UrlFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Rows fetched per page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_progress(mut self, progress: Option<&'a ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Run the export under `policy`
    pub fn run(
        &self,
        target: &OutputTarget,
        policy: PartitionPolicy,
    ) -> ExportResult<ExportSummary> {
        match policy {
            PartitionPolicy::LineCount { lines_per_file } => {
                self.by_line_count(target, lines_per_file)
            }
            PartitionPolicy::IpGrouped { file_count } => self.by_ip(target, file_count),
        }
    }

    fn by_line_count(
        &self,
        target: &OutputTarget,
        lines_per_file: usize,
    ) -> ExportResult<ExportSummary> {
        info!(lines_per_file, "Writing url files by line count");

        let mut summary = ExportSummary::default();
        let mut writer = OutputWriter::open(&target.pattern, &target.domain)?;
        let mut paginator = Paginator::new(self.store);

        for page in paginator.url_pages(self.page_size) {
            let urls = self.filter_page(page?, &mut summary);
            writer.write(&urls, Some(lines_per_file))?;
            summary.urls_written += urls.len() as u64;
            self.report(&writer, &summary, None);
        }

        writer.close()?;
        summary.files = writer.files().to_vec();
        Ok(summary)
    }

    fn by_ip(&self, target: &OutputTarget, file_count: usize) -> ExportResult<ExportSummary> {
        let ips = self.store.distinct_ips()?;
        if ips.len() < file_count {
            return Err(ExportError::InsufficientIps {
                found: ips.len(),
                requested: file_count,
            });
        }

        let per_file = ips_per_file(ips.len(), file_count);
        info!(
            ips = ips.len(),
            files = file_count,
            ips_per_file = per_file,
            "Writing url files grouped by IP"
        );

        let mut summary = ExportSummary::default();
        let mut writer = OutputWriter::open(&target.pattern, &target.domain)?;
        let mut paginator = Paginator::new(self.store);
        let mut current_file = 1;
        let mut ips_in_file = 0;

        for ip in ips {
            paginator.reset();
            for page in paginator.ip_pages(ip, self.page_size) {
                let urls = self.filter_page(page?, &mut summary);
                writer.write(&urls, None)?;
                summary.urls_written += urls.len() as u64;
                self.report(&writer, &summary, Some(ip.as_str()));
            }
            debug!(ip = %ip, file = writer.sequence_number(), "Exported IP");

            summary.ips_processed += 1;
            ips_in_file += 1;
            if ips_in_file == per_file {
                if current_file == file_count {
                    break;
                }
                writer.rollover()?;
                current_file += 1;
                ips_in_file = 0;
            }
        }

        summary.ips_skipped = ips.len() - summary.ips_processed;
        if summary.ips_skipped > 0 {
            warn!(
                skipped = summary.ips_skipped,
                "IPs beyond the last file's share were not exported"
            );
        }

        writer.close()?;
        summary.files = writer.files().to_vec();
        Ok(summary)
    }

    fn filter_page(&self, urls: Vec<String>, summary: &mut ExportSummary) -> Vec<String> {
        match self.filter {
            Some(filter) => {
                let (kept, dropped) = filter.apply(urls);
                summary.urls_filtered += dropped as u64;
                kept
            }
            None => urls,
        }
    }

    fn report(&self, writer: &OutputWriter, summary: &ExportSummary, ip: Option<&str>) {
        if let Some(progress) = self.progress {
            progress.update_export(&ExportProgress {
                file: writer.sequence_number(),
                urls_written: summary.urls_written,
                urls_filtered: summary.urls_filtered,
                ips_processed: summary.ips_processed,
                current_ip: ip.map(str::to_string),
            });
        }
    }
}
