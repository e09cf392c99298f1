//! Progress reporting for ingest and export
//!
//! Provides a live spinner using indicatif and the coloured header and
//! summaries printed around each command.

use crate::export::ExportSummary;
use crate::ingest::IngestStats;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Snapshot of an ingest in progress
#[derive(Debug, Clone, Default)]
pub struct IngestProgress {
    pub lines_read: u64,
    pub records_inserted: u64,
    pub lines_skipped: u64,
    pub bytes_read: u64,
    pub elapsed: Duration,
}

impl IngestProgress {
    pub fn lines_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.lines_read as f64 / secs
        } else {
            0.0
        }
    }
}

/// Snapshot of an export in progress
#[derive(Debug, Clone, Default)]
pub struct ExportProgress {
    pub file: u32,
    pub urls_written: u64,
    pub urls_filtered: u64,
    pub ips_processed: usize,
    pub current_ip: Option<String>,
}

/// Spinner showing the running command's counters
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    pub fn update_ingest(&self, progress: &IngestProgress) {
        let msg = format!(
            "Lines: {} | Records: {} | Skipped: {} | Read: {} | Rate: {:.0}/s",
            format_number(progress.lines_read),
            format_number(progress.records_inserted),
            format_number(progress.lines_skipped),
            format_size(progress.bytes_read, BINARY),
            progress.lines_per_second(),
        );
        self.bar.set_message(msg);
    }

    pub fn update_export(&self, progress: &ExportProgress) {
        let mut msg = format!(
            "File: {} | Urls: {} | Filtered: {}",
            progress.file,
            format_number(progress.urls_written),
            format_number(progress.urls_filtered),
        );
        if let Some(ip) = &progress.current_ip {
            msg.push_str(&format!(
                " | IPs: {} | Current: {}",
                format_number(progress.ips_processed as u64),
                ip
            ));
        }
        self.bar.set_message(msg);
    }

    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Group digits in threes: 1234567 -> "1,234,567"
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Print the banner at the start of a command
pub fn print_header(command: &str, db_path: &str, detail: &str) {
    println!();
    println!(
        "{} {}",
        style("access-siege").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Command:").bold(), command);
    println!("  {} {}", style("Database:").bold(), db_path);
    if !detail.is_empty() {
        println!("  {} {}", style("Source:").bold(), detail);
    }
    println!();
}

/// Print the result of an ingest
pub fn print_ingest_summary(stats: &IngestStats, db_path: &str, db_size: Option<u64>) {
    let secs = stats.duration.as_secs_f64();
    let rate = if secs > 0.0 {
        stats.lines_read as f64 / secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Ingest Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Lines:").bold(), format_number(stats.lines_read));
    println!(
        "  {} {}",
        style("Records:").bold(),
        format_number(stats.records_inserted)
    );
    if stats.lines_skipped > 0 {
        println!(
            "  {} {}",
            style("Skipped:").yellow().bold(),
            format_number(stats.lines_skipped)
        );
    }
    println!(
        "  {} {}",
        style("Input Size:").bold(),
        format_size(stats.bytes_read, BINARY)
    );
    println!(
        "  {} {:.1}s ({:.0} lines/sec)",
        style("Duration:").bold(),
        secs,
        rate
    );
    match db_size {
        Some(size) => println!(
            "  {} {} ({})",
            style("Database:").bold(),
            db_path,
            format_size(size, BINARY)
        ),
        None => println!("  {} {}", style("Database:").bold(), db_path),
    }
    println!();
}

/// Print the files produced by an export
pub fn print_export_summary(summary: &ExportSummary, duration: Duration) {
    println!();
    println!("{}", style("All files have been created").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    for file in &summary.files {
        println!(
            "  {} {} lines",
            style(file.path.display()).bold(),
            format_number(file.lines)
        );
    }
    println!(
        "  {} {}",
        style("Urls:").bold(),
        format_number(summary.urls_written)
    );
    if summary.urls_filtered > 0 {
        println!(
            "  {} {}",
            style("Filtered:").bold(),
            format_number(summary.urls_filtered)
        );
    }
    if summary.ips_processed > 0 {
        println!(
            "  {} {}",
            style("IPs:").bold(),
            format_number(summary.ips_processed as u64)
        );
    }
    if summary.ips_skipped > 0 {
        println!(
            "  {} {}",
            style("IPs not exported:").yellow().bold(),
            format_number(summary.ips_skipped as u64)
        );
    }
    println!(
        "  {} {:.1}s",
        style("Duration:").bold(),
        duration.as_secs_f64()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(250_000), "250,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_lines_per_second() {
        let progress = IngestProgress {
            lines_read: 500,
            elapsed: Duration::from_secs(2),
            ..Default::default()
        };
        assert_eq!(progress.lines_per_second(), 250.0);
        assert_eq!(IngestProgress::default().lines_per_second(), 0.0);
    }
}
