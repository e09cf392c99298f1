//! Configuration types for access-siege
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation, one variant per command

use crate::db::{DEFAULT_BATCH_SIZE, DEFAULT_DB_PATH, DEFAULT_PAGE_SIZE};
use crate::error::ConfigError;
use crate::export::{OutputTarget, PartitionPolicy, UrlFilter, SEQUENCE_PLACEHOLDER};
use crate::parser::{ColumnSpec, LogLineParser, TimeFormat};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Batch size limits
const MIN_BATCH_SIZE: usize = 1;
const MAX_BATCH_SIZE: usize = 100_000;

/// Page size limits
const MIN_PAGE_SIZE: usize = 1;
const MAX_PAGE_SIZE: usize = 100_000;

/// Turn web server access logs into siege url files
#[derive(Parser, Debug, Clone)]
#[command(
    name = "access-siege",
    version,
    about = "Turn web server access logs into url files for siege",
    long_about = "Loads access log lines into a local SQLite store, then writes the stored urls \
                  into numbered files, either a fixed number of lines per file or grouped by \
                  client IP, ready to replay with siege.",
    after_help = "EXAMPLES:\n    \
        access-siege ingest -i access.log -p 0,3,6,8 -t 'd/m/y:H:i:s'\n    \
        access-siege export -o urls_{n}.txt -d https://example.com -l 5000\n    \
        access-siege export -o ip_{n}.txt -d https://example.com -g 10 -f '\\.(css|js|png)$'\n    \
        access-siege stats urls -x /index.html\n    \
        access-siege stats ips --verbose-ips"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// SQLite record store
    #[arg(long, global = true, default_value = DEFAULT_DB_PATH, value_name = "FILE")]
    pub db: PathBuf,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse an access log into the record store
    Ingest {
        /// Access log to read
        #[arg(short = 'i', long, value_name = "FILE")]
        input: PathBuf,

        /// Zero-based columns of ip, time, url and status code
        #[arg(short = 'p', long, value_name = "IP,TIME,URL,CODE")]
        pattern: Option<String>,

        /// Date/time layout of the time column, e.g. d/m/y:H:i:s
        #[arg(short = 't', long, value_name = "FORMAT")]
        time_format: Option<String>,

        /// Records per insert transaction
        #[arg(short = 'b', long, default_value_t = DEFAULT_BATCH_SIZE, value_name = "NUM")]
        batch_size: usize,
    },

    /// Write stored urls into numbered files
    Export {
        /// Output file pattern; {n} is replaced by the file number
        #[arg(short = 'o', long, value_name = "PATTERN")]
        output: String,

        /// Prefix for every url, e.g. https://example.com
        #[arg(short = 'd', long, value_name = "DOMAIN")]
        domain: Option<String>,

        /// Lines per file
        #[arg(short = 'l', long, value_name = "NUM")]
        lines: Option<usize>,

        /// Number of files, urls grouped by client IP
        #[arg(short = 'g', long, value_name = "NUM")]
        groups: Option<usize>,

        /// Skip urls matching this regular expression
        #[arg(short = 'f', long, value_name = "REGEX")]
        filter: Option<String>,

        /// Rows fetched per query
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_name = "NUM")]
        page_size: usize,
    },

    /// Show counts from the record store
    Stats {
        #[command(subcommand)]
        target: StatsTarget,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum StatsTarget {
    /// Number of stored urls
    Urls {
        /// Count only this exact url
        #[arg(short = 'x', long, value_name = "URL")]
        url: Option<String>,
    },

    /// Number of distinct client IPs
    Ips {
        /// Also list every IP
        #[arg(long)]
        verbose_ips: bool,
    },
}

/// Validated ingest settings
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub input: PathBuf,
    pub columns: ColumnSpec,
    pub time_format: TimeFormat,
    pub batch_size: usize,
}

impl IngestConfig {
    pub fn parser(&self) -> LogLineParser {
        LogLineParser::new(self.columns, self.time_format.clone())
    }
}

/// Validated export settings
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub target: OutputTarget,
    pub policy: PartitionPolicy,
    pub filter: Option<UrlFilter>,
    pub page_size: usize,
}

/// What the stats command reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsQuery {
    Urls { url: Option<String> },
    Ips { list: bool },
}

/// The command to run with its validated settings
#[derive(Debug, Clone)]
pub enum Mode {
    Ingest(IngestConfig),
    Export(ExportConfig),
    Stats(StatsQuery),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Ingest(_) => "ingest",
            Mode::Export(_) => "export",
            Mode::Stats(_) => "stats",
        }
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Record store path
    pub db_path: PathBuf,

    /// Show progress indicator
    pub show_progress: bool,

    pub mode: Mode,
}

impl AppConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mode = match args.command {
            Command::Ingest {
                input,
                pattern,
                time_format,
                batch_size,
            } => Mode::Ingest(ingest_config(input, pattern, time_format, batch_size)?),
            Command::Export {
                output,
                domain,
                lines,
                groups,
                filter,
                page_size,
            } => Mode::Export(export_config(output, domain, lines, groups, filter, page_size)?),
            Command::Stats { target } => Mode::Stats(match target {
                StatsTarget::Urls { url } => StatsQuery::Urls { url },
                StatsTarget::Ips { verbose_ips } => StatsQuery::Ips { list: verbose_ips },
            }),
        };

        Ok(Self {
            db_path: args.db,
            show_progress: !args.quiet,
            mode,
        })
    }
}

fn ingest_config(
    input: PathBuf,
    pattern: Option<String>,
    time_format: Option<String>,
    batch_size: usize,
) -> Result<IngestConfig, ConfigError> {
    if !input.is_file() {
        return Err(ConfigError::InputNotFound { path: input });
    }

    let (Some(pattern), Some(time_format)) = (pattern, time_format) else {
        return Err(ConfigError::MissingIngestOptions);
    };

    check_range("batch size", batch_size, MIN_BATCH_SIZE, MAX_BATCH_SIZE)?;

    Ok(IngestConfig {
        input,
        columns: ColumnSpec::parse(&pattern)?,
        time_format: TimeFormat::parse(&time_format)?,
        batch_size,
    })
}

fn export_config(
    output: String,
    domain: Option<String>,
    lines: Option<usize>,
    groups: Option<usize>,
    filter: Option<String>,
    page_size: usize,
) -> Result<ExportConfig, ConfigError> {
    if !output.contains(SEQUENCE_PLACEHOLDER) {
        return Err(ConfigError::MissingPlaceholder { pattern: output });
    }

    // Validate output path
    if let Some(parent) = Path::new(&output).parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(ConfigError::InvalidOutputPath {
                path: PathBuf::from(&output),
                reason: format!("Parent directory '{}' does not exist", parent.display()),
            });
        }
    }

    let domain = domain.ok_or(ConfigError::MissingDomain)?;

    let policy = match (lines, groups) {
        (Some(lines_per_file), None) => {
            check_range("lines per file", lines_per_file, 1, usize::MAX)?;
            PartitionPolicy::LineCount { lines_per_file }
        }
        (None, Some(file_count)) => {
            check_range("group count", file_count, 1, usize::MAX)?;
            PartitionPolicy::IpGrouped { file_count }
        }
        _ => return Err(ConfigError::OutputPolicy),
    };

    check_range("page size", page_size, MIN_PAGE_SIZE, MAX_PAGE_SIZE)?;

    let filter = filter
        .map(|pattern| {
            UrlFilter::new(&pattern).map_err(|e| ConfigError::InvalidFilterPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()?;

    Ok(ExportConfig {
        target: OutputTarget {
            pattern: output,
            domain,
        },
        policy,
        filter,
        page_size,
    })
}

fn check_range(
    name: &'static str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}
