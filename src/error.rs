//! Error types for access-siege
//!
//! This module defines the error hierarchy for the whole pipeline:
//! - Per-line parse errors (recoverable, the line is skipped)
//! - SQLite store errors (fatal to the run)
//! - Export errors (fatal to the run)
//! - Configuration and CLI errors (reported before any side effect)

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the access-siege application
#[derive(Error, Debug)]
pub enum AppError {
    /// Log line parse errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Record store errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// URL file export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors (reading the input log, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which configured column a parse error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogField {
    Ip,
    Time,
    Url,
    Code,
}

impl std::fmt::Display for LogField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogField::Ip => "ip",
            LogField::Time => "time",
            LogField::Url => "url",
            LogField::Code => "code",
        };
        f.write_str(name)
    }
}

/// Errors produced while parsing a single log line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Configured column index is out of range or the value is empty
    #[error("Missing {field} field at column {index}")]
    MissingField { field: LogField, index: usize },

    /// Timestamp could not be converted to epoch seconds
    #[error("Invalid timestamp '{raw}': {reason}")]
    InvalidTimestamp { raw: String, reason: String },

    /// Status code column is not an integer
    #[error("Invalid status code '{0}'")]
    InvalidStatusCode(String),
}

impl ParseError {
    /// Parse errors only ever cost the current line
    pub fn is_recoverable(&self) -> bool {
        true
    }
}

/// Record store errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Store file cannot be created or opened for writing
    #[error("Storage unavailable at '{path}': {reason}")]
    StorageUnavailable { path: PathBuf, reason: String },

    /// Insert failed (constraint or I/O)
    #[error("Failed to write record: {0}")]
    Write(String),

    /// Schema error
    #[error("Database schema error: {0}")]
    Schema(String),

    /// Store used after `close()`
    #[error("Record store is closed")]
    Closed,
}

/// URL file export errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// Fewer distinct IPs than requested output files
    #[error("Too few IPs found to split urls into {requested} files (found {found})")]
    InsufficientIps { found: usize, requested: usize },

    /// Output file could not be created or written
    #[error("Failed to write output file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from the store failed mid-export
    #[error("Database error during export: {0}")]
    Database(#[from] DbError),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Input log does not exist
    #[error("Input file '{path}' does not exist or is not readable")]
    InputNotFound { path: PathBuf },

    /// Ingest requested without column spec or time format
    #[error("Log line pattern (-p) and time format (-t) are required together with input (-i)")]
    MissingIngestOptions,

    /// Malformed column spec
    #[error("Invalid column spec '{spec}': {reason}")]
    InvalidColumnSpec { spec: String, reason: String },

    /// Malformed time format descriptor
    #[error("Invalid time format '{format}': {reason}")]
    InvalidTimeFormat { format: String, reason: String },

    /// Neither or both of line budget / group count given
    #[error("Exactly one output policy is required: lines per file (-l) or group count (-g)")]
    OutputPolicy,

    /// Export requested without a domain prefix
    #[error("Domain (-d) is required when generating output files")]
    MissingDomain,

    /// Output pattern lacks the sequence placeholder
    #[error("Output pattern '{pattern}' must contain the '{{n}}' placeholder")]
    MissingPlaceholder { pattern: String },

    /// Output path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },

    /// Invalid exclusion filter
    #[error("Invalid filter pattern '{pattern}': {reason}")]
    InvalidFilterPattern { pattern: String, reason: String },

    /// A numeric option is outside its allowed range
    #[error("Invalid {name} {value}: must be between {min} and {max}")]
    OutOfRange {
        name: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for DbError
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Result type alias for ExportError
pub type ExportResult<T> = std::result::Result<T, ExportError>;
