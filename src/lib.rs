//! access-siege - Access Log to Siege Url Files
//!
//! Loads web server access logs into a local SQLite store and writes the
//! stored urls back out as plain-text url lists for the `siege` load
//! generator.
//!
//! # Features
//!
//! - **Configurable Log Layout**: Column positions for IP, time, url and
//!   status code, plus a time layout descriptor such as `d/m/y:H:i:s`.
//!
//! - **Batched Ingest**: Records are inserted in transactions; lines that
//!   fail to parse are logged and skipped.
//!
//! - **Paged Export**: Urls are streamed out of the store a page at a time,
//!   so memory stays flat regardless of the log size.
//!
//! - **Two Partition Policies**: A fixed number of lines per file, or urls
//!   grouped by client IP across a fixed number of files.
//!
//! # Architecture
//!
//! ```text
//!   access.log
//!       │
//!       ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │  LogLineParser   │────▶│   BatchWriter    │
//! │ (columns, time)  │     │ (1K rows / txn)  │
//! └──────────────────┘     └────────┬─────────┘
//!                                   ▼
//!                         ┌──────────────────┐
//!                         │   RecordStore    │
//!                         │   (db.sqlite)    │
//!                         └────────┬─────────┘
//!                                  │ LIMIT / OFFSET
//!                                  ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Partitioner    │◀────│    Paginator     │
//! │ (lines | by IP)  │     └──────────────────┘
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │   OutputWriter   │──▶ urls_1.txt, urls_2.txt, ...
//! └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! access-siege ingest -i access.log -p 0,3,6,8 -t 'd/m/y:H:i:s'
//! access-siege export -o urls_{n}.txt -d https://example.com -g 4
//! siege -f urls_1.txt
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ingest;
pub mod parser;
pub mod progress;

pub use config::{AppConfig, CliArgs, Mode};
pub use db::RecordStore;
pub use error::{AppError, Result};
pub use export::{OutputTarget, PartitionPolicy, Partitioner};
pub use ingest::{IngestStats, Ingestor};
pub use parser::{AccessRecord, LogLineParser};
