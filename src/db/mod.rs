//! Database module for SQLite storage
//!
//! This module provides the durable record store and the read side used by
//! export.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐      ┌──────────────────────────┐
//! │  Ingestor                │      │  Partitioner             │
//! │  - parsed AccessRecords  │      │  - url pages             │
//! └────────────┬─────────────┘      └────────────▲─────────────┘
//!              │ push                            │ next_urls / next_urls_for_ip
//!              ▼                                 │
//! ┌──────────────────────────┐      ┌────────────┴─────────────┐
//! │  BatchWriter             │      │  Paginator               │
//! │  - 1K records/batch      │      │  - LIMIT/OFFSET cursor   │
//! └────────────┬─────────────┘      └────────────▲─────────────┘
//!              │ insert_batch                    │ page
//!              ▼                                 │
//! ┌─────────────────────────────────────────────────────────────┐
//! │  RecordStore (db.sqlite, table `access`)                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod paginator;
pub mod query;
pub mod schema;
pub mod store;
pub mod writer;

pub use paginator::{Paginator, UrlPages, DEFAULT_PAGE_SIZE};
pub use query::{Clause, Column, CompareOp, Predicate, Row};
pub use schema::{create_database, create_indexes, keys};
pub use store::{RecordStore, DEFAULT_DB_PATH};
pub use writer::{BatchWriter, WriterStats, DEFAULT_BATCH_SIZE};
