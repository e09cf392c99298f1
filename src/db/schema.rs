//! Database schema definitions and creation
//!
//! This module defines the SQLite schema for storing parsed access log
//! records and provides functions to create and configure the database.

use crate::error::{DbError, DbResult};
use rusqlite::Connection;

/// Current schema version, recorded in `store_info`
pub const SCHEMA_VERSION: u32 = 1;

/// SQL to create the access table
/// INTEGER PRIMARY KEY aliases the rowid, so ids are assigned in insert order.
const CREATE_ACCESS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS access (
    id INTEGER PRIMARY KEY,
    ip TEXT NOT NULL,
    time INTEGER NOT NULL,         -- Unix timestamp
    url TEXT NOT NULL,
    code INTEGER NOT NULL          -- HTTP status code
)
"#;

/// SQL to create store metadata table
const CREATE_STORE_INFO_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS store_info (
    key TEXT PRIMARY KEY,
    value TEXT
)
"#;

/// Indexes for the grouped export and url counts
const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_access_ip ON access(ip, id)",
    "CREATE INDEX IF NOT EXISTS idx_access_url ON access(url)",
];

/// Pragmas applied on every open
const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA cache_size = -64000;      -- 64MB cache
PRAGMA temp_store = MEMORY;
"#;

/// Configure the connection and create tables if absent
pub fn create_database(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(PRAGMAS)?;

    conn.execute(CREATE_ACCESS_TABLE, [])?;
    conn.execute(CREATE_STORE_INFO_TABLE, [])?;

    Ok(())
}

/// Create indexes (called after ingest for better insert performance)
pub fn create_indexes(conn: &Connection) -> DbResult<()> {
    for sql in CREATE_INDEXES {
        conn.execute(sql, [])?;
    }
    Ok(())
}

/// Check that an existing store was written with this schema
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    let tables: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('access', 'store_info')",
        [],
        |row| row.get(0),
    )?;
    if tables != 2 {
        return Err(DbError::Schema("missing access or store_info table".into()));
    }

    match get_info(conn, keys::SCHEMA_VERSION)? {
        Some(version) if version == SCHEMA_VERSION.to_string() => Ok(()),
        Some(version) => Err(DbError::Schema(format!(
            "schema version {} is not supported (expected {})",
            version, SCHEMA_VERSION
        ))),
        None => Err(DbError::Schema("schema version not recorded".into())),
    }
}

/// Store metadata
pub fn set_info(conn: &Connection, key: &str, value: &str) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO store_info (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}

/// Get metadata
pub fn get_info(conn: &Connection, key: &str) -> DbResult<Option<String>> {
    let result = conn.query_row(
        "SELECT value FROM store_info WHERE key = ?1",
        [key],
        |row| row.get(0),
    );

    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Metadata keys
pub mod keys {
    /// Schema version
    pub const SCHEMA_VERSION: &str = "schema_version";

    /// Tool version that created the store
    pub const TOOL_VERSION: &str = "tool_version";

    /// Path of the most recently ingested log
    pub const LAST_INGEST_SOURCE: &str = "last_ingest_source";

    /// Completion time of the most recent ingest (RFC 3339)
    pub const LAST_INGEST_TIME: &str = "last_ingest_time";

    /// Records inserted by the most recent ingest
    pub const LAST_INGEST_RECORDS: &str = "last_ingest_records";
}
