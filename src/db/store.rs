//! SQLite-backed record store
//!
//! `RecordStore` owns the single connection to the store file. Rows are only
//! ever appended; nothing in this crate updates or deletes them.
//!
//! The distinct IP list is computed once per store instance and cached in
//! the `ip_cache` field. It is never invalidated: inserting after the first
//! `distinct_ips()` call leaves the cache stale. Ingest and export run as
//! separate invocations, so a single run never interleaves the two.

use crate::db::query::{self, Column, Predicate, Row};
use crate::db::schema::{self, keys};
use crate::error::{DbError, DbResult};
use crate::parser::AccessRecord;
use once_cell::unsync::OnceCell;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default store location, relative to the working directory
pub const DEFAULT_DB_PATH: &str = "db.sqlite";

/// Durable table of parsed access records
pub struct RecordStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
    ip_cache: OnceCell<Vec<String>>,
}

impl RecordStore {
    /// Open the store at `path`, creating the file and schema if absent
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let unavailable = |reason: String| DbError::StorageUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let existed = path.exists();
        let conn = Connection::open(path).map_err(|e| unavailable(e.to_string()))?;
        schema::create_database(&conn).map_err(|e| unavailable(e.to_string()))?;

        if existed {
            debug!(path = %path.display(), "Opened record store");
        } else {
            schema::set_info(&conn, keys::SCHEMA_VERSION, &schema::SCHEMA_VERSION.to_string())
                .map_err(|e| unavailable(e.to_string()))?;
            schema::set_info(&conn, keys::TOOL_VERSION, env!("CARGO_PKG_VERSION"))
                .map_err(|e| unavailable(e.to_string()))?;
            info!(path = %path.display(), "Created new record store");
        }

        Ok(Self {
            conn: Some(conn),
            path: Some(path.to_path_buf()),
            ip_cache: OnceCell::new(),
        })
    }

    /// Open an existing store for reading only
    ///
    /// No pragmas or schema statements run, so the file is left untouched.
    pub fn open_read_only(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            DbError::StorageUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        schema::verify_schema(&conn)?;
        debug!(path = %path.display(), "Opened record store read-only");

        Ok(Self {
            conn: Some(conn),
            path: Some(path.to_path_buf()),
            ip_cache: OnceCell::new(),
        })
    }

    /// Open a throwaway store in memory
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::create_database(&conn)?;
        Ok(Self {
            conn: Some(conn),
            path: None,
            ip_cache: OnceCell::new(),
        })
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or(DbError::Closed)
    }

    /// Append one record, returning its assigned id
    pub fn insert(&self, record: &AccessRecord) -> DbResult<i64> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO access (ip, time, url, code) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![
            record.ip,
            record.timestamp,
            record.url,
            record.status_code
        ])
        .map_err(|e| DbError::Write(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    /// Append a batch of records in one transaction
    pub fn insert_batch(&self, records: &[AccessRecord]) -> DbResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO access (ip, time, url, code) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.ip,
                    record.timestamp,
                    record.url,
                    record.status_code
                ])
                .map_err(|e| DbError::Write(e.to_string()))?;
            }
        }
        tx.commit().map_err(|e| DbError::Write(e.to_string()))?;

        Ok(records.len())
    }

    /// Count stored rows, optionally only those with exactly this url
    pub fn count_urls(&self, url: Option<&str>) -> DbResult<u64> {
        let predicate = match url {
            Some(url) => Predicate::eq(Column::Url, url.to_string()),
            None => Predicate::all(),
        };
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            &query::count(&predicate),
            params_from_iter(predicate.values()),
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Distinct client IPs in first-seen order, cached after the first call
    pub fn distinct_ips(&self) -> DbResult<&[String]> {
        self.ip_cache
            .get_or_try_init(|| self.load_distinct_ips())
            .map(Vec::as_slice)
    }

    fn load_distinct_ips(&self) -> DbResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT ip FROM access GROUP BY ip ORDER BY MIN(id)")?;
        let ips = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        debug!(count = ips.len(), "Loaded distinct IPs");
        Ok(ips)
    }

    /// Number of distinct IPs
    pub fn count_ips(&self) -> DbResult<usize> {
        Ok(self.distinct_ips()?.len())
    }

    /// Fetch one page of rows; an empty page means the scan is exhausted
    pub fn page(
        &self,
        columns: &[Column],
        page_size: usize,
        predicate: &Predicate,
        ordered: bool,
        offset: u64,
    ) -> DbResult<Vec<Row>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&query::select_page(columns, predicate, ordered))?;

        let mut values = predicate.values();
        values.push(Value::Integer(page_size as i64));
        values.push(Value::Integer(offset as i64));

        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| row.get::<_, Value>(i).map(|value| (*column, value)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Row::new)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Build indexes and record ingest metadata once a load completes
    pub fn finalize_ingest(&self, source: &str, records: u64) -> DbResult<()> {
        let conn = self.conn()?;
        schema::create_indexes(conn)?;
        schema::set_info(conn, keys::LAST_INGEST_SOURCE, source)?;
        schema::set_info(conn, keys::LAST_INGEST_TIME, &chrono::Utc::now().to_rfc3339())?;
        schema::set_info(conn, keys::LAST_INGEST_RECORDS, &records.to_string())?;
        Ok(())
    }

    /// Read a metadata value
    pub fn info(&self, key: &str) -> DbResult<Option<String>> {
        schema::get_info(self.conn()?, key)
    }

    /// Release the connection; later calls are no-ops
    pub fn close(&mut self) -> DbResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| DbError::Sqlite(e))?;
            debug!("Closed record store");
        }
        Ok(())
    }
}

impl Drop for RecordStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
