//! Offset-based pagination over the record store
//!
//! `Paginator` keeps the cursor so callers can keep asking for the next
//! batch. `Ok(None)` marks the end of a scan; errors only travel on `Err`.
//!
//! The offset is never reset implicitly. Switching to a different
//! predicate (e.g. the next IP bucket) without calling `reset()` continues
//! at the old offset.
//!
//! Every scan is ordered by `id`, so pages follow log order whichever index
//! the planner picks.

use crate::db::query::{Column, Predicate};
use crate::db::store::RecordStore;
use crate::error::DbResult;

/// Default rows per page, bounding peak memory during export
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Pagination state for one logical scan
#[derive(Debug, Clone, Default, PartialEq)]
struct Cursor {
    offset: u64,
    page_size: usize,
    predicate: Predicate,
}

/// Streams urls out of a `RecordStore` one page at a time
pub struct Paginator<'a> {
    store: &'a RecordStore,
    cursor: Cursor,
}

impl<'a> Paginator<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self {
            store,
            cursor: Cursor::default(),
        }
    }

    /// Next page of all urls, in insertion (log) order
    pub fn next_urls(&mut self, page_size: usize) -> DbResult<Option<Vec<String>>> {
        self.cursor.page_size = page_size;
        self.cursor.predicate = Predicate::all();
        self.fetch()
    }

    /// Next page of urls requested by `ip`, ordered by insertion id
    pub fn next_urls_for_ip(
        &mut self,
        ip: &str,
        page_size: usize,
    ) -> DbResult<Option<Vec<String>>> {
        self.cursor.page_size = page_size;
        self.cursor.predicate = Predicate::eq(Column::Ip, ip.to_string());
        self.fetch()
    }

    /// Iterate pages of all urls until the store is exhausted
    pub fn url_pages(&mut self, page_size: usize) -> UrlPages<'_, 'a> {
        UrlPages {
            paginator: self,
            ip: None,
            page_size,
        }
    }

    /// Iterate pages of one IP's urls until they are exhausted
    pub fn ip_pages<'p>(&'p mut self, ip: &'p str, page_size: usize) -> UrlPages<'p, 'a> {
        UrlPages {
            paginator: self,
            ip: Some(ip),
            page_size,
        }
    }

    /// Start the next scan from the first row
    pub fn reset(&mut self) {
        self.cursor.offset = 0;
    }

    pub fn offset(&self) -> u64 {
        self.cursor.offset
    }

    fn fetch(&mut self) -> DbResult<Option<Vec<String>>> {
        let rows = self.store.page(
            &[Column::Url],
            self.cursor.page_size,
            &self.cursor.predicate,
            true,
            self.cursor.offset,
        )?;
        self.cursor.offset += self.cursor.page_size as u64;

        if rows.is_empty() {
            return Ok(None);
        }

        Ok(Some(
            rows.into_iter()
                .filter_map(|row| row.into_text(Column::Url))
                .collect(),
        ))
    }
}

/// Iterator over url pages; ends when the paginator reports exhaustion
pub struct UrlPages<'p, 'a> {
    paginator: &'p mut Paginator<'a>,
    ip: Option<&'p str>,
    page_size: usize,
}

impl Iterator for UrlPages<'_, '_> {
    type Item = DbResult<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let page = match self.ip {
            Some(ip) => self.paginator.next_urls_for_ip(ip, self.page_size),
            None => self.paginator.next_urls(self.page_size),
        };
        page.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AccessRecord;

    fn store_with(records: &[(&str, &str)]) -> RecordStore {
        let store = RecordStore::open_in_memory().unwrap();
        let records: Vec<_> = records
            .iter()
            .map(|(ip, url)| AccessRecord::new(*ip, 0, *url, 200))
            .collect();
        store.insert_batch(&records).unwrap();
        store
    }

    #[test]
    fn test_pages_until_exhausted() {
        let store = store_with(&[("a", "/1"), ("a", "/2"), ("b", "/3")]);
        let mut paginator = Paginator::new(&store);

        assert_eq!(
            paginator.next_urls(2).unwrap(),
            Some(vec!["/1".to_string(), "/2".to_string()])
        );
        assert_eq!(paginator.offset(), 2);
        assert_eq!(paginator.next_urls(2).unwrap(), Some(vec!["/3".to_string()]));
        assert_eq!(paginator.next_urls(2).unwrap(), None);
    }

    #[test]
    fn test_ip_scan_needs_reset() {
        let store = store_with(&[("a", "/1"), ("b", "/2"), ("a", "/3"), ("b", "/4")]);
        let mut paginator = Paginator::new(&store);

        let a: Vec<String> = paginator
            .ip_pages("a", 10)
            .flat_map(Result::unwrap)
            .collect();
        assert_eq!(a, vec!["/1", "/3"]);

        // Offset carried over from the previous scan skips b's rows
        assert_eq!(paginator.next_urls_for_ip("b", 10).unwrap(), None);

        paginator.reset();
        assert_eq!(paginator.offset(), 0);
        assert_eq!(
            paginator.next_urls_for_ip("b", 10).unwrap(),
            Some(vec!["/2".to_string(), "/4".to_string()])
        );
    }

    #[test]
    fn test_url_pages_iterator() {
        let store = store_with(&[("a", "/1"), ("a", "/2"), ("a", "/3")]);
        let mut paginator = Paginator::new(&store);
        let pages: Vec<Vec<String>> = paginator.url_pages(1).map(Result::unwrap).collect();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2], vec!["/3"]);
    }

    #[test]
    fn test_log_order_survives_url_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("db.sqlite")).unwrap();
        let records: Vec<_> = ["/zeta", "/alpha", "/mid", "/beta"]
            .iter()
            .map(|url| AccessRecord::new("a", 0, *url, 200))
            .collect();
        store.insert_batch(&records).unwrap();
        store.finalize_ingest("access.log", 4).unwrap();

        let mut paginator = Paginator::new(&store);
        let urls: Vec<String> = paginator.url_pages(3).flat_map(Result::unwrap).collect();
        assert_eq!(urls, vec!["/zeta", "/alpha", "/mid", "/beta"]);
    }
}
