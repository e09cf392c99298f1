//! Integration tests for access-siege
//!
//! Every test works against a scratch SQLite file or an in-memory store.

use access_siege::db::{schema, Paginator, RecordStore};
use access_siege::error::{ExportError, LogField, ParseError};
use access_siege::export::{OutputTarget, PartitionPolicy, Partitioner, UrlFilter};
use access_siege::ingest::Ingestor;
use access_siege::parser::{AccessRecord, ColumnSpec, LogLineParser, TimeFormat};
use rusqlite::Connection;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

const APACHE_LINE: &str =
    "127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] \"GET /apache_pb.gif HTTP/1.0\" 200 2326";

fn apache_parser() -> LogLineParser {
    LogLineParser::new(
        ColumnSpec::parse("0,3,6,8").unwrap(),
        TimeFormat::parse("d/m/y:H:i:s").unwrap(),
    )
}

fn target(dir: &Path, name: &str, domain: &str) -> OutputTarget {
    OutputTarget {
        pattern: dir.join(name).display().to_string(),
        domain: domain.to_string(),
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_parse_apache_line() {
    let record = apache_parser().parse(APACHE_LINE).unwrap();
    assert_eq!(record.ip, "127.0.0.1");
    assert_eq!(record.timestamp, 971_211_336);
    assert_eq!(record.url, "/apache_pb.gif");
    assert_eq!(record.status_code, 200);
}

#[test]
fn test_short_line_is_rejected() {
    let err = apache_parser()
        .parse("127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700]")
        .unwrap_err();
    assert!(matches!(
        err,
        ParseError::MissingField {
            field: LogField::Url,
            index: 6
        }
    ));
}

#[test]
fn test_store_schema_on_disk() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("db.sqlite");

    let mut store = RecordStore::open(&db_path).unwrap();
    store
        .insert(&AccessRecord::new("10.0.0.1", 0, "/a", 200))
        .unwrap();
    store.finalize_ingest("access.log", 1).unwrap();
    store.close().unwrap();

    let conn = Connection::open(&db_path).unwrap();
    let tables: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table'")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert!(tables.contains(&"access".to_string()));
    assert!(tables.contains(&"store_info".to_string()));

    let source = schema::get_info(&conn, schema::keys::LAST_INGEST_SOURCE).unwrap();
    assert_eq!(source.as_deref(), Some("access.log"));

    let (ip, url, code): (String, String, i64) = conn
        .query_row("SELECT ip, url, code FROM access", [], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .unwrap();
    assert_eq!((ip.as_str(), url.as_str(), code), ("10.0.0.1", "/a", 200));
}

#[test]
fn test_pagination_returns_every_url_once() {
    let store = RecordStore::open_in_memory().unwrap();
    let records: Vec<_> = (0..37)
        .map(|i| AccessRecord::new(format!("10.0.0.{}", i % 4), 0, format!("/page/{}", i), 200))
        .collect();
    store.insert_batch(&records).unwrap();

    let expected: Vec<String> = (0..37).map(|i| format!("/page/{}", i)).collect();

    for page_size in [1, 5, 37, 47] {
        let mut paginator = Paginator::new(&store);
        let mut urls = Vec::new();
        for page in paginator.url_pages(page_size) {
            urls.extend(page.unwrap());
        }
        urls.sort();
        let mut want = expected.clone();
        want.sort();
        assert_eq!(urls, want, "page size {}", page_size);
    }
}

#[test]
fn test_distinct_ips_is_stable() {
    let store = RecordStore::open_in_memory().unwrap();
    for ip in ["10.0.0.2", "10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.1"] {
        store.insert(&AccessRecord::new(ip, 0, "/", 200)).unwrap();
    }

    let first = store.distinct_ips().unwrap().to_vec();
    let second = store.distinct_ips().unwrap().to_vec();
    assert_eq!(first, vec!["10.0.0.2", "10.0.0.1", "10.0.0.3"]);
    assert_eq!(first, second);
    assert_eq!(store.count_ips().unwrap(), 3);
}

#[test]
fn test_export_by_line_count() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open_in_memory().unwrap();
    let records: Vec<_> = (0..250)
        .map(|i| AccessRecord::new("10.0.0.1", 0, format!("/u/{}", i), 200))
        .collect();
    store.insert_batch(&records).unwrap();

    let summary = Partitioner::new(&store)
        .with_page_size(64)
        .run(
            &target(dir.path(), "urls_{n}.txt", "https://example.com"),
            PartitionPolicy::LineCount {
                lines_per_file: 100,
            },
        )
        .unwrap();

    assert_eq!(summary.urls_written, 250);
    let counts: Vec<usize> = (1..=3)
        .map(|n| read_lines(&dir.path().join(format!("urls_{}.txt", n))).len())
        .collect();
    assert_eq!(counts, vec![100, 100, 50]);

    let first = read_lines(&dir.path().join("urls_1.txt"));
    assert_eq!(first[0], "https://example.com/u/0");
    assert!(fs::read_to_string(dir.path().join("urls_3.txt"))
        .unwrap()
        .ends_with('\n'));
    assert!(!dir.path().join("urls_4.txt").exists());
}

#[test]
fn test_exact_multiple_leaves_empty_trailing_file() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open_in_memory().unwrap();
    let records: Vec<_> = (0..20)
        .map(|i| AccessRecord::new("10.0.0.1", 0, format!("/u/{}", i), 200))
        .collect();
    store.insert_batch(&records).unwrap();

    let summary = Partitioner::new(&store)
        .run(
            &target(dir.path(), "u{n}.txt", ""),
            PartitionPolicy::LineCount { lines_per_file: 10 },
        )
        .unwrap();

    let lines: Vec<u64> = summary.files.iter().map(|f| f.lines).collect();
    assert_eq!(lines, vec![10, 10, 0]);
    assert_eq!(fs::read_to_string(dir.path().join("u3.txt")).unwrap(), "");
}

#[test]
fn test_export_grouped_by_ip() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open_in_memory().unwrap();
    let mut records = Vec::new();
    for i in 0..10 {
        records.push(AccessRecord::new("A", 0, format!("/a/{}", i), 200));
        if i < 5 {
            records.push(AccessRecord::new("B", 0, format!("/b/{}", i), 200));
        }
    }
    store.insert_batch(&records).unwrap();

    let summary = Partitioner::new(&store)
        .with_page_size(3)
        .run(
            &target(dir.path(), "ip_{n}.txt", "http://h"),
            PartitionPolicy::IpGrouped { file_count: 2 },
        )
        .unwrap();

    let want_a: Vec<String> = (0..10).map(|i| format!("http://h/a/{}", i)).collect();
    let want_b: Vec<String> = (0..5).map(|i| format!("http://h/b/{}", i)).collect();
    assert_eq!(read_lines(&dir.path().join("ip_1.txt")), want_a);
    assert_eq!(read_lines(&dir.path().join("ip_2.txt")), want_b);
    assert_eq!(summary.ips_processed, 2);
    assert_eq!(summary.ips_skipped, 0);
}

#[test]
fn test_insufficient_ips() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open_in_memory().unwrap();
    for ip in ["a", "b", "c"] {
        store.insert(&AccessRecord::new(ip, 0, "/", 200)).unwrap();
    }

    let err = Partitioner::new(&store)
        .run(
            &target(dir.path(), "g{n}.txt", ""),
            PartitionPolicy::IpGrouped { file_count: 5 },
        )
        .unwrap_err();

    assert!(matches!(
        err,
        ExportError::InsufficientIps {
            found: 3,
            requested: 5
        }
    ));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_exclusion_filter() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open_in_memory().unwrap();
    let urls = ["/", "/main.css", "/about", "/logo.png", "/contact"];
    for url in urls {
        store
            .insert(&AccessRecord::new("10.0.0.1", 0, url, 200))
            .unwrap();
    }

    let filter = UrlFilter::new(r"\.(css|png)$").unwrap();
    let summary = Partitioner::new(&store)
        .with_filter(Some(&filter))
        .with_page_size(2)
        .run(
            &target(dir.path(), "f{n}.txt", ""),
            PartitionPolicy::IpGrouped { file_count: 1 },
        )
        .unwrap();

    assert_eq!(summary.urls_filtered, 2);
    assert_eq!(
        read_lines(&dir.path().join("f1.txt")),
        vec!["/", "/about", "/contact"]
    );
}

#[test]
fn test_line_count_export_keeps_log_order_on_disk() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open(dir.path().join("db.sqlite")).unwrap();
    for url in ["/zeta", "/alpha", "/mid", "/beta"] {
        store
            .insert(&AccessRecord::new("10.0.0.1", 0, url, 200))
            .unwrap();
    }
    store.finalize_ingest("access.log", 4).unwrap();

    Partitioner::new(&store)
        .with_page_size(2)
        .run(
            &target(dir.path(), "u{n}.txt", ""),
            PartitionPolicy::LineCount { lines_per_file: 10 },
        )
        .unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("u1.txt")).unwrap(),
        "/zeta\n/alpha\n/mid\n/beta\n"
    );
}

#[test]
fn test_exclusion_filter_with_line_budget() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open_in_memory().unwrap();
    let records: Vec<_> = (0..12)
        .map(|i| {
            let url = if i == 3 || i == 8 {
                format!("/static/{}.css", i)
            } else {
                format!("/page/{}", i)
            };
            AccessRecord::new("10.0.0.1", 0, url, 200)
        })
        .collect();
    store.insert_batch(&records).unwrap();

    let filter = UrlFilter::new(r"\.css$").unwrap();
    let summary = Partitioner::new(&store)
        .with_filter(Some(&filter))
        .with_page_size(4)
        .run(
            &target(dir.path(), "l{n}.txt", ""),
            PartitionPolicy::LineCount { lines_per_file: 5 },
        )
        .unwrap();

    assert_eq!(summary.urls_filtered, 2);
    assert_eq!(summary.urls_written, 10);
    let lines: Vec<u64> = summary.files.iter().map(|f| f.lines).collect();
    assert_eq!(lines, vec![5, 5, 0]);

    assert_eq!(
        read_lines(&dir.path().join("l1.txt")),
        vec!["/page/0", "/page/1", "/page/2", "/page/4", "/page/5"]
    );
    assert_eq!(
        read_lines(&dir.path().join("l2.txt")),
        vec!["/page/6", "/page/7", "/page/9", "/page/10", "/page/11"]
    );
    assert_eq!(fs::read_to_string(dir.path().join("l3.txt")).unwrap(), "");
}

#[test]
fn test_read_only_store() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("db.sqlite");
    let mut store = RecordStore::open(&db_path).unwrap();
    store
        .insert(&AccessRecord::new("10.0.0.1", 0, "/a", 200))
        .unwrap();
    store.finalize_ingest("access.log", 1).unwrap();
    store.close().unwrap();

    let reader = RecordStore::open_read_only(&db_path).unwrap();
    assert_eq!(reader.count_urls(None).unwrap(), 1);
    assert_eq!(reader.distinct_ips().unwrap(), ["10.0.0.1".to_string()]);
    assert!(reader
        .insert(&AccessRecord::new("10.0.0.2", 0, "/b", 200))
        .is_err());
}

#[test]
fn test_ingest_then_export() {
    let dir = tempdir().unwrap();
    let mut log = NamedTempFile::new().unwrap();
    writeln!(log, "{}", APACHE_LINE).unwrap();
    writeln!(log, "not an access log line").unwrap();
    writeln!(
        log,
        "10.1.1.1 - - [11/Oct/2000:08:00:00 +0000] \"GET /index.html HTTP/1.1\" 304 0"
    )
    .unwrap();
    log.flush().unwrap();

    let db_path = dir.path().join("db.sqlite");
    let store = RecordStore::open(&db_path).unwrap();
    let stats = Ingestor::new(&store, apache_parser())
        .ingest_file(log.path())
        .unwrap();
    assert_eq!(stats.lines_read, 3);
    assert_eq!(stats.records_inserted, 2);
    assert_eq!(stats.lines_skipped, 1);
    assert_eq!(store.count_urls(Some("/index.html")).unwrap(), 1);

    Partitioner::new(&store)
        .run(
            &target(dir.path(), "out_{n}.txt", "https://example.com"),
            PartitionPolicy::LineCount { lines_per_file: 5 },
        )
        .unwrap();
    assert_eq!(
        read_lines(&dir.path().join("out_1.txt")),
        vec![
            "https://example.com/apache_pb.gif",
            "https://example.com/index.html"
        ]
    );
}
