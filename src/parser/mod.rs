//! Access log parsing
//!
//! Turns raw access log lines into typed `AccessRecord`s using a
//! caller-supplied column layout and time format. There is no format
//! auto-detection: the layout is fixed for a whole run.

pub mod line;
pub mod timestamp;
pub mod types;

pub use line::{parse_line, LogLineParser};
pub use timestamp::TimestampDecoder;
pub use types::{AccessRecord, ColumnSpec, DateToken, TimeFormat};
