//! Access log line parser
//!
//! Lines are split on single spaces (not arbitrary whitespace), so two
//! consecutive spaces produce an empty column. Columns are then picked by
//! the indices in `ColumnSpec`.

use crate::error::{LogField, ParseError};
use crate::parser::timestamp::TimestampDecoder;
use crate::parser::types::{AccessRecord, ColumnSpec, TimeFormat};

/// Parses raw log lines into `AccessRecord`s for one fixed layout
#[derive(Debug, Clone)]
pub struct LogLineParser {
    columns: ColumnSpec,
    decoder: TimestampDecoder,
}

impl LogLineParser {
    /// Create a parser for a column layout and time format
    pub fn new(columns: ColumnSpec, time_format: TimeFormat) -> Self {
        Self {
            columns,
            decoder: TimestampDecoder::new(&time_format),
        }
    }

    /// Parse one raw line (trailing newline allowed)
    pub fn parse(&self, raw_line: &str) -> Result<AccessRecord, ParseError> {
        let line = raw_line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split(' ').collect();
        let columns = &self.columns;

        let ip = column(&fields, LogField::Ip, columns.ip_index)?;
        let raw_time = column(&fields, LogField::Time, columns.time_index)?;
        let url = column(&fields, LogField::Url, columns.url_index)?;
        let code = column(&fields, LogField::Code, columns.code_index)?;

        let offset = fields.get(columns.time_index + 1).copied();
        let timestamp = self.decoder.decode(raw_time, offset)?;

        let status_code = code
            .parse::<i64>()
            .map_err(|_| ParseError::InvalidStatusCode(code.to_string()))?;

        Ok(AccessRecord::new(ip, timestamp, url, status_code))
    }
}

/// Convenience wrapper for one-off parsing
pub fn parse_line(
    raw_line: &str,
    columns: &ColumnSpec,
    time_format: &TimeFormat,
) -> Result<AccessRecord, ParseError> {
    LogLineParser::new(*columns, time_format.clone()).parse(raw_line)
}

fn column<'a>(fields: &[&'a str], field: LogField, index: usize) -> Result<&'a str, ParseError> {
    match fields.get(index) {
        Some(&value) if !value.is_empty() => Ok(value),
        _ => Err(ParseError::MissingField { field, index }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMBINED: &str = "127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] \"GET /apache_pb.gif HTTP/1.0\" 200 2326 \"http://www.example.com/start.html\" \"Mozilla/4.08\"\n";

    fn parser() -> LogLineParser {
        LogLineParser::new(
            ColumnSpec::parse("0,3,6,8").unwrap(),
            TimeFormat::parse("d/m/y:H:i:s").unwrap(),
        )
    }

    #[test]
    fn test_parse_combined_line() {
        let record = parser().parse(COMBINED).unwrap();
        assert_eq!(record.id, None);
        assert_eq!(record.ip, "127.0.0.1");
        assert_eq!(record.timestamp, 971_211_336);
        assert_eq!(record.url, "/apache_pb.gif");
        assert_eq!(record.status_code, 200);
    }

    #[test]
    fn test_crlf_line() {
        let line = "10.0.0.2 - - [01/Jan/2020:00:00:00 +0000] \"GET /index.html HTTP/1.1\" 404 12\r\n";
        let record = parser().parse(line).unwrap();
        assert_eq!(record.ip, "10.0.0.2");
        assert_eq!(record.timestamp, 1_577_836_800);
        assert_eq!(record.status_code, 404);
    }

    #[test]
    fn test_missing_column() {
        let err = parser().parse("127.0.0.1 - - [10/Oct/2000:13:55:36 -0700]").unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField {
                field: LogField::Url,
                index: 6
            }
        );
    }

    #[test]
    fn test_empty_column_from_double_space() {
        let line = "127.0.0.1  - [10/Oct/2000:13:55:36 -0700] \"GET /a HTTP/1.0\" 200 1";
        let p = LogLineParser::new(
            ColumnSpec::parse("1,3,6,8").unwrap(),
            TimeFormat::parse("d/m/y:H:i:s").unwrap(),
        );
        assert_eq!(
            p.parse(line).unwrap_err(),
            ParseError::MissingField {
                field: LogField::Ip,
                index: 1
            }
        );
    }

    #[test]
    fn test_invalid_status_code() {
        let line = "127.0.0.1 - - [10/Oct/2000:13:55:36 -0700] \"GET /a HTTP/1.0\" - 1";
        assert_eq!(
            parser().parse(line).unwrap_err(),
            ParseError::InvalidStatusCode("-".into())
        );
    }

    #[test]
    fn test_invalid_timestamp() {
        let line = "127.0.0.1 - - [garbage:13:55:36 -0700] \"GET /a HTTP/1.0\" 200 1";
        assert!(matches!(
            parser().parse(line),
            Err(ParseError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_parse_line_helper() {
        let columns = ColumnSpec::parse("0,3,6,8").unwrap();
        let format = TimeFormat::parse("d/m/y:H:i:s").unwrap();
        let record = parse_line(COMBINED, &columns, &format).unwrap();
        assert_eq!(record.url, "/apache_pb.gif");
    }
}
