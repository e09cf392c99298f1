//! Record and layout types for access log parsing
//!
//! `ColumnSpec` and `TimeFormat` describe where the interesting parts of a
//! log line live; `AccessRecord` is what one parsed line becomes.

use crate::error::ConfigError;

/// One parsed access log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    /// Store-assigned row id (None until written)
    pub id: Option<i64>,

    /// Client address as it appears in the log
    pub ip: String,

    /// Request time as unix epoch seconds
    pub timestamp: i64,

    /// Requested path (without scheme or host)
    pub url: String,

    /// HTTP status code
    pub status_code: i64,
}

impl AccessRecord {
    /// Create a record that has not been stored yet
    pub fn new(
        ip: impl Into<String>,
        timestamp: i64,
        url: impl Into<String>,
        status_code: i64,
    ) -> Self {
        Self {
            id: None,
            ip: ip.into(),
            timestamp,
            url: url.into(),
            status_code,
        }
    }
}

/// Zero-based positions of the fields within a space-split log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub ip_index: usize,
    pub time_index: usize,
    pub url_index: usize,
    pub code_index: usize,
}

impl ColumnSpec {
    /// Parse the CLI form `ip,time,url,code`, e.g. `0,3,6,8`
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidColumnSpec {
            spec: spec.to_string(),
            reason,
        };

        let indices = spec
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<usize>()
                    .map_err(|_| invalid(format!("'{}' is not a column index", part)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match indices.as_slice() {
            &[ip_index, time_index, url_index, code_index] => Ok(Self {
                ip_index,
                time_index,
                url_index,
                code_index,
            }),
            other => Err(invalid(format!(
                "expected 4 indices (ip,time,url,code), got {}",
                other.len()
            ))),
        }
    }
}

/// Descriptor of the tokens in the log's timestamp, e.g. `d/m/y:H:i:s`
///
/// Recognised tokens: `d` day, `m` month, `y`/`Y` year, `H` hour,
/// `i` minute, `s` second. Any other character is a literal separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFormat {
    descriptor: String,
    hour_position: usize,
}

impl TimeFormat {
    /// Parse a descriptor; it must contain the hour token `H`
    pub fn parse(descriptor: &str) -> Result<Self, ConfigError> {
        let descriptor = descriptor.trim();
        let hour_position = descriptor
            .find('H')
            .ok_or_else(|| ConfigError::InvalidTimeFormat {
                format: descriptor.to_string(),
                reason: "missing hour token 'H'".into(),
            })?;

        Ok(Self {
            descriptor: descriptor.to_string(),
            hour_position,
        })
    }

    /// Byte position of the hour token within the descriptor
    pub fn hour_position(&self) -> usize {
        self.hour_position
    }

    /// The raw descriptor string
    pub fn as_str(&self) -> &str {
        &self.descriptor
    }

    /// Date tokens (`d`, `m`, `y`) in the order the descriptor lists them
    pub fn date_tokens(&self) -> Vec<DateToken> {
        let mut tokens = Vec::with_capacity(3);
        for c in self.descriptor.chars() {
            let token = match c {
                'd' | 'j' => DateToken::Day,
                'm' | 'n' | 'M' => DateToken::Month,
                'y' | 'Y' => DateToken::Year,
                _ => continue,
            };
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }
}

/// Date component named by a time format descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateToken {
    Day,
    Month,
    Year,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_spec_parse() {
        let spec = ColumnSpec::parse("0,3,6,8").unwrap();
        assert_eq!(spec.ip_index, 0);
        assert_eq!(spec.time_index, 3);
        assert_eq!(spec.url_index, 6);
        assert_eq!(spec.code_index, 8);

        let spaced = ColumnSpec::parse(" 1, 4 ,7,9").unwrap();
        assert_eq!(spaced.code_index, 9);
    }

    #[test]
    fn test_column_spec_invalid() {
        assert!(ColumnSpec::parse("0,3,6").is_err());
        assert!(ColumnSpec::parse("0,3,6,8,9").is_err());
        assert!(ColumnSpec::parse("0,x,6,8").is_err());
        assert!(ColumnSpec::parse("0,-3,6,8").is_err());
    }

    #[test]
    fn test_time_format_hour_position() {
        let format = TimeFormat::parse("d/m/y:H:i:s").unwrap();
        assert_eq!(format.hour_position(), 6);

        let leading = TimeFormat::parse("H:i:s d/m/Y").unwrap();
        assert_eq!(leading.hour_position(), 0);

        assert!(TimeFormat::parse("d/m/y").is_err());
    }

    #[test]
    fn test_date_tokens_order() {
        let apache = TimeFormat::parse("d/m/y:H:i:s").unwrap();
        assert_eq!(
            apache.date_tokens(),
            vec![DateToken::Day, DateToken::Month, DateToken::Year]
        );

        let iso = TimeFormat::parse("Y-m-d H:i:s").unwrap();
        assert_eq!(
            iso.date_tokens(),
            vec![DateToken::Year, DateToken::Month, DateToken::Day]
        );
    }
}
