//! Timestamp decoding for access log lines
//!
//! The timestamp column is sliced positionally into a date part and a time
//! part using the position of the hour token in the `TimeFormat`:
//!
//! - hour token at position 0: the first 8 bytes are the time, the rest
//!   is the date
//! - otherwise, with `p = hour_position + 2`: the last `p` bytes are the
//!   time and everything before the separator preceding them is the date
//!
//! The branches are not symmetric: the second only yields an `HH:MM:SS`
//! slice when the hour token sits at byte 6, as in `d/m/y:H:i:s`.

use crate::error::ParseError;
use crate::parser::types::{DateToken, TimeFormat};
use chrono::{DateTime, NaiveDateTime};

/// Length of an `HH:MM:SS` slice
const TIME_SLICE_LEN: usize = 8;

/// Date layouts tried after the descriptor-derived ones
const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%d-%m-%Y", "%m-%d-%Y"];

/// Decodes timestamp columns into unix epoch seconds
#[derive(Debug, Clone)]
pub struct TimestampDecoder {
    hour_position: usize,
    date_formats: Vec<String>,
}

impl TimestampDecoder {
    /// Build a decoder for one time format; date layouts are resolved once
    pub fn new(format: &TimeFormat) -> Self {
        let mut date_formats = descriptor_date_formats(&format.date_tokens());
        for fallback in FALLBACK_DATE_FORMATS {
            if !date_formats.iter().any(|f| f == fallback) {
                date_formats.push((*fallback).to_string());
            }
        }

        Self {
            hour_position: format.hour_position(),
            date_formats,
        }
    }

    /// Decode a raw timestamp column plus the column that follows it
    ///
    /// `offset_field` is the zone text as it appears in the log (e.g.
    /// `-0700]`); an absent or empty offset is read as UTC.
    pub fn decode(&self, raw_field: &str, offset_field: Option<&str>) -> Result<i64, ParseError> {
        let invalid = |reason: &str| ParseError::InvalidTimestamp {
            raw: raw_field.to_string(),
            reason: reason.to_string(),
        };

        let raw = raw_field.strip_prefix('[').unwrap_or(raw_field);
        let raw = raw.strip_suffix(']').unwrap_or(raw);

        let (date, time) = split_date_time(raw, self.hour_position)
            .ok_or_else(|| invalid("timestamp shorter than the time format"))?;

        let date = date
            .replace('/', "-")
            .trim_matches(|c: char| !c.is_ascii_alphanumeric())
            .to_string();

        let offset = match offset_field.map(|f| f.trim_end_matches(']')) {
            None | Some("") => None,
            Some(text) => Some(normalize_offset(text).ok_or_else(|| invalid("unrecognised zone offset"))?),
        };

        for date_format in &self.date_formats {
            let parsed = match &offset {
                Some(offset) => DateTime::parse_from_str(
                    &format!("{} {} {}", date, time, offset),
                    &format!("{} %H:%M:%S %z", date_format),
                )
                .map(|dt| dt.timestamp()),
                None => NaiveDateTime::parse_from_str(
                    &format!("{} {}", date, time),
                    &format!("{} %H:%M:%S", date_format),
                )
                .map(|dt| dt.and_utc().timestamp()),
            };

            if let Ok(secs) = parsed {
                return Ok(secs);
            }
        }

        Err(invalid("unrecognised date"))
    }
}

/// Slice a bracket-stripped timestamp into (date, time)
fn split_date_time(raw: &str, hour_position: usize) -> Option<(&str, &str)> {
    if hour_position == 0 {
        let time = raw.get(..TIME_SLICE_LEN)?;
        let date = raw.get(TIME_SLICE_LEN..)?;
        Some((date, time))
    } else {
        let tail = hour_position + 2;
        let time = raw.get(raw.len().checked_sub(tail)?..)?;
        let date = raw.get(..raw.len().checked_sub(tail + 1)?)?;
        Some((date, time))
    }
}

/// Turn zone text into a `%z`-parseable `+HHMM`
fn normalize_offset(text: &str) -> Option<String> {
    match text {
        "Z" | "UTC" | "GMT" => return Some("+0000".to_string()),
        _ => {}
    }

    let compact: String = text.chars().filter(|&c| c != ':').collect();
    let (sign, digits) = compact.split_at_checked(1)?;
    if (sign == "+" || sign == "-") && digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(compact)
    } else {
        None
    }
}

/// chrono layouts for the date component order of a descriptor
fn descriptor_date_formats(tokens: &[DateToken]) -> Vec<String> {
    if tokens.len() != 3 {
        return Vec::new();
    }

    let mut formats = vec![String::new()];
    for token in tokens {
        let choices: &[&str] = match token {
            DateToken::Day => &["%d"],
            DateToken::Month => &["%b", "%m"],
            DateToken::Year => &["%Y"],
        };
        formats = formats
            .iter()
            .flat_map(|prefix| {
                choices.iter().map(move |choice| {
                    if prefix.is_empty() {
                        (*choice).to_string()
                    } else {
                        format!("{}-{}", prefix, choice)
                    }
                })
            })
            .collect();
    }
    formats
}
