//! Url exclusion filter

use regex::Regex;

/// Drops urls matching a regular expression
#[derive(Debug, Clone)]
pub struct UrlFilter {
    pattern: Regex,
}

impl UrlFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// Keep non-matching urls in their original order; returns how many were dropped
    pub fn apply(&self, mut urls: Vec<String>) -> (Vec<String>, usize) {
        let before = urls.len();
        urls.retain(|url| !self.is_excluded(url));
        let dropped = before - urls.len();
        (urls, dropped)
    }
}
